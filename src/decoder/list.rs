//! Чтение списков: обычная форма, ziplist и оба поколения quicklist.

use std::io::Read;

use crate::{
    codec::{listpack, ziplist, BufCursor},
    error::RdbResult,
    tags::{QUICKLIST_NODE_PACKED, QUICKLIST_NODE_PLAIN},
};

use super::{capacity_hint, Decoder};

impl<R: Read> Decoder<R> {
    pub(crate) fn read_list(&mut self) -> RdbResult<Vec<Vec<u8>>> {
        let (size, _) = self.read_length()?;
        let mut values = Vec::with_capacity(capacity_hint(size));
        for _ in 0..size {
            values.push(self.read_string()?);
        }
        Ok(values)
    }

    pub(crate) fn read_ziplist(&mut self) -> RdbResult<Vec<Vec<u8>>> {
        let buf = self.read_string()?;
        ziplist::parse(&buf)
    }

    /// Quicklist первого поколения: страницы, каждая — ziplist.
    pub(crate) fn read_quicklist(&mut self) -> RdbResult<Vec<Vec<u8>>> {
        let (pages, _) = self.read_length()?;
        let mut values = Vec::new();
        for _ in 0..pages {
            values.extend(self.read_ziplist()?);
        }
        Ok(values)
    }

    /// Quicklist второго поколения: узлы, помеченные контейнером.
    /// Plain-узел несёт один элемент как есть, packed-узел — listpack.
    pub(crate) fn read_quicklist2(&mut self) -> RdbResult<Vec<Vec<u8>>> {
        let (nodes, _) = self.read_length()?;
        let mut values = Vec::new();
        for _ in 0..nodes {
            let (container, _) = self.read_length()?;
            match container {
                QUICKLIST_NODE_PLAIN => values.push(self.read_string()?),
                QUICKLIST_NODE_PACKED => {
                    let buf = self.read_string()?;
                    let mut cur = BufCursor::new(&buf, "quicklist node");
                    let count = listpack::read_header(&mut cur)?;
                    for _ in 0..count {
                        values.push(listpack::read_entry_bytes(&mut cur)?);
                    }
                }
                other => {
                    return Err(self.format_err(format!(
                        "unknown quicklist node container: {other}"
                    )));
                }
            }
        }
        Ok(values)
    }
}

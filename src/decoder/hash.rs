//! Чтение хешей: обычная форма, zipmap, ziplist и listpack.
//! Пары возвращаются в порядке следования в дампе.

use std::io::Read;

use crate::{
    codec::{listpack, zipmap, ziplist, BufCursor},
    error::RdbResult,
};

use super::{capacity_hint, Decoder};

impl<R: Read> Decoder<R> {
    pub(crate) fn read_hash(&mut self) -> RdbResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let (size, _) = self.read_length()?;
        let mut fields = Vec::with_capacity(capacity_hint(size));
        for _ in 0..size {
            let field = self.read_string()?;
            let value = self.read_string()?;
            fields.push((field, value));
        }
        Ok(fields)
    }

    pub(crate) fn read_zipmap_hash(&mut self) -> RdbResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let buf = self.read_string()?;
        zipmap::parse(&buf)
    }

    pub(crate) fn read_ziplist_hash(&mut self) -> RdbResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let buf = self.read_string()?;
        let mut cur = BufCursor::new(&buf, "hash ziplist");
        let size = ziplist::read_header(&mut cur)?;
        let mut fields = Vec::with_capacity(size / 2);
        for _ in 0..size / 2 {
            let field = ziplist::read_entry(&mut cur)?;
            let value = ziplist::read_entry(&mut cur)?;
            fields.push((field, value));
        }
        Ok(fields)
    }

    pub(crate) fn read_listpack_hash(&mut self) -> RdbResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let buf = self.read_string()?;
        let mut cur = BufCursor::new(&buf, "hash listpack");
        let size = listpack::read_header(&mut cur)?;
        let mut fields = Vec::with_capacity(size / 2);
        for _ in 0..size / 2 {
            let field = listpack::read_entry_bytes(&mut cur)?;
            let value = listpack::read_entry_bytes(&mut cur)?;
            fields.push((field, value));
        }
        Ok(fields)
    }
}

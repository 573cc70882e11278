//! Чтение множеств: обычная форма и intset.

use std::io::Read;

use crate::{codec::intset, error::RdbResult};

use super::{capacity_hint, Decoder};

impl<R: Read> Decoder<R> {
    pub(crate) fn read_set(&mut self) -> RdbResult<Vec<Vec<u8>>> {
        let (size, _) = self.read_length()?;
        let mut members = Vec::with_capacity(capacity_hint(size));
        for _ in 0..size {
            members.push(self.read_string()?);
        }
        Ok(members)
    }

    pub(crate) fn read_intset(&mut self) -> RdbResult<Vec<Vec<u8>>> {
        let buf = self.read_string()?;
        intset::parse(&buf)
    }
}

//! Запись множеств: intset для коротких целочисленных, обычная форма
//! для остальных.

use std::io::Write;

use crate::{
    codec::intset,
    error::RdbResult,
    tags::{TYPE_SET, TYPE_SET_INTSET},
};

use super::{Encoder, WriteOptions};

impl<W: Write> Encoder<W> {
    pub fn write_set_object(
        &mut self,
        key: &[u8],
        members: &[Vec<u8>],
        options: &WriteOptions,
    ) -> RdbResult<()> {
        self.before_write_object(options)?;
        if members.len() <= self.compact_max_entries(options) {
            // intset представим только множеством канонических чисел.
            if let Some(buf) = intset::write(members) {
                self.write_u8(TYPE_SET_INTSET)?;
                self.write_string(key)?;
                return self.write_blob(&buf);
            }
        }
        self.write_u8(TYPE_SET)?;
        self.write_string(key)?;
        self.write_length(members.len() as u64)?;
        for member in members {
            self.write_string(member)?;
        }
        Ok(())
    }
}

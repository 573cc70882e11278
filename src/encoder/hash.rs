//! Запись хешей: ziplist для коротких, обычная форма для остальных.

use std::io::Write;

use crate::{
    codec::ziplist,
    error::RdbResult,
    tags::{TYPE_HASH, TYPE_HASH_ZIPLIST},
};

use super::{Encoder, WriteOptions};

impl<W: Write> Encoder<W> {
    pub fn write_hash_object(
        &mut self,
        key: &[u8],
        fields: &[(Vec<u8>, Vec<u8>)],
        options: &WriteOptions,
    ) -> RdbResult<()> {
        self.before_write_object(options)?;
        let max_value = self.compact_max_value(options);
        let compact = fields.len() <= self.compact_max_entries(options)
            && fields
                .iter()
                .all(|(f, v)| f.len() <= max_value && v.len() <= max_value);
        if compact {
            self.write_u8(TYPE_HASH_ZIPLIST)?;
            self.write_string(key)?;
            let mut entries = Vec::with_capacity(fields.len() * 2);
            for (field, value) in fields {
                entries.push(field.clone());
                entries.push(value.clone());
            }
            let buf = ziplist::write(&entries)?;
            return self.write_blob(&buf);
        }
        self.write_u8(TYPE_HASH)?;
        self.write_string(key)?;
        self.write_length(fields.len() as u64)?;
        for (field, value) in fields {
            self.write_string(field)?;
            self.write_string(value)?;
        }
        Ok(())
    }
}

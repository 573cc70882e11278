//! Запись отсортированных множеств: ziplist для коротких, обычная форма
//! с текстовыми оценками для остальных.

use std::io::Write;

use crate::{
    codec::ziplist,
    error::RdbResult,
    model::ZSetEntry,
    tags::{TYPE_ZSET, TYPE_ZSET_ZIPLIST},
};

use super::{Encoder, WriteOptions};

impl<W: Write> Encoder<W> {
    pub fn write_zset_object(
        &mut self,
        key: &[u8],
        entries: &[ZSetEntry],
        options: &WriteOptions,
    ) -> RdbResult<()> {
        self.before_write_object(options)?;
        let compact = entries.len() <= self.compact_max_entries(options)
            && entries.iter().all(|e| {
                // NaN и бесконечности в ziplist-оценку не помещаются.
                e.member.len() <= self.compact_max_value(options) && e.score.is_finite()
            });
        if compact {
            self.write_u8(TYPE_ZSET_ZIPLIST)?;
            self.write_string(key)?;
            let mut values = Vec::with_capacity(entries.len() * 2);
            for entry in entries {
                values.push(entry.member.clone());
                values.push(format!("{}", entry.score).into_bytes());
            }
            let buf = ziplist::write(&values)?;
            return self.write_blob(&buf);
        }
        self.write_u8(TYPE_ZSET)?;
        self.write_string(key)?;
        self.write_length(entries.len() as u64)?;
        for entry in entries {
            self.write_string(&entry.member)?;
            self.write_literal_float(entry.score)?;
        }
        Ok(())
    }
}

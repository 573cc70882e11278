//! Запись списков: ziplist для коротких, quicklist для остальных.

use std::io::Write;

use crate::{
    codec::ziplist,
    error::RdbResult,
    tags::{TYPE_LIST_QUICKLIST, TYPE_LIST_ZIPLIST},
};

use super::{Encoder, WriteOptions};

impl<W: Write> Encoder<W> {
    pub fn write_list_object(
        &mut self,
        key: &[u8],
        values: &[Vec<u8>],
        options: &WriteOptions,
    ) -> RdbResult<()> {
        self.before_write_object(options)?;
        if self.fits_compact(values, options) {
            self.write_u8(TYPE_LIST_ZIPLIST)?;
            self.write_string(key)?;
            let buf = ziplist::write(values)?;
            return self.write_blob(&buf);
        }
        self.write_quicklist(key, values)
    }

    fn fits_compact(&self, values: &[Vec<u8>], options: &WriteOptions) -> bool {
        values.len() <= self.compact_max_entries(options)
            && values
                .iter()
                .all(|v| v.len() <= self.compact_max_value(options))
    }

    /// Страницы нарезаются по накопленному размеру значений.
    fn write_quicklist(&mut self, key: &[u8], values: &[Vec<u8>]) -> RdbResult<()> {
        let mut pages: Vec<&[Vec<u8>]> = Vec::new();
        let mut page_start = 0usize;
        let mut page_size = 0usize;
        for (i, value) in values.iter().enumerate() {
            page_size += value.len();
            if page_size >= self.quicklist_page_size() {
                pages.push(&values[page_start..=i]);
                page_start = i + 1;
                page_size = 0;
            }
        }
        if page_start < values.len() || values.is_empty() {
            pages.push(&values[page_start..]);
        }
        self.write_u8(TYPE_LIST_QUICKLIST)?;
        self.write_string(key)?;
        self.write_length(pages.len() as u64)?;
        for page in pages {
            let buf = ziplist::write(page)?;
            self.write_blob(&buf)?;
        }
        Ok(())
    }
}

//! Чтение отсортированных множеств: текстовые и двоичные оценки,
//! ziplist- и listpack-формы.

use std::io::Read;

use crate::{
    codec::{listpack, ziplist, BufCursor},
    error::RdbResult,
    model::ZSetEntry,
};

use super::{capacity_hint, Decoder};

impl<R: Read> Decoder<R> {
    /// Обычная форма. `binary_score` — формат zset2 с double вместо
    /// текстового float.
    pub(crate) fn read_zset(&mut self, binary_score: bool) -> RdbResult<Vec<ZSetEntry>> {
        let (length, _) = self.read_length()?;
        let mut entries = Vec::with_capacity(capacity_hint(length));
        for _ in 0..length {
            let member = self.read_string()?;
            let score = if binary_score {
                self.read_double()?
            } else {
                self.read_literal_float()?
            };
            entries.push(ZSetEntry { member, score });
        }
        Ok(entries)
    }

    pub(crate) fn read_ziplist_zset(&mut self) -> RdbResult<Vec<ZSetEntry>> {
        let buf = self.read_string()?;
        let mut cur = BufCursor::new(&buf, "zset ziplist");
        let size = ziplist::read_header(&mut cur)?;
        let mut entries = Vec::with_capacity(size / 2);
        for _ in 0..size / 2 {
            let member = ziplist::read_entry(&mut cur)?;
            let score_at = cur.position();
            let literal = ziplist::read_entry(&mut cur)?;
            let score = parse_score(&literal)
                .ok_or_else(|| self.format_err(format!("bad zset score at {score_at}")))?;
            entries.push(ZSetEntry { member, score });
        }
        Ok(entries)
    }

    pub(crate) fn read_listpack_zset(&mut self) -> RdbResult<Vec<ZSetEntry>> {
        let buf = self.read_string()?;
        let mut cur = BufCursor::new(&buf, "zset listpack");
        let size = listpack::read_header(&mut cur)?;
        let mut entries = Vec::with_capacity(size / 2);
        for _ in 0..size / 2 {
            let member = listpack::read_entry_bytes(&mut cur)?;
            let score_at = cur.position();
            let literal = listpack::read_entry_bytes(&mut cur)?;
            let score = parse_score(&literal)
                .ok_or_else(|| self.format_err(format!("bad zset score at {score_at}")))?;
            entries.push(ZSetEntry { member, score });
        }
        Ok(entries)
    }
}

fn parse_score(literal: &[u8]) -> Option<f64> {
    std::str::from_utf8(literal).ok()?.parse().ok()
}

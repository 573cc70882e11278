//! Чтение стримов (типы 15, 19, 21 — версии формата 1, 2, 3).
//!
//! Записи стрима лежат в listpack-блоках: сначала мастер-набор полей,
//! затем сообщения со смещениями идентификаторов относительно первого.

use std::io::Read;

use byteorder::{BigEndian, ByteOrder};

use crate::{
    codec::{listpack, BufCursor},
    error::{RdbError, RdbResult},
    model::{
        StreamConsumer, StreamEntry, StreamGroup, StreamId, StreamMessage, StreamNAck,
        StreamValue,
    },
};

use super::{capacity_hint, Decoder};

/// Сообщение было удалено.
pub(crate) const ITEM_FLAG_DELETED: i64 = 1;
/// Сообщение использует мастер-набор полей.
pub(crate) const ITEM_FLAG_SAME_FIELDS: i64 = 2;

impl<R: Read> Decoder<R> {
    pub(crate) fn read_stream(&mut self, version: u8) -> RdbResult<StreamValue> {
        let entries = self.read_stream_entries()?;
        let (length, _) = self.read_length()?;
        let last_id = self.read_stream_id()?;
        let mut stream = StreamValue {
            version,
            entries,
            length,
            last_id,
            ..StreamValue::default()
        };
        if version >= 2 {
            stream.first_id = self.read_stream_id()?;
            stream.max_deleted_id = self.read_stream_id()?;
            stream.added_entries = self.read_length()?.0;
        }
        stream.groups = self.read_stream_groups(version)?;
        Ok(stream)
    }

    fn read_stream_id(&mut self) -> RdbResult<StreamId> {
        let (ms, _) = self.read_length()?;
        let (seq, _) = self.read_length()?;
        Ok(StreamId { ms, seq })
    }

    fn read_stream_entries(&mut self) -> RdbResult<Vec<StreamEntry>> {
        let (count, _) = self.read_length()?;
        let mut entries = Vec::with_capacity(capacity_hint(count));
        for _ in 0..count {
            // Ключ узла — 16 байт big-endian: идентификатор первого сообщения.
            let header = self.read_string()?;
            if header.len() != 16 {
                return Err(self.format_err(format!(
                    "stream entry key must be 16 bytes, got {}",
                    header.len()
                )));
            }
            let first_id = StreamId {
                ms: BigEndian::read_u64(&header[0..8]),
                seq: BigEndian::read_u64(&header[8..16]),
            };
            let buf = self.read_string()?;
            let mut cur = BufCursor::new(&buf, "stream listpack");
            cur.skip(6)?; // заголовок listpack: размер и счётчик
            entries.push(self.read_stream_entry_content(&mut cur, first_id)?);
        }
        Ok(entries)
    }

    fn read_stream_entry_content(
        &mut self,
        cur: &mut BufCursor,
        first_id: StreamId,
    ) -> RdbResult<StreamEntry> {
        let counts_at = cur.position();
        let valid_count = read_count(cur)?;
        let deleted_count = read_count(cur)?;

        let master_field_count = read_count(cur)? as usize;
        let mut master_fields = Vec::with_capacity(capacity_hint(master_field_count as u64));
        for _ in 0..master_field_count {
            master_fields.push(listpack::read_entry_bytes(cur)?);
        }
        // Счётчик в конце мастер-набора читается и отбрасывается.
        listpack::read_entry_bytes(cur)?;

        let total = valid_count.checked_add(deleted_count).ok_or_else(|| {
            RdbError::format("stream entry counts overflow", counts_at as u64)
        })?;
        let mut messages = Vec::with_capacity(capacity_hint(total));
        for _ in 0..total {
            let flag = listpack::read_entry_int(cur)?;
            let ms_diff = listpack::read_entry_int(cur)?;
            let seq_diff = listpack::read_entry_int(cur)?;
            // Смещения знаковые: сообщение может лежать раньше first_id.
            let id = StreamId {
                ms: first_id.ms.wrapping_add(ms_diff as u64),
                seq: first_id.seq.wrapping_add(seq_diff as u64),
            };
            let same_fields = flag & ITEM_FLAG_SAME_FIELDS != 0;
            let field_count = if same_fields {
                master_field_count
            } else {
                read_count(cur)? as usize
            };
            let mut fields = Vec::with_capacity(capacity_hint(field_count as u64));
            for i in 0..field_count {
                let name = if same_fields {
                    master_fields[i].clone()
                } else {
                    listpack::read_entry_bytes(cur)?
                };
                let value = listpack::read_entry_bytes(cur)?;
                fields.push((name, value));
            }
            // Счётчик в конце сообщения тоже отбрасывается.
            listpack::read_entry_bytes(cur)?;
            messages.push(StreamMessage {
                id,
                fields,
                deleted: flag & ITEM_FLAG_DELETED != 0,
            });
        }
        Ok(StreamEntry {
            first_id,
            fields: master_fields,
            messages,
        })
    }

    fn read_stream_groups(&mut self, version: u8) -> RdbResult<Vec<StreamGroup>> {
        let (group_count, _) = self.read_length()?;
        let mut groups = Vec::with_capacity(capacity_hint(group_count));
        for _ in 0..group_count {
            let name = self.read_string()?;
            let last_id = self.read_stream_id()?;
            let entries_read = if version >= 2 {
                Some(self.read_length()?.0)
            } else {
                None
            };

            let (pending_count, _) = self.read_length()?;
            let mut pending = Vec::with_capacity(capacity_hint(pending_count));
            for _ in 0..pending_count {
                let id = self.read_nack_id()?;
                let delivery_time = self.read_u64_le("nack delivery time")?;
                let (delivery_count, _) = self.read_length()?;
                pending.push(StreamNAck {
                    id,
                    delivery_time,
                    delivery_count,
                });
            }

            let (consumer_count, _) = self.read_length()?;
            let mut consumers = Vec::with_capacity(capacity_hint(consumer_count));
            for _ in 0..consumer_count {
                let name = self.read_string()?;
                let seen_time = self.read_u64_le("consumer seen time")?;
                let active_time = if version >= 3 {
                    self.read_u64_le("consumer active time")?
                } else {
                    seen_time
                };
                let (consumer_pending_count, _) = self.read_length()?;
                let mut consumer_pending = Vec::with_capacity(capacity_hint(consumer_pending_count));
                for _ in 0..consumer_pending_count {
                    consumer_pending.push(self.read_nack_id()?);
                }
                consumers.push(StreamConsumer {
                    name,
                    seen_time,
                    active_time,
                    pending: consumer_pending,
                });
            }
            groups.push(StreamGroup {
                name,
                last_id,
                entries_read,
                pending,
                consumers,
            });
        }
        Ok(groups)
    }

    /// Идентификаторы в списках PEL лежат сырыми парами big-endian u64.
    fn read_nack_id(&mut self) -> RdbResult<StreamId> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf, "pending id ms")?;
        let ms = BigEndian::read_u64(&buf);
        self.fill(&mut buf, "pending id seq")?;
        let seq = BigEndian::read_u64(&buf);
        Ok(StreamId { ms, seq })
    }
}

/// Счётчик из listpack. Записи знаковые по формату, но счётчик
/// отрицательным быть не может.
fn read_count(cur: &mut BufCursor) -> RdbResult<u64> {
    let at = cur.position();
    let v = listpack::read_entry_int(cur)?;
    u64::try_from(v)
        .map_err(|_| RdbError::format(format!("negative stream count: {v}"), at as u64))
}

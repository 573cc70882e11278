//! Запись стримов (типы 15, 19, 21 — версии формата 1, 2, 3).

use std::io::Write;

use byteorder::{BigEndian, ByteOrder};

use crate::{
    codec::{format_i64, listpack},
    decoder::{ITEM_FLAG_DELETED, ITEM_FLAG_SAME_FIELDS},
    error::{RdbError, RdbResult},
    model::{StreamEntry, StreamGroup, StreamId, StreamValue},
    tags::{TYPE_STREAM_LISTPACKS, TYPE_STREAM_LISTPACKS_2, TYPE_STREAM_LISTPACKS_3},
};

use super::{Encoder, WriteOptions};

impl<W: Write> Encoder<W> {
    pub fn write_stream_object(
        &mut self,
        key: &[u8],
        stream: &StreamValue,
        options: &WriteOptions,
    ) -> RdbResult<()> {
        self.before_write_object(options)?;
        let type_byte = match stream.version {
            1 => TYPE_STREAM_LISTPACKS,
            2 => TYPE_STREAM_LISTPACKS_2,
            3 => TYPE_STREAM_LISTPACKS_3,
            v => {
                return Err(RdbError::encode(format!(
                    "unsupported stream version: {v}"
                )))
            }
        };
        self.write_u8(type_byte)?;
        self.write_string(key)?;

        self.write_length(stream.entries.len() as u64)?;
        for entry in &stream.entries {
            self.write_stream_entry(entry)?;
        }

        self.write_length(stream.length)?;
        self.write_stream_id(stream.last_id)?;
        if stream.version >= 2 {
            self.write_stream_id(stream.first_id)?;
            self.write_stream_id(stream.max_deleted_id)?;
            self.write_length(stream.added_entries)?;
        }
        self.write_stream_groups(&stream.groups, stream.version)
    }

    fn write_stream_id(&mut self, id: StreamId) -> RdbResult<()> {
        self.write_length(id.ms)?;
        self.write_length(id.seq)
    }

    fn write_stream_entry(&mut self, entry: &StreamEntry) -> RdbResult<()> {
        // Ключ узла — 16 байт big-endian: идентификатор первого сообщения.
        let mut header = [0u8; 16];
        BigEndian::write_u64(&mut header[0..8], entry.first_id.ms);
        BigEndian::write_u64(&mut header[8..16], entry.first_id.seq);
        self.write_blob(&header)?;

        let deleted = entry.messages.iter().filter(|m| m.deleted).count();
        let valid = entry.messages.len() - deleted;

        let mut items: Vec<listpack::Entry> = Vec::new();
        items.push(listpack::Entry::Int(valid as i64));
        items.push(listpack::Entry::Int(deleted as i64));
        items.push(listpack::Entry::Int(entry.fields.len() as i64));
        for field in &entry.fields {
            items.push(listpack::Entry::Str(field.clone()));
        }
        // Счётчик в конце мастер-набора: при чтении отбрасывается.
        items.push(listpack::Entry::Str(format_i64(entry.fields.len() as i64)));

        for msg in &entry.messages {
            let same_fields = msg.fields.len() == entry.fields.len()
                && msg
                    .fields
                    .iter()
                    .zip(&entry.fields)
                    .all(|((name, _), master)| name == master);
            let mut flag = 0i64;
            if msg.deleted {
                flag |= ITEM_FLAG_DELETED;
            }
            if same_fields {
                flag |= ITEM_FLAG_SAME_FIELDS;
            }
            items.push(listpack::Entry::Int(flag));
            items.push(listpack::Entry::Int(
                msg.id.ms.wrapping_sub(entry.first_id.ms) as i64,
            ));
            items.push(listpack::Entry::Int(
                msg.id.seq.wrapping_sub(entry.first_id.seq) as i64,
            ));
            if !same_fields {
                items.push(listpack::Entry::Int(msg.fields.len() as i64));
            }
            for (name, value) in &msg.fields {
                if !same_fields {
                    items.push(listpack::Entry::Str(name.clone()));
                }
                items.push(listpack::Entry::Str(value.clone()));
            }
            items.push(listpack::Entry::Str(format_i64(msg.fields.len() as i64)));
        }

        let buf = listpack::write(&items)?;
        self.write_blob(&buf)
    }

    fn write_stream_groups(&mut self, groups: &[StreamGroup], version: u8) -> RdbResult<()> {
        self.write_length(groups.len() as u64)?;
        for group in groups {
            self.write_string(&group.name)?;
            self.write_stream_id(group.last_id)?;
            if version >= 2 {
                self.write_length(group.entries_read.unwrap_or(0))?;
            }

            self.write_length(group.pending.len() as u64)?;
            for nack in &group.pending {
                self.write_nack_id(nack.id)?;
                self.write_u64_le(nack.delivery_time)?;
                self.write_length(nack.delivery_count)?;
            }

            self.write_length(group.consumers.len() as u64)?;
            for consumer in &group.consumers {
                self.write_string(&consumer.name)?;
                self.write_u64_le(consumer.seen_time)?;
                if version >= 3 {
                    self.write_u64_le(consumer.active_time)?;
                }
                self.write_length(consumer.pending.len() as u64)?;
                for id in &consumer.pending {
                    self.write_nack_id(*id)?;
                }
            }
        }
        Ok(())
    }

    /// Идентификаторы в списках PEL пишутся сырыми парами big-endian u64.
    fn write_nack_id(&mut self, id: StreamId) -> RdbResult<()> {
        let mut buf = [0u8; 8];
        BigEndian::write_u64(&mut buf, id.ms);
        self.write(&buf)?;
        BigEndian::write_u64(&mut buf, id.seq);
        self.write(&buf)
    }
}

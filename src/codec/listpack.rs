//! Компактный список (listpack).
//!
//! Формат буфера: заголовок 6 байт (общий размер u32 LE, число записей
//! u16 LE), затем записи. Запись — байт заголовка, содержимое и поле
//! backlength (1–5 байт), по которому список обходится с конца. Чтение
//! идёт по счётчику записей, ширина backlength выводится из размера уже
//! прочитанной записи.

use crate::{
    codec::{format_i64, BufCursor},
    error::{RdbError, RdbResult},
};

/// Запись listpack: целое или байтовая строка.
///
/// Раздельные варианты нужны, чтобы пустая строка не смешивалась с нулём.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Int(i64),
    Str(Vec<u8>),
}

impl Entry {
    /// Содержимое записи как байты; целые форматируются десятично.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Entry::Int(v) => format_i64(v),
            Entry::Str(s) => s,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Entry::Int(v) => Some(*v),
            Entry::Str(s) => std::str::from_utf8(s).ok()?.parse().ok(),
        }
    }
}

impl From<i64> for Entry {
    fn from(v: i64) -> Self {
        Entry::Int(v)
    }
}

impl From<Vec<u8>> for Entry {
    fn from(s: Vec<u8>) -> Self {
        Entry::Str(s)
    }
}

impl From<&[u8]> for Entry {
    fn from(s: &[u8]) -> Self {
        Entry::Str(s.to_vec())
    }
}

/// Читает заголовок и возвращает число записей.
pub(crate) fn read_header(cur: &mut BufCursor) -> RdbResult<usize> {
    cur.skip(4)?; // общий размер
    Ok(cur.read_u16_le()? as usize)
}

/// Разбирает весь буфер listpack.
pub fn parse(buf: &[u8]) -> RdbResult<Vec<Entry>> {
    let mut cur = BufCursor::new(buf, "listpack");
    let len = read_header(&mut cur)?;
    let mut entries = Vec::with_capacity(len);
    for _ in 0..len {
        entries.push(read_entry(&mut cur)?);
    }
    Ok(entries)
}

/// Читает запись вместе с её полем backlength.
pub(crate) fn read_entry(cur: &mut BufCursor) -> RdbResult<Entry> {
    let start = cur.position();
    let entry = read_entry_content(cur)?;
    let entry_len = cur.position() - start;
    cur.skip(backlen_width(entry_len))?;
    Ok(entry)
}

/// Запись, которая обязана быть целым числом (счётчики стримов).
pub(crate) fn read_entry_int(cur: &mut BufCursor) -> RdbResult<i64> {
    let at = cur.position();
    read_entry(cur)?.as_int().ok_or_else(|| {
        RdbError::format("listpack entry is not an integer", at as u64)
    })
}

pub(crate) fn read_entry_bytes(cur: &mut BufCursor) -> RdbResult<Vec<u8>> {
    Ok(read_entry(cur)?.into_bytes())
}

fn read_entry_content(cur: &mut BufCursor) -> RdbResult<Entry> {
    let header = cur.read_u8()?;
    match header >> 6 {
        // 0xxxxxxx: uint7
        0 | 1 => return Ok(Entry::Int(header as i64)),
        // 10xxxxxx: строка до 63 байт
        2 => {
            let len = (header & 0x3f) as usize;
            return Ok(Entry::Str(cur.read_bytes(len)?.to_vec()));
        }
        _ => {}
    }
    match header >> 4 {
        // 110xxxxx: int13
        0x0c | 0x0d => {
            let next = cur.read_u8()?;
            let mut val = (((header & 0x1f) as i64) << 8) | next as i64;
            if val >= 1 << 12 {
                val -= 8192;
            }
            return Ok(Entry::Int(val));
        }
        // 1110xxxx: строка с 12-битной длиной
        0x0e => {
            let next = cur.read_u8()?;
            let len = (((header & 0x0f) as usize) << 8) | next as usize;
            return Ok(Entry::Str(cur.read_bytes(len)?.to_vec()));
        }
        _ => {}
    }
    match header {
        // 11110000: строка с 32-битной длиной
        0xf0 => {
            let len = cur.read_u32_be()? as usize;
            Ok(Entry::Str(cur.read_bytes(len)?.to_vec()))
        }
        0xf1 => {
            let bs = cur.read_bytes(2)?;
            Ok(Entry::Int(i16::from_le_bytes([bs[0], bs[1]]) as i64))
        }
        0xf2 => {
            let bs = cur.read_bytes(3)?;
            let widened = u32::from_le_bytes([0, bs[0], bs[1], bs[2]]) as i32;
            Ok(Entry::Int((widened >> 8) as i64))
        }
        0xf3 => {
            let bs = cur.read_bytes(4)?;
            Ok(Entry::Int(
                i32::from_le_bytes([bs[0], bs[1], bs[2], bs[3]]) as i64
            ))
        }
        0xf4 => {
            let bs = cur.read_bytes(8)?;
            Ok(Entry::Int(i64::from_le_bytes([
                bs[0], bs[1], bs[2], bs[3], bs[4], bs[5], bs[6], bs[7],
            ])))
        }
        0xff => Err(RdbError::format(
            "unexpected end of listpack",
            cur.position() as u64,
        )),
        _ => Err(RdbError::format(
            format!("unknown listpack entry header {header:#04x}"),
            cur.position() as u64,
        )),
    }
}

/// Ширина поля backlength для записи данного размера.
pub(crate) fn backlen_width(entry_len: usize) -> usize {
    if entry_len <= 127 {
        1
    } else if entry_len < (1 << 14) - 1 {
        2
    } else if entry_len < (1 << 21) - 1 {
        3
    } else if entry_len < (1 << 28) - 1 {
        4
    } else {
        5
    }
}

fn encode_backlen(out: &mut Vec<u8>, entry_len: usize) {
    let l = entry_len as u32;
    if l <= 127 {
        out.push(l as u8);
    } else if l < (1 << 14) - 1 {
        out.push(0x80 | (l >> 8) as u8);
        out.push(l as u8);
    } else if l < (1 << 21) - 1 {
        out.push(0xc0 | (l >> 16) as u8);
        out.push((l >> 8) as u8);
        out.push(l as u8);
    } else if l < (1 << 28) - 1 {
        out.push(0xe0 | (l >> 24) as u8);
        out.push((l >> 16) as u8);
        out.push((l >> 8) as u8);
        out.push(l as u8);
    } else {
        out.push(0xf0);
        out.extend_from_slice(&l.to_be_bytes());
    }
}

/// Собирает listpack из записей.
pub fn write(entries: &[Entry]) -> RdbResult<Vec<u8>> {
    if entries.len() > u16::MAX as usize {
        return Err(RdbError::encode(format!(
            "listpack cannot hold {} entries",
            entries.len()
        )));
    }
    let mut body = Vec::new();
    for entry in entries {
        let start = body.len();
        match entry {
            Entry::Int(v) => encode_int(&mut body, *v),
            Entry::Str(s) => encode_str(&mut body, s)?,
        }
        let entry_len = body.len() - start;
        encode_backlen(&mut body, entry_len);
    }
    let mut out = Vec::with_capacity(body.len() + 6);
    out.extend_from_slice(&((body.len() + 6) as u32).to_le_bytes());
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

fn encode_int(out: &mut Vec<u8>, v: i64) {
    if (0..=127).contains(&v) {
        out.push(v as u8);
    } else if (-4096..=4095).contains(&v) {
        let uval = (v & 0x1fff) as u16;
        out.push(0xc0 | (uval >> 8) as u8);
        out.push(uval as u8);
    } else if (i16::MIN as i64..=i16::MAX as i64).contains(&v) {
        out.push(0xf1);
        out.extend_from_slice(&(v as i16).to_le_bytes());
    } else if (-(1 << 23)..=(1 << 23) - 1).contains(&v) {
        out.push(0xf2);
        out.extend_from_slice(&(v as i32).to_le_bytes()[0..3]);
    } else if (i32::MIN as i64..=i32::MAX as i64).contains(&v) {
        out.push(0xf3);
        out.extend_from_slice(&(v as i32).to_le_bytes());
    } else {
        out.push(0xf4);
        out.extend_from_slice(&v.to_le_bytes());
    }
}

fn encode_str(out: &mut Vec<u8>, s: &[u8]) -> RdbResult<()> {
    if s.len() <= 63 {
        out.push(0x80 | s.len() as u8);
    } else if s.len() < 1 << 12 {
        out.push(0xe0 | (s.len() >> 8) as u8);
        out.push(s.len() as u8);
    } else if s.len() <= u32::MAX as usize {
        out.push(0xf0);
        out.extend_from_slice(&(s.len() as u32).to_be_bytes());
    } else {
        return Err(RdbError::encode("listpack entry longer than u32::MAX"));
    }
    out.extend_from_slice(s);
    Ok(())
}

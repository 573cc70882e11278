//! Множество целых фиксированной ширины (intset).
//!
//! Формат буфера: ширина элемента u32 LE (2, 4 или 8), мощность u32 LE,
//! затем элементы — знаковые little-endian числа указанной ширины.
//! Элементы возвращаются десятичными ASCII-строками.

use crate::{
    codec::{canonical_i64, format_i64, BufCursor},
    error::{RdbError, RdbResult},
};

/// Разбирает intset в список десятичных строк.
pub fn parse(buf: &[u8]) -> RdbResult<Vec<Vec<u8>>> {
    let mut cur = BufCursor::new(buf, "intset");
    let width = cur.read_u32_le()?;
    if width != 2 && width != 4 && width != 8 {
        return Err(RdbError::format(
            format!("unknown intset encoding: {width}"),
            0,
        ));
    }
    let cardinality = cur.read_u32_le()?;
    // Мощность ещё не сверена с размером буфера, предзахват ограничен.
    let mut result = Vec::with_capacity((cardinality as usize).min(1 << 16));
    for _ in 0..cardinality {
        let value = match width {
            2 => cur.read_u16_le()? as i16 as i64,
            4 => cur.read_u32_le()? as i32 as i64,
            _ => cur.read_u64_le()? as i64,
        };
        result.push(format_i64(value));
    }
    Ok(result)
}

/// Собирает intset из элементов; элементы сортируются по возрастанию,
/// ширина — минимальная, в которую помещаются все значения.
///
/// Возвращает `None`, если какой-то элемент не является каноническим
/// десятичным числом: такое множество intset-формой не представимо.
pub fn write(members: &[Vec<u8>]) -> Option<Vec<u8>> {
    let mut values = Vec::with_capacity(members.len());
    for m in members {
        values.push(canonical_i64(m)?);
    }
    values.sort_unstable();
    let width: u32 = if values
        .iter()
        .all(|v| (i16::MIN as i64..=i16::MAX as i64).contains(v))
    {
        2
    } else if values
        .iter()
        .all(|v| (i32::MIN as i64..=i32::MAX as i64).contains(v))
    {
        4
    } else {
        8
    };
    let mut buf = Vec::with_capacity(8 + values.len() * width as usize);
    buf.extend_from_slice(&width.to_le_bytes());
    buf.extend_from_slice(&(values.len() as u32).to_le_bytes());
    for v in values {
        match width {
            2 => buf.extend_from_slice(&(v as i16).to_le_bytes()),
            4 => buf.extend_from_slice(&(v as i32).to_le_bytes()),
            _ => buf.extend_from_slice(&v.to_le_bytes()),
        }
    }
    Some(buf)
}

//! Упакованный список (ziplist).
//!
//! Формат буфера: заголовок 10 байт (zlbytes u32 LE, zltail u32 LE,
//! zllen u16 LE), затем записи, затем байт-терминатор 0xFF. Каждая запись:
//! длина предыдущей записи (1 байт либо 0xFE + u32 LE), байт заголовка и
//! содержимое. Целые записи возвращаются десятичной ASCII-строкой.

use crate::{
    codec::{canonical_i64, format_i64, BufCursor},
    error::{RdbError, RdbResult},
};

const ZIP_STR_06B: u8 = 0;
const ZIP_STR_14B: u8 = 1;
const ZIP_STR_32B: u8 = 2;

const ZIP_INT_8B: u8 = 0xfe;
const ZIP_INT_16B: u8 = 0xc0;
const ZIP_INT_24B: u8 = 0xf0;
const ZIP_INT_32B: u8 = 0xd0;
const ZIP_INT_64B: u8 = 0xe0;

const ZIP_BIG_PREVLEN: u8 = 0xfe;
const ZIP_END: u8 = 0xff;

const MAX_INT_24: i64 = (1 << 23) - 1;
const MIN_INT_24: i64 = -(1 << 23);

/// Читает заголовок и возвращает число записей (zllen).
pub(crate) fn read_header(cur: &mut BufCursor) -> RdbResult<usize> {
    cur.skip(8)?; // zlbytes + zltail
    Ok(cur.read_u16_le()? as usize)
}

/// Разбирает весь буфер ziplist в список значений.
pub fn parse(buf: &[u8]) -> RdbResult<Vec<Vec<u8>>> {
    let mut cur = BufCursor::new(buf, "ziplist");
    let len = read_header(&mut cur)?;
    let mut entries = Vec::with_capacity(len);
    for _ in 0..len {
        entries.push(read_entry(&mut cur)?);
    }
    Ok(entries)
}

/// Читает одну запись: поле prevlen, заголовок, содержимое.
pub(crate) fn read_entry(cur: &mut BufCursor) -> RdbResult<Vec<u8>> {
    let prev_len = cur.read_u8()?;
    if prev_len == ZIP_BIG_PREVLEN {
        cur.skip(4)?;
    }
    let header = cur.read_u8()?;
    match header >> 6 {
        ZIP_STR_06B => {
            let len = (header & 0x3f) as usize;
            return Ok(cur.read_bytes(len)?.to_vec());
        }
        ZIP_STR_14B => {
            let next = cur.read_u8()?;
            let len = (((header & 0x3f) as usize) << 8) | next as usize;
            return Ok(cur.read_bytes(len)?.to_vec());
        }
        ZIP_STR_32B => {
            let len = cur.read_u32_be()? as usize;
            return Ok(cur.read_bytes(len)?.to_vec());
        }
        _ => {}
    }
    match header {
        ZIP_INT_8B => {
            let b = cur.read_u8()?;
            Ok(format_i64(b as i8 as i64))
        }
        ZIP_INT_16B => {
            let v = cur.read_u16_le()? as i16;
            Ok(format_i64(v as i64))
        }
        ZIP_INT_32B => {
            let v = cur.read_u32_le()? as i32;
            Ok(format_i64(v as i64))
        }
        ZIP_INT_64B => {
            let v = cur.read_u64_le()? as i64;
            Ok(format_i64(v))
        }
        ZIP_INT_24B => {
            // Три байта дополняются нулём слева, знак восстанавливается
            // арифметическим сдвигом 32-битного значения.
            let bs = cur.read_bytes(3)?;
            let widened = u32::from_le_bytes([0, bs[0], bs[1], bs[2]]) as i32;
            Ok(format_i64((widened >> 8) as i64))
        }
        _ if header >> 4 == 0x0f && header != ZIP_END => {
            // 0xF1..=0xFD: значение лежит прямо в заголовке.
            Ok(format_i64((header & 0x0f) as i64 - 1))
        }
        _ => Err(RdbError::format(
            format!("unknown ziplist entry header {header:#04x}"),
            cur.position() as u64,
        )),
    }
}

/// Собирает ziplist из значений. Канонические десятичные строки получают
/// целочисленное кодирование, остальное пишется как байты.
pub fn write(values: &[Vec<u8>]) -> RdbResult<Vec<u8>> {
    if values.len() > u16::MAX as usize {
        return Err(RdbError::encode(format!(
            "ziplist cannot hold {} entries",
            values.len()
        )));
    }
    let mut buf = vec![0u8; 10];
    let mut zl_tail = 10usize;
    let mut prev_len = 0usize;
    for (i, value) in values.iter().enumerate() {
        let entry = encode_entry(prev_len, value)?;
        if i < values.len() - 1 {
            zl_tail += entry.len();
        }
        prev_len = entry.len();
        buf.extend_from_slice(&entry);
    }
    buf.push(ZIP_END);
    let zl_bytes = buf.len() as u32;
    buf[0..4].copy_from_slice(&zl_bytes.to_le_bytes());
    buf[4..8].copy_from_slice(&(zl_tail as u32).to_le_bytes());
    buf[8..10].copy_from_slice(&(values.len() as u16).to_le_bytes());
    Ok(buf)
}

fn encode_entry(prev_len: usize, value: &[u8]) -> RdbResult<Vec<u8>> {
    let mut out = Vec::with_capacity(value.len() + 16);
    if prev_len < ZIP_BIG_PREVLEN as usize {
        out.push(prev_len as u8);
    } else {
        out.push(ZIP_BIG_PREVLEN);
        out.extend_from_slice(&(prev_len as u32).to_le_bytes());
    }
    if let Some(v) = canonical_i64(value) {
        if (0..=12).contains(&v) {
            out.push(0xf0 | (v as u8 + 1));
        } else if (i8::MIN as i64..=i8::MAX as i64).contains(&v) {
            out.push(ZIP_INT_8B);
            out.push(v as u8);
        } else if (MIN_INT_24..=MAX_INT_24).contains(&v) {
            out.push(ZIP_INT_24B);
            out.extend_from_slice(&(v as i32).to_le_bytes()[0..3]);
        } else if (i32::MIN as i64..=i32::MAX as i64).contains(&v) {
            out.push(ZIP_INT_32B);
            out.extend_from_slice(&(v as i32).to_le_bytes());
        } else {
            out.push(ZIP_INT_64B);
            out.extend_from_slice(&v.to_le_bytes());
        }
        return Ok(out);
    }
    if value.len() <= 0x3f {
        out.push(value.len() as u8);
    } else if value.len() <= 0x3fff {
        out.push((value.len() >> 8) as u8 | 0x40);
        out.push(value.len() as u8);
    } else if value.len() <= u32::MAX as usize {
        out.push(0x80);
        out.extend_from_slice(&(value.len() as u32).to_be_bytes());
    } else {
        return Err(RdbError::encode("ziplist entry longer than u32::MAX"));
    }
    out.extend_from_slice(value);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(values: &[&[u8]]) {
        let owned: Vec<Vec<u8>> = values.iter().map(|v| v.to_vec()).collect();
        let buf = write(&owned).unwrap();
        assert_eq!(parse(&buf).unwrap(), owned);
    }

    #[test]
    fn test_roundtrip_strings() {
        roundtrip(&[b"", b"a", b"hello world"]);
    }

    #[test]
    fn test_roundtrip_string_length_boundaries() {
        let s63 = vec![b'x'; 63];
        let s64 = vec![b'x'; 64];
        let s16383 = vec![b'y'; 16383];
        let s16384 = vec![b'y'; 16384];
        roundtrip(&[&s63, &s64, &s16383, &s16384]);
    }

    #[test]
    fn test_roundtrip_integer_boundaries() {
        roundtrip(&[
            b"0",
            b"12",
            b"13",
            b"127",
            b"-128",
            b"128", // int24, форма int16 не используется
            b"300",
            b"8388607",
            b"-8388608",
            b"8388608",
            b"2147483647",
            b"-2147483648",
            b"2147483648",
            b"9223372036854775807",
            b"-9223372036854775808",
        ]);
    }

    #[test]
    fn test_non_canonical_numbers_stay_strings() {
        roundtrip(&[b"007", b"+1", b"0x11", b"-0", b"1e5"]);
    }

    #[test]
    fn test_decodes_int16_form() {
        // Кодировщик форму int16 не пишет, но читать её обязан.
        let mut buf = vec![0u8; 10];
        buf.push(0); // prevlen
        buf.push(ZIP_INT_16B);
        buf.extend_from_slice(&(-1234i16).to_le_bytes());
        buf.push(ZIP_END);
        let total = buf.len() as u32;
        buf[0..4].copy_from_slice(&total.to_le_bytes());
        buf[8..10].copy_from_slice(&1u16.to_le_bytes());
        assert_eq!(parse(&buf).unwrap(), vec![b"-1234".to_vec()]);
    }

    #[test]
    fn test_prevlen_long_form() {
        // Запись длиннее 253 байт заставляет следующую использовать
        // пятибайтовое поле prevlen.
        let long = vec![b'z'; 300];
        roundtrip(&[&long, b"tail"]);
    }

    #[test]
    fn test_truncated_buffer_is_error() {
        let buf = write(&[b"hello".to_vec()]).unwrap();
        assert!(parse(&buf[..buf.len() - 3]).is_err());
        assert!(parse(&buf[..5]).is_err());
    }

    #[test]
    fn test_header_counts_entries() {
        let buf = write(&[b"a".to_vec(), b"b".to_vec(), b"42".to_vec()]).unwrap();
        assert_eq!(u16::from_le_bytes([buf[8], buf[9]]), 3);
        assert_eq!(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize, buf.len());
    }
}

//! Устаревшая компактная хеш-таблица (zipmap). Только чтение: формат
//! вытеснен ziplist ещё в Redis 2.6, кодировщик его не порождает.
//!
//! Формат буфера: байт-счётчик пар, затем записи, затем 0xFF. Если
//! счётчик равен 255, реальное число пар узнаётся предварительным
//! проходом до конца буфера. Запись — длина, для значений дополнительно
//! байт свободного места, затем содержимое.

use crate::{
    codec::BufCursor,
    error::{RdbError, RdbResult},
};

const LEN_32BIT: u8 = 253;
const LEN_ILLEGAL: u8 = 254;
const END: u8 = 255;

/// Разбирает zipmap в список пар поле/значение.
pub fn parse(buf: &[u8]) -> RdbResult<Vec<(Vec<u8>, Vec<u8>)>> {
    let mut cur = BufCursor::new(buf, "zipmap");
    let count_byte = cur.read_u8()?;
    let pairs = if count_byte < END {
        count_byte as usize
    } else {
        count_entries(buf)? / 2
    };
    let mut result = Vec::with_capacity(pairs);
    for _ in 0..pairs {
        let field = read_entry(&mut cur, false)?.ok_or_else(|| {
            RdbError::format("zipmap ended before field", cur.position() as u64)
        })?;
        let value = read_entry(&mut cur, true)?.ok_or_else(|| {
            RdbError::format("zipmap ended before value", cur.position() as u64)
        })?;
        result.push((field, value));
    }
    Ok(result)
}

/// Возвращает длину и число свободных байт; `None` — маркер конца.
fn read_entry_len(cur: &mut BufCursor, read_free: bool) -> RdbResult<Option<(usize, usize)>> {
    let b = cur.read_u8()?;
    match b {
        LEN_32BIT => {
            let bs = cur.read_bytes(5)?;
            let len = u32::from_be_bytes([bs[0], bs[1], bs[2], bs[3]]) as usize;
            Ok(Some((len, bs[4] as usize)))
        }
        LEN_ILLEGAL => Err(RdbError::format(
            "illegal zipmap item length",
            cur.position() as u64,
        )),
        END => Ok(None),
        _ => {
            let free = if read_free { cur.read_u8()? as usize } else { 0 };
            Ok(Some((b as usize, free)))
        }
    }
}

fn read_entry(cur: &mut BufCursor, read_free: bool) -> RdbResult<Option<Vec<u8>>> {
    match read_entry_len(cur, read_free)? {
        None => Ok(None),
        Some((len, free)) => {
            let value = cur.read_bytes(len)?.to_vec();
            cur.skip(free)?;
            Ok(Some(value))
        }
    }
}

/// Предварительный проход: считает записи до маркера конца. Курсор
/// ставится сразу за байтом-счётчиком.
fn count_entries(buf: &[u8]) -> RdbResult<usize> {
    let mut cur = BufCursor::new(buf, "zipmap");
    cur.skip(1)?;
    let mut n = 0usize;
    loop {
        let read_free = n % 2 != 0;
        match read_entry_len(&mut cur, read_free)? {
            None => break,
            Some((len, free)) => {
                cur.skip(len + free)?;
                n += 1;
            }
        }
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_entry(buf: &mut Vec<u8>, content: &[u8], free: usize, is_value: bool) {
        buf.push(content.len() as u8);
        if is_value {
            buf.push(free as u8);
        }
        buf.extend_from_slice(content);
        buf.extend(std::iter::repeat(0xAB).take(free));
    }

    fn small_map() -> Vec<u8> {
        let mut buf = vec![2u8];
        push_entry(&mut buf, b"name", 0, false);
        push_entry(&mut buf, b"alice", 2, true);
        push_entry(&mut buf, b"age", 0, false);
        push_entry(&mut buf, b"30", 0, true);
        buf.push(END);
        buf
    }

    #[test]
    fn test_parse_inline_lengths() {
        let pairs = parse(&small_map()).unwrap();
        assert_eq!(
            pairs,
            vec![
                (b"name".to_vec(), b"alice".to_vec()),
                (b"age".to_vec(), b"30".to_vec()),
            ]
        );
    }

    #[test]
    fn test_parse_long_length_form() {
        let long_value = vec![b'v'; 300];
        let mut buf = vec![1u8];
        push_entry(&mut buf, b"k", 0, false);
        buf.push(LEN_32BIT);
        buf.extend_from_slice(&(long_value.len() as u32).to_be_bytes());
        buf.push(1); // free
        buf.extend_from_slice(&long_value);
        buf.push(0xAB);
        buf.push(END);
        let pairs = parse(&buf).unwrap();
        assert_eq!(pairs, vec![(b"k".to_vec(), long_value)]);
    }

    #[test]
    fn test_count_byte_255_triggers_scan() {
        let mut buf = small_map();
        buf[0] = 255;
        let pairs = parse(&buf).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].0, b"age".to_vec());
    }

    #[test]
    fn test_length_254_is_error() {
        let mut buf = vec![1u8];
        buf.push(LEN_ILLEGAL);
        buf.push(END);
        assert!(parse(&buf).is_err());
    }

    #[test]
    fn test_truncated_is_error() {
        let buf = small_map();
        assert!(parse(&buf[..buf.len() - 4]).is_err());
    }
}

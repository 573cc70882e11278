//! Чтение RDB-строк и чисел с плавающей точкой.
//!
//! Строка начинается с кодированной длины. Специальная форма длины несёт
//! целое (int8/int16/int32, знаковое little-endian, возвращается
//! десятичной записью) либо LZF-блок.

use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};

use crate::{
    codec::format_i64,
    error::RdbResult,
    tags::{ENCODE_INT16, ENCODE_INT32, ENCODE_INT8, ENCODE_LZF},
};

use super::Decoder;

impl<R: Read> Decoder<R> {
    pub(crate) fn read_string(&mut self) -> RdbResult<Vec<u8>> {
        let (length, special) = self.read_length()?;
        if special {
            return match length {
                ENCODE_INT8 => {
                    let b = self.read_u8("int8 string")?;
                    Ok(format_i64(b as i8 as i64))
                }
                ENCODE_INT16 => {
                    let mut buf = [0u8; 2];
                    self.fill(&mut buf, "int16 string")?;
                    Ok(format_i64(LittleEndian::read_i16(&buf) as i64))
                }
                ENCODE_INT32 => {
                    let mut buf = [0u8; 4];
                    self.fill(&mut buf, "int32 string")?;
                    Ok(format_i64(LittleEndian::read_i32(&buf) as i64))
                }
                ENCODE_LZF => self.read_lzf(),
                other => Err(self.format_err(format!("unknown string encode type {other}"))),
            };
        }
        self.read_blob(length, "string payload")
    }

    fn read_lzf(&mut self) -> RdbResult<Vec<u8>> {
        let (in_len, _) = self.read_length()?;
        let (out_len, _) = self.read_length()?;
        let compressed = self.read_blob(in_len, "lzf payload")?;
        let raw = lzf::decompress(&compressed, out_len as usize)
            .map_err(|e| self.format_err(format!("lzf decompression failed: {e}")))?;
        if raw.len() != out_len as usize {
            return Err(self.format_err(format!(
                "lzf length mismatch: expected {out_len}, got {}",
                raw.len()
            )));
        }
        Ok(raw)
    }

    /// Двоичный double (little-endian), формат zset2.
    pub(crate) fn read_double(&mut self) -> RdbResult<f64> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf, "binary double")?;
        Ok(LittleEndian::read_f64(&buf))
    }

    /// Текстовый float с байтом длины; 253/254/255 — NaN и бесконечности.
    pub(crate) fn read_literal_float(&mut self) -> RdbResult<f64> {
        let first = self.read_u8("float length")?;
        match first {
            0xff => Ok(f64::NEG_INFINITY),
            0xfe => Ok(f64::INFINITY),
            0xfd => Ok(f64::NAN),
            len => {
                let mut buf = vec![0u8; len as usize];
                self.fill(&mut buf, "float literal")?;
                std::str::from_utf8(&buf)
                    .ok()
                    .and_then(|s| s.parse::<f64>().ok())
                    .ok_or_else(|| self.format_err("invalid float literal"))
            }
        }
    }
}

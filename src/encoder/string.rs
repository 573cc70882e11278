//! Запись RDB-строк и чисел с плавающей точкой.

use std::io::Write;

use byteorder::{ByteOrder, LittleEndian};

use crate::{
    codec::canonical_i64,
    error::RdbResult,
    tags::TYPE_STRING,
};

use super::{Encoder, WriteOptions, COMPRESS_MIN_LEN};

impl<W: Write> Encoder<W> {
    /// Строка с выбором кодирования: каноническое десятичное число уходит
    /// как int8/int16/int32, длинная строка пробует LZF, остальное — как
    /// есть. Число шире 32 бит пишется сырыми байтами: формы int64 у
    /// строк нет.
    pub(crate) fn write_string(&mut self, s: &[u8]) -> RdbResult<()> {
        if let Some(v) = canonical_i64(s) {
            if (i8::MIN as i64..=i8::MAX as i64).contains(&v) {
                return self.write(&[0xc0, v as u8]);
            }
            if (i16::MIN as i64..=i16::MAX as i64).contains(&v) {
                let mut buf = [0xc1, 0, 0];
                LittleEndian::write_i16(&mut buf[1..], v as i16);
                return self.write(&buf);
            }
            if (i32::MIN as i64..=i32::MAX as i64).contains(&v) {
                let mut buf = [0xc2, 0, 0, 0, 0];
                LittleEndian::write_i32(&mut buf[1..], v as i32);
                return self.write(&buf);
            }
        }
        if self.compression && s.len() > COMPRESS_MIN_LEN {
            // NoCompressionPossible у несжимаемых данных — обычный случай.
            if let Ok(compressed) = lzf::compress(s) {
                if compressed.len() < s.len() {
                    self.write_u8(0xc3)?;
                    self.write_length(compressed.len() as u64)?;
                    self.write_length(s.len() as u64)?;
                    return self.write(&compressed);
                }
            }
        }
        self.write_blob(s)
    }

    /// Строка без попыток перекодирования: длина и байты. Так пишутся
    /// буферы вложенных структур.
    pub(crate) fn write_blob(&mut self, s: &[u8]) -> RdbResult<()> {
        self.write_length(s.len() as u64)?;
        self.write(s)
    }

    /// Текстовый float с байтом длины; NaN и бесконечности — маркеры.
    pub(crate) fn write_literal_float(&mut self, f: f64) -> RdbResult<()> {
        if f.is_nan() {
            return self.write_u8(0xfd);
        }
        if f == f64::INFINITY {
            return self.write_u8(0xfe);
        }
        if f == f64::NEG_INFINITY {
            return self.write_u8(0xff);
        }
        let mut text = format!("{f}");
        if text.len() > 252 {
            // Display для f64 экспоненту не использует: 1e300 даёт 301
            // цифру, а длина обязана помещаться в один байт ниже
            // маркеров 253..=255.
            text = format!("{f:e}");
        }
        self.write_u8(text.len() as u8)?;
        self.write(text.as_bytes())
    }

    /// Двоичный double little-endian (модульные значения).
    pub(crate) fn write_double(&mut self, f: f64) -> RdbResult<()> {
        let mut buf = [0u8; 8];
        LittleEndian::write_f64(&mut buf, f);
        self.write(&buf)
    }

    pub fn write_string_object(
        &mut self,
        key: &[u8],
        value: &[u8],
        options: &WriteOptions,
    ) -> RdbResult<()> {
        self.before_write_object(options)?;
        self.write_u8(TYPE_STRING)?;
        self.write_string(key)?;
        self.write_string(value)
    }
}

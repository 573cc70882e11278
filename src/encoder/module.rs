//! Запись модульных значений (тип 7).
//!
//! Поля значения пишутся потоком опкодов через [`ModuleWriter`];
//! завершающий опкод EOF добавляется автоматически, симметрично тому,
//! как его ожидает чтение.

use std::io::Write;

use byteorder::{ByteOrder, LittleEndian};

use crate::{
    decoder::module::MODULE_NAME_CHARSET,
    error::{RdbError, RdbResult},
    tags::TYPE_MODULE_2,
};

use super::{Encoder, WriteOptions};

/// Возможности записи, доступные внутри модульного значения.
pub struct ModuleWriter<'a, W: Write> {
    enc: &'a mut Encoder<W>,
}

impl<W: Write> ModuleWriter<'_, W> {
    pub fn write_uint(&mut self, v: u64) -> RdbResult<()> {
        self.enc.write_length(2)?;
        self.enc.write_length(v)
    }

    pub fn write_sint(&mut self, v: i64) -> RdbResult<()> {
        self.enc.write_length(1)?;
        self.enc.write_length(v as u64)
    }

    pub fn write_float(&mut self, v: f32) -> RdbResult<()> {
        self.enc.write_length(3)?;
        let mut buf = [0u8; 4];
        LittleEndian::write_f32(&mut buf, v);
        self.enc.write(&buf)
    }

    pub fn write_double(&mut self, v: f64) -> RdbResult<()> {
        self.enc.write_length(4)?;
        self.enc.write_double(v)
    }

    pub fn write_string(&mut self, s: &[u8]) -> RdbResult<()> {
        self.enc.write_length(5)?;
        self.enc.write_string(s)
    }
}

impl<W: Write> Encoder<W> {
    /// Записывает модульное значение: имя типа должно состоять из девяти
    /// символов алфавита модулей, версия кодирования — 10 бит.
    pub fn write_module_object<F>(
        &mut self,
        key: &[u8],
        name: &str,
        enc_version: u32,
        options: &WriteOptions,
        body: F,
    ) -> RdbResult<()>
    where
        F: FnOnce(&mut ModuleWriter<'_, W>) -> RdbResult<()>,
    {
        let module_id = module_id_for_name(name, enc_version)?;
        self.before_write_object(options)?;
        self.write_u8(TYPE_MODULE_2)?;
        self.write_string(key)?;
        self.write_length(module_id)?;
        body(&mut ModuleWriter { enc: self })?;
        // Завершающий опкод EOF.
        self.write_length(0)
    }
}

fn module_id_for_name(name: &str, enc_version: u32) -> RdbResult<u64> {
    if name.len() != 9 {
        return Err(RdbError::encode(format!(
            "module type name must be 9 chars, got {:?}",
            name
        )));
    }
    if enc_version > 1023 {
        return Err(RdbError::encode(format!(
            "module encoding version out of range: {enc_version}"
        )));
    }
    let mut id: u64 = 0;
    for c in name.bytes() {
        let idx = MODULE_NAME_CHARSET
            .iter()
            .position(|&x| x == c)
            .ok_or_else(|| {
                RdbError::encode(format!("invalid module type name char: {:?}", c as char))
            })?;
        id = (id << 6) | idx as u64;
    }
    Ok((id << 10) | enc_version as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::module::module_name_by_id;

    #[test]
    fn test_id_packs_name_and_version() {
        let id = module_id_for_name("tst-mod_9", 7).unwrap();
        assert_eq!(module_name_by_id(id), "tst-mod_9");
        assert_eq!(id & 1023, 7);
    }

    #[test]
    fn test_bad_names_rejected() {
        assert!(module_id_for_name("short", 0).is_err());
        assert!(module_id_for_name("has space", 0).is_err());
        assert!(module_id_for_name("tst-mod_9", 1024).is_err());
    }
}

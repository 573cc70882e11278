//! Модульные значения (тип 7).
//!
//! Имя типа упаковано в 64-битный идентификатор: девять 6-битных символов
//! и 10 бит версии кодирования. Содержимое читает зарегистрированный
//! обработчик через [`ModuleRead`]; без обработчика значение либо
//! пропускается по самозавершающемуся потоку опкодов (lenient-режим),
//! либо разбор останавливается с ошибкой.

use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};
use tracing::warn;

use crate::{
    error::{RdbError, RdbResult},
    model::{BaseRecord, ModuleValue, Record},
};

use super::Decoder;

/// Алфавит 6-битных символов имени модульного типа.
pub(crate) const MODULE_NAME_CHARSET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Опкоды внутри модульного значения. Поток ими же и завершается.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleOpcode {
    Eof,
    SInt,
    UInt,
    Float,
    Double,
    String,
}

impl ModuleOpcode {
    fn from_code(code: u64) -> Option<Self> {
        Some(match code {
            0 => Self::Eof,
            1 => Self::SInt,
            2 => Self::UInt,
            3 => Self::Float,
            4 => Self::Double,
            5 => Self::String,
            _ => return None,
        })
    }
}

/// Возможности чтения, доступные обработчику модульного типа.
pub trait ModuleRead {
    fn read_byte(&mut self) -> RdbResult<u8>;
    fn read_full(&mut self, buf: &mut [u8]) -> RdbResult<()>;
    fn read_opcode(&mut self) -> RdbResult<ModuleOpcode>;
    fn read_uint(&mut self) -> RdbResult<u64>;
    fn read_sint(&mut self) -> RdbResult<i64>;
    fn read_float(&mut self) -> RdbResult<f32>;
    fn read_double(&mut self) -> RdbResult<f64>;
    fn read_string(&mut self) -> RdbResult<Vec<u8>>;
    fn read_length(&mut self) -> RdbResult<u64>;
}

/// Обработчик модульного типа: читает поля значения (без завершающего
/// опкода EOF) и возвращает произвольное значение.
pub type ModuleHandler =
    Box<dyn Fn(&mut dyn ModuleRead, u32) -> RdbResult<Box<dyn ModuleValue>>>;

impl<R: Read> ModuleRead for Decoder<R> {
    fn read_byte(&mut self) -> RdbResult<u8> {
        self.read_u8("module byte")
    }

    fn read_full(&mut self, buf: &mut [u8]) -> RdbResult<()> {
        self.fill(buf, "module payload")
    }

    fn read_opcode(&mut self) -> RdbResult<ModuleOpcode> {
        let (code, _) = Decoder::read_length(self)?;
        ModuleOpcode::from_code(code)
            .ok_or_else(|| self.format_err(format!("unknown module opcode: {code}")))
    }

    fn read_uint(&mut self) -> RdbResult<u64> {
        Ok(Decoder::read_length(self)?.0)
    }

    fn read_sint(&mut self) -> RdbResult<i64> {
        Ok(Decoder::read_length(self)?.0 as i64)
    }

    fn read_float(&mut self) -> RdbResult<f32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf, "module float")?;
        Ok(LittleEndian::read_f32(&buf))
    }

    fn read_double(&mut self) -> RdbResult<f64> {
        Decoder::read_double(self)
    }

    fn read_string(&mut self) -> RdbResult<Vec<u8>> {
        Decoder::read_string(self)
    }

    fn read_length(&mut self) -> RdbResult<u64> {
        Ok(Decoder::read_length(self)?.0)
    }
}

impl<R: Read> Decoder<R> {
    pub(crate) fn read_module(&mut self, base: BaseRecord) -> RdbResult<Option<Record>> {
        let (module_id, _) = self.read_length()?;
        let name = module_name_by_id(module_id);
        let enc_version = (module_id & 1023) as u32;
        match self.handlers.remove(&name) {
            Some(handler) => {
                let value = handler(self, enc_version)?;
                self.handlers.insert(name.clone(), handler);
                // Обработчик читает только поля; завершающий опкод — наш.
                self.expect_module_eof()?;
                Ok(Some(Record::Module {
                    base,
                    name,
                    enc_version,
                    value,
                }))
            }
            None if self.lenient_modules => {
                warn!(module = %name, "skipping unknown module value");
                self.skip_module_value()?;
                Ok(None)
            }
            None => Err(self.format_err(format!("unknown module type: {name}"))),
        }
    }

    fn expect_module_eof(&mut self) -> RdbResult<()> {
        match ModuleRead::read_opcode(self)? {
            ModuleOpcode::Eof => Ok(()),
            other => Err(self.format_err(format!(
                "module value not fully consumed, next opcode {other:?}"
            ))),
        }
    }

    /// Пропускает значение по потоку опкодов до EOF.
    fn skip_module_value(&mut self) -> RdbResult<()> {
        loop {
            match ModuleRead::read_opcode(self)? {
                ModuleOpcode::Eof => return Ok(()),
                ModuleOpcode::SInt | ModuleOpcode::UInt => {
                    self.read_length()?;
                }
                ModuleOpcode::Float => {
                    ModuleRead::read_float(self)?;
                }
                ModuleOpcode::Double => {
                    Decoder::read_double(self)?;
                }
                ModuleOpcode::String => {
                    Decoder::read_string(self)?;
                }
            }
        }
    }
}

/// Распаковывает имя типа из идентификатора.
pub(crate) fn module_name_by_id(module_id: u64) -> String {
    let mut id = module_id >> 10;
    let mut name = [0u8; 9];
    for j in 0..9 {
        name[8 - j] = MODULE_NAME_CHARSET[(id & 63) as usize];
        id >>= 6;
    }
    String::from_utf8_lossy(&name).into_owned()
}

//! Запись RDB-дампа.
//!
//! [`Encoder`] ведёт конечный автомат: заголовок, служебные поля,
//! заголовок базы, объекты, завершение. Всё записанное с первого байта
//! заголовка попадает в CRC-64, который уходит в хвост дампа.
//!
//! ```no_run
//! use std::fs::File;
//!
//! use rdbcodec::{Encoder, WriteOptions};
//!
//! let file = File::create("dump.rdb")?;
//! let mut enc = Encoder::new(file);
//! enc.write_header()?;
//! enc.write_aux(b"redis-ver", b"7.2.0")?;
//! enc.write_db_header(0, 1, 0)?;
//! enc.write_string_object(b"greeting", b"hello", &WriteOptions::new())?;
//! enc.write_end()?;
//! # Ok::<(), rdbcodec::RdbError>(())
//! ```

mod hash;
mod list;
mod module;
mod set;
mod stream;
mod string;
mod zset;

pub use module::ModuleWriter;

use std::io::Write;

use byteorder::{ByteOrder, LittleEndian};

use crate::{
    codec::Crc64,
    error::{RdbError, RdbResult},
    tags::*,
};

/// Порог, после которого строка пробует LZF-сжатие.
const COMPRESS_MIN_LEN: usize = 20;
/// Значения по умолчанию для выбора компактной формы.
const DEFAULT_COMPACT_MAX_ENTRIES: usize = 64;
const DEFAULT_COMPACT_MAX_VALUE: usize = 64;
/// Целевой размер страницы quicklist в байтах.
const QUICKLIST_PAGE_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Header,
    Database,
    Ended,
}

/// Параметры записи одного объекта.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    ttl_ms: Option<u64>,
    compact_max_entries: Option<usize>,
    compact_max_value: Option<usize>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Срок жизни ключа в миллисекундах Unix-времени.
    pub fn ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = Some(ttl_ms);
        self
    }

    /// Максимум элементов, при котором объект пишется компактной формой.
    pub fn compact_max_entries(mut self, n: usize) -> Self {
        self.compact_max_entries = Some(n);
        self
    }

    /// Максимальная длина значения для компактной формы.
    pub fn compact_max_value(mut self, n: usize) -> Self {
        self.compact_max_value = Some(n);
        self
    }
}

pub struct Encoder<W: Write> {
    out: W,
    crc: Crc64,
    state: State,
    version: u32,
    checksum: bool,
    compression: bool,
}

impl<W: Write> Encoder<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            crc: Crc64::new(),
            state: State::Initial,
            version: DEFAULT_VERSION,
            checksum: true,
            compression: true,
        }
    }

    /// Версия формата в заголовке. Допустимы значения 1..=9; до пятой
    /// версии хвост с контрольной суммой не пишется.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Выключает контрольную сумму: в хвост уходят восемь нулевых байт.
    pub fn with_checksum(mut self, yes: bool) -> Self {
        self.checksum = yes;
        self
    }

    /// Выключает LZF-сжатие длинных строк.
    pub fn with_compression(mut self, yes: bool) -> Self {
        self.compression = yes;
        self
    }

    // --- Примитивы записи -----------------------------------------------

    pub(crate) fn write(&mut self, bs: &[u8]) -> RdbResult<()> {
        self.out.write_all(bs)?;
        self.crc.update(bs);
        Ok(())
    }

    pub(crate) fn write_u8(&mut self, b: u8) -> RdbResult<()> {
        self.write(&[b])
    }

    pub(crate) fn write_u64_le(&mut self, v: u64) -> RdbResult<()> {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, v);
        self.write(&buf)
    }

    /// Кодирование длины, симметричное `Decoder::read_length`.
    pub(crate) fn write_length(&mut self, v: u64) -> RdbResult<()> {
        if v < 1 << 6 {
            self.write_u8(v as u8)
        } else if v < 1 << 14 {
            self.write(&[(v >> 8) as u8 | 0x40, v as u8])
        } else if v <= u32::MAX as u64 {
            let mut buf = [0u8; 5];
            buf[0] = LEN_32BIT;
            byteorder::BigEndian::write_u32(&mut buf[1..], v as u32);
            self.write(&buf)
        } else {
            let mut buf = [0u8; 9];
            buf[0] = LEN_64BIT;
            byteorder::BigEndian::write_u64(&mut buf[1..], v);
            self.write(&buf)
        }
    }

    // --- Каркас дампа ---------------------------------------------------

    pub fn write_header(&mut self) -> RdbResult<()> {
        if self.state != State::Initial {
            return Err(RdbError::encode("header already written"));
        }
        if !(MIN_VERSION..=MAX_VERSION).contains(&self.version) {
            return Err(RdbError::encode(format!(
                "unsupported version: {}",
                self.version
            )));
        }
        self.write(MAGIC)?;
        self.write(format!("{:04}", self.version).as_bytes())?;
        self.state = State::Header;
        Ok(())
    }

    /// Служебная пара ключ/значение (redis-ver, redis-bits и т.п.).
    pub fn write_aux(&mut self, key: &[u8], value: &[u8]) -> RdbResult<()> {
        if self.state != State::Header && self.state != State::Database {
            return Err(RdbError::encode("aux field must follow the header"));
        }
        self.write_u8(OP_AUX)?;
        self.write_string(key)?;
        self.write_string(value)
    }

    /// Выбор базы и подсказка о числе ключей и ключей с TTL.
    pub fn write_db_header(&mut self, db: u64, key_count: u64, ttl_count: u64) -> RdbResult<()> {
        if self.state != State::Header && self.state != State::Database {
            return Err(RdbError::encode("db header must follow the file header"));
        }
        self.write_u8(OP_SELECT_DB)?;
        self.write_length(db)?;
        self.write_u8(OP_RESIZE_DB)?;
        self.write_length(key_count)?;
        self.write_length(ttl_count)?;
        self.state = State::Database;
        Ok(())
    }

    /// Общая часть записи объекта: проверка состояния и опкод TTL.
    pub(crate) fn before_write_object(&mut self, options: &WriteOptions) -> RdbResult<()> {
        if self.state != State::Database {
            return Err(RdbError::encode(
                "object must follow a db header",
            ));
        }
        if let Some(ttl_ms) = options.ttl_ms {
            self.write_u8(OP_EXPIRE_MS)?;
            self.write_u64_le(ttl_ms)?;
        }
        Ok(())
    }

    pub(crate) fn compact_max_entries(&self, options: &WriteOptions) -> usize {
        options
            .compact_max_entries
            .unwrap_or(DEFAULT_COMPACT_MAX_ENTRIES)
    }

    pub(crate) fn compact_max_value(&self, options: &WriteOptions) -> usize {
        options
            .compact_max_value
            .unwrap_or(DEFAULT_COMPACT_MAX_VALUE)
    }

    pub(crate) fn quicklist_page_size(&self) -> usize {
        QUICKLIST_PAGE_SIZE
    }

    /// Опкод EOF и хвост с контрольной суммой.
    pub fn write_end(&mut self) -> RdbResult<()> {
        if self.state == State::Initial || self.state == State::Ended {
            return Err(RdbError::encode("nothing to finish"));
        }
        self.write_u8(OP_EOF)?;
        if self.version >= CHECKSUM_MIN_VERSION {
            let sum = if self.checksum { self.crc.sum() } else { 0 };
            self.write_u64_le(sum)?;
        }
        self.out.flush()?;
        self.state = State::Ended;
        Ok(())
    }
}

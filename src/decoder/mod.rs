//! Потоковый разбор RDB-дампа.
//!
//! [`Decoder`] читает заголовок, затем гонит конечный автомат по опкодам и
//! отдаёт каждую запись в обратный вызов. Значения не накапливаются:
//! память ограничена самой крупной записью. Попутно считается CRC-64,
//! который сверяется с хвостом дампа на опкоде EOF.
//!
//! ```no_run
//! use std::fs::File;
//!
//! use rdbcodec::{Decoder, Record};
//!
//! let file = File::open("dump.rdb")?;
//! let mut dec = Decoder::new(file);
//! dec.parse(|record: Record| {
//!     if let Some(base) = record.base() {
//!         println!("db {} key {:?}", base.db, base.key);
//!     }
//!     true
//! })?;
//! # Ok::<(), rdbcodec::RdbError>(())
//! ```

mod hash;
mod list;
pub(crate) mod module;
mod set;
mod stream;
mod string;
mod zset;

pub use module::{ModuleHandler, ModuleOpcode, ModuleRead};
pub(crate) use stream::{ITEM_FLAG_DELETED, ITEM_FLAG_SAME_FIELDS};

use std::{
    collections::HashMap,
    io::{self, BufReader, Read},
};

use byteorder::{ByteOrder, LittleEndian};
use tracing::debug;

use crate::{
    codec::Crc64,
    error::{RdbError, RdbResult},
    model::{BaseRecord, Encoding, Record},
    tags::*,
};

/// Верхняя граница предзахвата для длин, заявленных в дампе.
const PREALLOC_LIMIT: u64 = 1 << 16;

/// Ёмкость под заявленное число элементов. Длина из дампа ещё не
/// проверена, поэтому сверх границы вектор растёт по мере чтения.
pub(crate) fn capacity_hint(count: u64) -> usize {
    count.min(PREALLOC_LIMIT) as usize
}

pub struct Decoder<R: Read> {
    input: BufReader<R>,
    read_count: u64,
    crc: Crc64,
    version: u32,
    handlers: HashMap<String, ModuleHandler>,
    lenient_modules: bool,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            input: BufReader::new(reader),
            read_count: 0,
            crc: Crc64::new(),
            version: 0,
            handlers: HashMap::new(),
            lenient_modules: false,
        }
    }

    /// Регистрирует обработчик модульного типа для этой сессии разбора.
    pub fn with_module_handler<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut dyn ModuleRead, u32) -> RdbResult<Box<dyn crate::model::ModuleValue>>
            + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
        self
    }

    /// Незнакомые модульные типы пропускать с предупреждением вместо ошибки.
    pub fn skip_unknown_modules(mut self, yes: bool) -> Self {
        self.lenient_modules = yes;
        self
    }

    /// Версия формата из заголовка. Доступна после начала разбора.
    pub fn version(&self) -> u32 {
        self.version
    }

    // --- Примитивы чтения -----------------------------------------------

    pub(crate) fn fill(&mut self, buf: &mut [u8], context: &'static str) -> RdbResult<()> {
        let offset = self.read_count;
        self.input.read_exact(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                RdbError::Truncated {
                    context,
                    offset,
                    source: e,
                }
            } else {
                RdbError::Io(e)
            }
        })?;
        self.crc.update(buf);
        self.read_count += buf.len() as u64;
        Ok(())
    }

    pub(crate) fn read_u8(&mut self, context: &'static str) -> RdbResult<u8> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf, context)?;
        Ok(buf[0])
    }

    pub(crate) fn read_u64_le(&mut self, context: &'static str) -> RdbResult<u64> {
        let mut buf = [0u8; 8];
        self.fill(&mut buf, context)?;
        Ok(LittleEndian::read_u64(&buf))
    }

    /// Читает `len` байт в вектор. Предзахват ограничен: обрыв потока
    /// обнаружится раньше, чем буфер успеет вырасти до заявленной длины.
    pub(crate) fn read_blob(&mut self, len: u64, context: &'static str) -> RdbResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(capacity_hint(len));
        let mut chunk = [0u8; 8192];
        let mut remaining = len;
        while remaining > 0 {
            let n = remaining.min(chunk.len() as u64) as usize;
            self.fill(&mut chunk[..n], context)?;
            buf.extend_from_slice(&chunk[..n]);
            remaining -= n as u64;
        }
        Ok(buf)
    }

    /// Смещение текущей позиции от начала дампа.
    pub(crate) fn offset(&self) -> u64 {
        self.read_count
    }

    pub(crate) fn format_err(&self, reason: impl Into<String>) -> RdbError {
        RdbError::format(reason, self.read_count)
    }

    /// Кодирование длины: 6 бит, 14 бит, u32/u64 big-endian либо
    /// специальная форма (второй элемент пары — признак special).
    pub(crate) fn read_length(&mut self) -> RdbResult<(u64, bool)> {
        let first = self.read_u8("length")?;
        match (first & 0xc0) >> 6 {
            LEN_6BIT => Ok(((first & 0x3f) as u64, false)),
            LEN_14BIT => {
                let next = self.read_u8("length")?;
                Ok(((((first & 0x3f) as u64) << 8) | next as u64, false))
            }
            LEN_32_OR_64BIT => {
                if first == LEN_32BIT {
                    let mut buf = [0u8; 4];
                    self.fill(&mut buf, "length")?;
                    Ok((byteorder::BigEndian::read_u32(&buf) as u64, false))
                } else if first == LEN_64BIT {
                    let mut buf = [0u8; 8];
                    self.fill(&mut buf, "length")?;
                    Ok((byteorder::BigEndian::read_u64(&buf), false))
                } else {
                    Err(self.format_err(format!("illegal length encoding: {first:#04x}")))
                }
            }
            _ => Ok(((first & 0x3f) as u64, true)),
        }
    }

    // --- Заголовок и цикл записей ---------------------------------------

    fn check_header(&mut self) -> RdbResult<()> {
        let mut header = [0u8; 9];
        self.fill(&mut header, "header")?;
        if &header[0..5] != MAGIC {
            return Err(self.format_err("file is not an RDB file"));
        }
        let version_text = std::str::from_utf8(&header[5..9])
            .map_err(|_| self.format_err("version is not ASCII"))?;
        let version: u32 = version_text
            .parse()
            .map_err(|_| self.format_err(format!("{version_text:?} is not a valid version")))?;
        if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
            return Err(self.format_err(format!("unsupported version: {version}")));
        }
        self.version = version;
        debug!(version, "rdb header accepted");
        Ok(())
    }

    /// Разбирает дамп и вызывает `cb` для каждой записи. Возврат `false`
    /// из обратного вызова корректно останавливает разбор.
    pub fn parse<F>(&mut self, mut cb: F) -> RdbResult<()>
    where
        F: FnMut(Record) -> bool,
    {
        self.check_header()?;
        let mut db: u64 = 0;
        let mut expire_ms: Option<u64> = None;
        loop {
            let op = self.read_u8("opcode")?;
            match op {
                OP_EOF => {
                    self.verify_trailer()?;
                    return Ok(());
                }
                OP_SELECT_DB => {
                    db = self.read_length()?.0;
                }
                OP_EXPIRE_SEC => {
                    let secs = self.read_u64_le("expire seconds")?;
                    expire_ms = Some(secs.wrapping_mul(1000));
                }
                OP_EXPIRE_MS => {
                    expire_ms = Some(self.read_u64_le("expire millis")?);
                }
                OP_RESIZE_DB => {
                    let key_count = self.read_length()?.0;
                    let ttl_count = self.read_length()?.0;
                    if !cb(Record::DbSize {
                        db,
                        key_count,
                        ttl_count,
                    }) {
                        return Ok(());
                    }
                }
                OP_AUX => {
                    let key = self.read_string()?;
                    let value = self.read_string()?;
                    if !cb(Record::Aux { key, value }) {
                        return Ok(());
                    }
                }
                OP_FREQ => {
                    self.read_u8("lfu frequency")?;
                }
                OP_IDLE => {
                    self.read_length()?;
                }
                type_byte => {
                    let key_start = self.offset();
                    let key = self.read_string()?;
                    let key_size = self.offset() - key_start;
                    let base = BaseRecord {
                        db,
                        key,
                        // Срок жизни относится только к следующему ключу.
                        expire_ms: expire_ms.take(),
                        size: 0,
                        encoding: encoding_for(type_byte),
                    };
                    let value_start = self.offset();
                    if let Some(mut record) = self.read_object(type_byte, base)? {
                        let size = self.offset() - value_start + key_size;
                        if let Some(base) = record.base_mut() {
                            base.size = size;
                        }
                        if !cb(record) {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    /// Хвост дампа: с пятой версии формата после EOF лежит CRC-64 little
    /// endian. Нулевое значение означает, что сумма не записывалась.
    fn verify_trailer(&mut self) -> RdbResult<()> {
        if self.version < CHECKSUM_MIN_VERSION {
            return Ok(());
        }
        let computed = self.crc.sum();
        let recorded = self.read_u64_le("checksum trailer")?;
        if recorded != 0 && recorded != computed {
            return Err(RdbError::Checksum { computed, recorded });
        }
        Ok(())
    }

    fn read_object(&mut self, type_byte: u8, base: BaseRecord) -> RdbResult<Option<Record>> {
        let record = match type_byte {
            TYPE_STRING => Record::String {
                base,
                value: self.read_string()?,
            },
            TYPE_LIST => Record::List {
                base,
                values: self.read_list()?,
            },
            TYPE_LIST_ZIPLIST => Record::List {
                base,
                values: self.read_ziplist()?,
            },
            TYPE_LIST_QUICKLIST => Record::List {
                base,
                values: self.read_quicklist()?,
            },
            TYPE_LIST_QUICKLIST_2 => Record::List {
                base,
                values: self.read_quicklist2()?,
            },
            TYPE_SET => Record::Set {
                base,
                members: self.read_set()?,
            },
            TYPE_SET_INTSET => Record::Set {
                base,
                members: self.read_intset()?,
            },
            TYPE_HASH => Record::Hash {
                base,
                fields: self.read_hash()?,
            },
            TYPE_HASH_ZIPMAP => Record::Hash {
                base,
                fields: self.read_zipmap_hash()?,
            },
            TYPE_HASH_ZIPLIST => Record::Hash {
                base,
                fields: self.read_ziplist_hash()?,
            },
            TYPE_HASH_LISTPACK => Record::Hash {
                base,
                fields: self.read_listpack_hash()?,
            },
            TYPE_ZSET => Record::SortedSet {
                base,
                entries: self.read_zset(false)?,
            },
            TYPE_ZSET_2 => Record::SortedSet {
                base,
                entries: self.read_zset(true)?,
            },
            TYPE_ZSET_ZIPLIST => Record::SortedSet {
                base,
                entries: self.read_ziplist_zset()?,
            },
            TYPE_ZSET_LISTPACK => Record::SortedSet {
                base,
                entries: self.read_listpack_zset()?,
            },
            TYPE_STREAM_LISTPACKS => Record::Stream {
                base,
                value: Box::new(self.read_stream(1)?),
            },
            TYPE_STREAM_LISTPACKS_2 => Record::Stream {
                base,
                value: Box::new(self.read_stream(2)?),
            },
            TYPE_STREAM_LISTPACKS_3 => Record::Stream {
                base,
                value: Box::new(self.read_stream(3)?),
            },
            TYPE_MODULE => {
                return Err(self.format_err("module type v1 is not supported"));
            }
            TYPE_MODULE_2 => return self.read_module(base),
            other => {
                return Err(self.format_err(format!("unknown type flag: {other}")));
            }
        };
        Ok(Some(record))
    }
}

fn encoding_for(type_byte: u8) -> Encoding {
    match type_byte {
        TYPE_STRING => Encoding::Raw,
        TYPE_LIST | TYPE_SET | TYPE_HASH | TYPE_ZSET | TYPE_ZSET_2 => Encoding::Plain,
        TYPE_LIST_ZIPLIST | TYPE_ZSET_ZIPLIST | TYPE_HASH_ZIPLIST => Encoding::ZipList,
        TYPE_HASH_LISTPACK | TYPE_ZSET_LISTPACK => Encoding::ListPack,
        TYPE_LIST_QUICKLIST => Encoding::QuickList,
        TYPE_LIST_QUICKLIST_2 => Encoding::QuickList2,
        TYPE_SET_INTSET => Encoding::IntSet,
        TYPE_HASH_ZIPMAP => Encoding::ZipMap,
        TYPE_STREAM_LISTPACKS | TYPE_STREAM_LISTPACKS_2 | TYPE_STREAM_LISTPACKS_3 => {
            Encoding::Stream
        }
        _ => Encoding::Module,
    }
}

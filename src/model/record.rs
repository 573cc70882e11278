//! Записи дампа, передаваемые в обратный вызов разбора.

use std::any::Any;

use crate::model::StreamValue;

/// Дисковое представление, из которого было прочитано значение.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Обычная форма: длина плюс элементы.
    Plain,
    /// Строка с целочисленным или LZF-кодированием внутри.
    Raw,
    ZipList,
    ListPack,
    QuickList,
    QuickList2,
    IntSet,
    ZipMap,
    Stream,
    Module,
}

/// Общая часть каждой ключевой записи.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseRecord {
    /// Номер базы, выбранный последним опкодом SELECTDB.
    pub db: u64,
    pub key: Vec<u8>,
    /// Срок жизни в миллисекундах Unix-времени, если был задан.
    pub expire_ms: Option<u64>,
    /// Сколько байт дампа заняли ключ и значение.
    pub size: u64,
    pub encoding: Encoding,
}

/// Элемент отсортированного множества.
#[derive(Debug, Clone, PartialEq)]
pub struct ZSetEntry {
    pub member: Vec<u8>,
    pub score: f64,
}

/// Значение модульного типа, возвращённое зарегистрированным обработчиком.
///
/// Трейт существует, чтобы `Record` оставался `Debug`, а содержимое
/// определял вызывающий код: `as_any` возвращает конкретный тип обратно.
pub trait ModuleValue: std::fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: std::fmt::Debug + Any> ModuleValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Одна запись дампа. Перечисление закрыто: каждый поддерживаемый
/// типовой байт приводит ровно к одному варианту.
#[derive(Debug)]
pub enum Record {
    String {
        base: BaseRecord,
        value: Vec<u8>,
    },
    List {
        base: BaseRecord,
        values: Vec<Vec<u8>>,
    },
    Set {
        base: BaseRecord,
        members: Vec<Vec<u8>>,
    },
    /// Пары хранятся в порядке следования в дампе.
    Hash {
        base: BaseRecord,
        fields: Vec<(Vec<u8>, Vec<u8>)>,
    },
    SortedSet {
        base: BaseRecord,
        entries: Vec<ZSetEntry>,
    },
    Stream {
        base: BaseRecord,
        value: Box<StreamValue>,
    },
    Module {
        base: BaseRecord,
        name: String,
        enc_version: u32,
        value: Box<dyn ModuleValue>,
    },
    /// Служебная пара из опкода AUX.
    Aux { key: Vec<u8>, value: Vec<u8> },
    /// Подсказка о размере базы из опкода RESIZEDB.
    DbSize {
        db: u64,
        key_count: u64,
        ttl_count: u64,
    },
}

impl Record {
    /// Общая часть, если запись привязана к ключу.
    pub fn base(&self) -> Option<&BaseRecord> {
        match self {
            Record::String { base, .. }
            | Record::List { base, .. }
            | Record::Set { base, .. }
            | Record::Hash { base, .. }
            | Record::SortedSet { base, .. }
            | Record::Stream { base, .. }
            | Record::Module { base, .. } => Some(base),
            Record::Aux { .. } | Record::DbSize { .. } => None,
        }
    }

    pub(crate) fn base_mut(&mut self) -> Option<&mut BaseRecord> {
        match self {
            Record::String { base, .. }
            | Record::List { base, .. }
            | Record::Set { base, .. }
            | Record::Hash { base, .. }
            | Record::SortedSet { base, .. }
            | Record::Stream { base, .. }
            | Record::Module { base, .. } => Some(base),
            Record::Aux { .. } | Record::DbSize { .. } => None,
        }
    }

    pub fn key(&self) -> Option<&[u8]> {
        self.base().map(|b| b.key.as_slice())
    }
}

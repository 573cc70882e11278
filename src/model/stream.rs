//! Модель Redis-стрима, восстановленная из дампа.

/// 128-битный идентификатор: миллисекунды и счётчик внутри миллисекунды.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

/// Сообщение стрима. Поля хранятся в порядке записи.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamMessage {
    pub id: StreamId,
    pub fields: Vec<(Vec<u8>, Vec<u8>)>,
    pub deleted: bool,
}

/// Узел radix-дерева стрима: мастер-набор полей и группа сообщений,
/// чьи идентификаторы кодируются смещением от `first_id`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamEntry {
    pub first_id: StreamId,
    pub fields: Vec<Vec<u8>>,
    pub messages: Vec<StreamMessage>,
}

/// Неподтверждённое сообщение в группе потребителей.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamNAck {
    pub id: StreamId,
    pub delivery_time: u64,
    pub delivery_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamConsumer {
    pub name: Vec<u8>,
    pub seen_time: u64,
    /// До третьей версии формата совпадает с `seen_time`.
    pub active_time: u64,
    pub pending: Vec<StreamId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamGroup {
    pub name: Vec<u8>,
    pub last_id: StreamId,
    /// Есть только начиная со второй версии формата.
    pub entries_read: Option<u64>,
    pub pending: Vec<StreamNAck>,
    pub consumers: Vec<StreamConsumer>,
}

/// Полное содержимое стрима.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamValue {
    /// Версия дискового формата: 1, 2 или 3.
    pub version: u8,
    pub entries: Vec<StreamEntry>,
    pub length: u64,
    pub last_id: StreamId,
    /// Поля ниже заполнены только при версии >= 2.
    pub first_id: StreamId,
    pub max_deleted_id: StreamId,
    pub added_entries: u64,
    pub groups: Vec<StreamGroup>,
}

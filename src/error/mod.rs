//! Типы ошибок кодека RDB-дампов.
//!
//! Все публичные операции возвращают [`RdbResult`]. Ошибки формата несут
//! смещение в потоке, ошибки границ — имя структуры, внутри которой
//! произошло чтение за пределами буфера.

use std::io;

use thiserror::Error;

/// Результат операций чтения и записи дампа.
pub type RdbResult<T> = Result<T, RdbError>;

#[derive(Debug, Error)]
pub enum RdbError {
    /// Байты на месте, но их содержимое нарушает формат.
    #[error("format error at byte {offset}: {reason}")]
    Format { reason: String, offset: u64 },

    /// Поток закончился посреди значения.
    #[error("unexpected end of input while reading {context} at byte {offset}")]
    Truncated {
        context: &'static str,
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// Чтение за пределами вложенного буфера (ziplist, listpack и т.п.).
    #[error("{structure}: out of range read at offset {at} (want {want} bytes, have {have})")]
    Bounds {
        structure: &'static str,
        at: usize,
        want: usize,
        have: usize,
    },

    #[error("checksum mismatch: computed {computed:#018x}, recorded {recorded:#018x}")]
    Checksum { computed: u64, recorded: u64 },

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RdbError {
    /// Ошибка формата с привязкой к смещению в потоке.
    pub(crate) fn format(reason: impl Into<String>, offset: u64) -> Self {
        Self::Format {
            reason: reason.into(),
            offset,
        }
    }

    pub(crate) fn encode(reason: impl Into<String>) -> Self {
        Self::Encode(reason.into())
    }
}

//! Кодеки компактных структур RDB поверх буферов в памяти.
//!
//! Каждая структура приходит в дамп как обычная RDB-строка; разбор идёт
//! по срезу через [`BufCursor`] с проверкой границ. Модули:
//!
//! - [`ziplist`] — упакованный список (типы 10, 12, 13 и страницы quicklist)
//! - [`listpack`] — компактный список (типы 16, 17, 18 и стримы)
//! - [`intset`] — множество целых фиксированной ширины (тип 11)
//! - [`zipmap`] — устаревшая компактная хеш-таблица (тип 9, только чтение)
//! - [`crc64`] — контрольная сумма дампа (полином Jones)

pub mod crc64;
pub mod cursor;
pub mod intset;
pub mod listpack;
pub mod zipmap;
pub mod ziplist;

pub use crc64::Crc64;
pub use cursor::BufCursor;

/// Возвращает число, если `s` — его каноническая десятичная запись.
///
/// «007», «+1» или «0x11» числами не считаются: их целочисленное
/// кодирование не восстановило бы исходные байты.
pub(crate) fn canonical_i64(s: &[u8]) -> Option<i64> {
    let text = std::str::from_utf8(s).ok()?;
    let value: i64 = text.parse().ok()?;
    if value.to_string() == text {
        Some(value)
    } else {
        None
    }
}

/// Десятичная запись целого как байты (обратная сторона `canonical_i64`).
pub(crate) fn format_i64(value: i64) -> Vec<u8> {
    value.to_string().into_bytes()
}

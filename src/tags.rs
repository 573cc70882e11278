//! Однобайтовые коды бинарного формата RDB.
//!
//! Опкоды управляют потоком записей, типовые байты выбирают кодек значения.
//! Используются в модулях `decoder` и `encoder`.

/// Магическая строка в начале файла, за ней четыре ASCII-цифры версии.
pub const MAGIC: &[u8; 5] = b"REDIS";

pub const MIN_VERSION: u32 = 1;
pub const MAX_VERSION: u32 = 9;
/// Версия, которую пишет кодировщик по умолчанию.
pub const DEFAULT_VERSION: u32 = 9;
/// Начиная с этой версии за опкодом EOF следует CRC-64 хвост.
pub const CHECKSUM_MIN_VERSION: u32 = 5;

// --- Опкоды записей -----------------------------------------------------

/// LRU idle time следующего ключа.
pub const OP_IDLE: u8 = 248;
/// LFU-частота следующего ключа.
pub const OP_FREQ: u8 = 249;
/// Служебная пара ключ/значение.
pub const OP_AUX: u8 = 250;
/// Подсказка о размере хеш-таблиц базы.
pub const OP_RESIZE_DB: u8 = 251;
/// Срок жизни следующего ключа в миллисекундах.
pub const OP_EXPIRE_MS: u8 = 252;
/// Срок жизни следующего ключа в секундах (старый формат).
pub const OP_EXPIRE_SEC: u8 = 253;
/// Переключение текущей базы.
pub const OP_SELECT_DB: u8 = 254;
/// Конец дампа.
pub const OP_EOF: u8 = 255;

// --- Типовые байты значений ---------------------------------------------

pub const TYPE_STRING: u8 = 0;
pub const TYPE_LIST: u8 = 1;
pub const TYPE_SET: u8 = 2;
pub const TYPE_ZSET: u8 = 3;
pub const TYPE_HASH: u8 = 4;
/// ZSet с двоичными double-оценками.
pub const TYPE_ZSET_2: u8 = 5;
/// Модульное значение первой версии. Не поддерживается.
pub const TYPE_MODULE: u8 = 6;
pub const TYPE_MODULE_2: u8 = 7;
pub const TYPE_HASH_ZIPMAP: u8 = 9;
pub const TYPE_LIST_ZIPLIST: u8 = 10;
pub const TYPE_SET_INTSET: u8 = 11;
pub const TYPE_ZSET_ZIPLIST: u8 = 12;
pub const TYPE_HASH_ZIPLIST: u8 = 13;
/// Список страниц, каждая страница — ziplist.
pub const TYPE_LIST_QUICKLIST: u8 = 14;
pub const TYPE_STREAM_LISTPACKS: u8 = 15;
pub const TYPE_HASH_LISTPACK: u8 = 16;
pub const TYPE_ZSET_LISTPACK: u8 = 17;
/// Список узлов, узел либо plain-строка, либо listpack.
pub const TYPE_LIST_QUICKLIST_2: u8 = 18;
pub const TYPE_STREAM_LISTPACKS_2: u8 = 19;
pub const TYPE_STREAM_LISTPACKS_3: u8 = 21;

// --- Кодирование длин ---------------------------------------------------

pub const LEN_6BIT: u8 = 0;
pub const LEN_14BIT: u8 = 1;
pub const LEN_32_OR_64BIT: u8 = 2;
pub const LEN_SPECIAL: u8 = 3;
/// Первый байт 32-битной длины (big-endian u32 следом).
pub const LEN_32BIT: u8 = 0x80;
/// Первый байт 64-битной длины (big-endian u64 следом).
pub const LEN_64BIT: u8 = 0x81;

pub const ENCODE_INT8: u64 = 0;
pub const ENCODE_INT16: u64 = 1;
pub const ENCODE_INT32: u64 = 2;
pub const ENCODE_LZF: u64 = 3;

// --- Контейнеры quicklist v2 --------------------------------------------

pub const QUICKLIST_NODE_PLAIN: u64 = 1;
pub const QUICKLIST_NODE_PACKED: u64 = 2;

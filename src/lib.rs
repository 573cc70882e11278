/// Low-level building blocks: CRC-64, ziplist, listpack, intset, zipmap.
pub mod codec;
/// Streaming RDB reader with per-record callback.
pub mod decoder;
/// RDB writer with compact-form selection and LZF compression.
pub mod encoder;
/// Common error type and result alias.
pub mod error;
/// Decoded records and stream structures.
pub mod model;
/// Magic bytes, opcodes, type bytes, and length-encoding sentinels.
pub mod tags;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// CRC-64 (Jones polynomial) used by the dump trailer.
pub use codec::{crc64::checksum, Crc64};
/// Streaming reader and the module-value extension points.
pub use decoder::{Decoder, ModuleHandler, ModuleOpcode, ModuleRead};
/// Writer, per-object options, and the module-value writer.
pub use encoder::{Encoder, ModuleWriter, WriteOptions};
/// Error and result types.
pub use error::{RdbError, RdbResult};
/// Record variants and stream value structures.
pub use model::{
    BaseRecord, Encoding, ModuleValue, Record, StreamConsumer, StreamEntry, StreamGroup, StreamId,
    StreamMessage, StreamNAck, StreamValue, ZSetEntry,
};

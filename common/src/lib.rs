//! Storage building blocks shared by librelog services.
//!
//! The crate exposes a small key-value [`Storage`] abstraction with two
//! backends (in-memory and SlateDB), the configuration that selects between
//! them, an injectable [`Clock`], and order-preserving key encoding helpers.

pub mod clock;
pub mod serde;
pub mod storage;
pub mod util;

pub use clock::Clock;
pub use storage::config::StorageConfig;
pub use storage::{
    Record, RecordOp, Storage, StorageError, StorageIterator, StorageRead, StorageResult,
    WriteOptions,
};
pub use util::BytesRange;

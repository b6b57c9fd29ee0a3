//! Configuration options for librelog.
//!
//! This module defines the configuration and options structs that control
//! how a [`LogDb`](crate::LogDb) is opened and how its writes behave.

use common::StorageConfig;
use serde::Deserialize;

/// Configuration for opening a [`LogDb`](crate::LogDb).
///
/// # Example
///
/// ```ignore
/// use librelog::Config;
/// use common::StorageConfig;
///
/// let config = Config { storage: StorageConfig::InMemory, ..Default::default() };
/// let db = LogDb::open(config).await?;
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage backend configuration.
    ///
    /// Determines where and how log data is persisted. See [`StorageConfig`]
    /// for the in-memory and SlateDB backends.
    pub storage: StorageConfig,

    /// Default durability for writes that do not pass explicit options.
    pub await_durable: bool,
}

impl Config {
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            await_durable: self.await_durable,
        }
    }
}

/// Options for write operations.
///
/// Controls the durability of [`LogDb::append_with_options`](crate::LogDb::append_with_options)
/// and the catalog and credential writes that share the same store.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Whether to wait for the write to be durable before returning.
    ///
    /// When `true`, an append does not return until the object store has
    /// acknowledged it, so an acknowledged record survives a crash. When
    /// `false` (the default), the call returns once the data is in memory.
    pub await_durable: bool,
}

impl WriteOptions {
    pub fn durable() -> Self {
        Self {
            await_durable: true,
        }
    }
}

impl From<WriteOptions> for common::WriteOptions {
    fn from(options: WriteOptions) -> Self {
        common::WriteOptions {
            await_durable: options.await_durable,
        }
    }
}

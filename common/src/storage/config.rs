//! Storage configuration types.
//!
//! Selects the storage backend (in-memory or SlateDB) and, for SlateDB, the
//! object store it persists to. Deserializes from the `storage:` section of a
//! service's YAML config file.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
///
/// Defaults to SlateDB on the local filesystem under `.librelog`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum StorageConfig {
    InMemory,
    SlateDb(SlateDbStorageConfig),
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::SlateDb(SlateDbStorageConfig::default())
    }
}

/// SlateDB-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlateDbStorageConfig {
    /// Path prefix for SlateDB data in the object store.
    pub path: String,

    /// Where SlateDB keeps its files.
    pub object_store: ObjectStoreConfig,

    /// Optional SlateDB settings file (TOML/YAML/JSON). When absent,
    /// `Settings::load()` picks up `SlateDb.*` files and `SLATEDB_` env vars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_path: Option<String>,
}

impl Default for SlateDbStorageConfig {
    fn default() -> Self {
        Self {
            path: "logs".to_string(),
            object_store: ObjectStoreConfig::Local(LocalObjectStoreConfig {
                path: ".librelog".to_string(),
            }),
            settings_path: None,
        }
    }
}

/// Object store provider configuration for SlateDB.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ObjectStoreConfig {
    /// Volatile; useful for development.
    #[default]
    InMemory,

    Aws(AwsObjectStoreConfig),

    Local(LocalObjectStoreConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AwsObjectStoreConfig {
    pub region: String,
    pub bucket: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalObjectStoreConfig {
    /// Directory on the local filesystem; created if missing.
    pub path: String,
}

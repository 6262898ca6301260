//! In-memory record collections with best-effort key-value persistence.
//!
//! A [`RecordStore`] keeps open-schema JSON records in insertion order,
//! enforces id uniqueness and a capacity bound, and mirrors its contents into
//! a [`KeyValueStore`] under a configurable key.

pub mod config;
pub mod db;
pub mod kv;
pub mod logging;
pub mod model;
pub mod store;
pub mod util;

pub use config::{ConfigError, StoreConfig};
pub use kv::{KeyValueStore, KvError, KvResult, MemoryKeyValueStore, SqliteKeyValueStore};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::record::{validate_item, Fields, Record, RecordId, RecordValidationError};
pub use store::record_store::{
    generate_id, PersistError, PersistResult, PersistenceObserver, PersistenceOp, RecordStore,
    StoreError, StoreResult, StoreStats,
};

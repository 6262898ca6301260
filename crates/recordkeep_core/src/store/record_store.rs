//! Ordered in-memory record collection with key-value persistence.
//!
//! # Responsibility
//! - Provide add/get/filter/update/remove/clear/stats over one record list.
//! - Persist the whole list under the configured storage key.
//!
//! # Invariants
//! - Record ids are unique within one store.
//! - `records.len() <= config.max_items` at all times.
//! - Insertion order is preserved by every operation.
//! - Persistence failures never propagate out of mutating operations and
//!   never roll back in-memory state.

use crate::config::{ConfigError, StoreConfig};
use crate::kv::{KeyValueStore, KvError};
use crate::model::record::{
    check_item, coerce_fields, value_kind, Record, RecordId, RecordValidationError,
};
use log::{debug, error, info, warn};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const ID_SUFFIX_LEN: usize = 9;
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
/// Enough fractional digits to print any finite f64 without rounding.
const EXACT_FRACTION_DIGITS: usize = 1100;

pub type StoreResult<T> = Result<T, StoreError>;
pub type PersistResult<T> = Result<T, PersistError>;

/// Failure of a record operation. State is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Validation(RecordValidationError),
    CapacityExceeded { max_items: usize },
    NotFound(RecordId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::CapacityExceeded { max_items } => {
                write!(f, "record store is full ({max_items} items)")
            }
            Self::NotFound(id) => write!(f, "record not found: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::CapacityExceeded { .. } | Self::NotFound(_) => None,
        }
    }
}

impl From<RecordValidationError> for StoreError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Failure of `save`/`load`.
#[derive(Debug)]
pub enum PersistError {
    Kv(KvError),
    Serialize(serde_json::Error),
    Deserialize(serde_json::Error),
    /// Persisted records violate store invariants.
    InvalidData(String),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kv(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to encode records: {err}"),
            Self::Deserialize(err) => write!(f, "failed to decode records: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted records: {message}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Kv(err) => Some(err),
            Self::Serialize(err) | Self::Deserialize(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<KvError> for PersistError {
    fn from(value: KvError) -> Self {
        Self::Kv(value)
    }
}

/// Which persistence call produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceOp {
    Save,
    Load,
}

/// Callback receiving every save/load outcome, auto-saves included.
pub type PersistenceObserver = Box<dyn Fn(PersistenceOp, Result<(), &PersistError>)>;

/// Capacity summary returned by [`RecordStore::stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total: usize,
    pub max_items: usize,
    /// `total / max_items * 100` with two decimals and a trailing `%`.
    pub percentage: String,
}

/// Ordered record collection bound to one key-value backend.
pub struct RecordStore<S: KeyValueStore> {
    kv: S,
    config: StoreConfig,
    records: Vec<Record>,
    observer: Option<PersistenceObserver>,
}

impl<S: KeyValueStore> RecordStore<S> {
    /// Creates an empty store with default configuration.
    pub fn new(kv: S) -> Self {
        Self {
            kv,
            config: StoreConfig::default(),
            records: Vec::new(),
            observer: None,
        }
    }

    /// Creates an empty store with a caller configuration.
    ///
    /// # Errors
    /// - Returns `ConfigError` when `config` fails validation.
    pub fn with_config(kv: S, config: StoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            kv,
            config,
            records: Vec::new(),
            observer: None,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Backend this store persists into.
    pub fn kv(&self) -> &S {
        &self.kv
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Registers a callback observing persistence outcomes.
    pub fn set_persistence_observer(
        &mut self,
        observer: impl Fn(PersistenceOp, Result<(), &PersistError>) + 'static,
    ) {
        self.observer = Some(Box::new(observer));
    }

    /// Inserts `item` and returns the generated id.
    ///
    /// # Errors
    /// - `StoreError::Validation` when validation is on and `item` is not an
    ///   object.
    /// - `StoreError::CapacityExceeded` when the store already holds
    ///   `max_items` records.
    pub fn add(&mut self, item: Value) -> StoreResult<RecordId> {
        if self.config.validate_data {
            if let Err(err) = check_item(&item) {
                error!(
                    "event=record_add module=store status=rejected reason=validation kind={}",
                    value_kind(&item)
                );
                return Err(err.into());
            }
        }

        if self.records.len() >= self.config.max_items {
            warn!(
                "event=record_add module=store status=rejected reason=capacity_exceeded max_items={}",
                self.config.max_items
            );
            return Err(StoreError::CapacityExceeded {
                max_items: self.config.max_items,
            });
        }

        let id = self.next_unique_id();
        self.records
            .push(Record::new(id.clone(), now_ms(), coerce_fields(item)));
        debug!(
            "event=record_add module=store status=ok id={} total={}",
            id,
            self.records.len()
        );

        self.save_if_enabled();
        Ok(id)
    }

    /// Returns the record with `id`, if any.
    pub fn get_item(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|record| record.id() == id)
    }

    /// Returns matching records in insertion order.
    pub fn filter<P>(&self, mut predicate: P) -> Vec<&Record>
    where
        P: FnMut(&Record) -> bool,
    {
        self.records
            .iter()
            .filter(|record| predicate(*record))
            .collect()
    }

    /// Removes the record with `id`.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when no record has `id`.
    pub fn remove_item(&mut self, id: &str) -> StoreResult<()> {
        let initial_len = self.records.len();
        self.records.retain(|record| record.id() != id);

        if self.records.len() == initial_len {
            return Err(StoreError::NotFound(id.to_string()));
        }

        debug!(
            "event=record_remove module=store status=ok id={} total={}",
            id,
            self.records.len()
        );
        self.save_if_enabled();
        Ok(())
    }

    /// Shallow-merges `updates` into the record with `id`.
    ///
    /// Caller fields win over existing ones; `id`, `timestamp` and
    /// `updatedAt` are never taken from `updates`.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when no record has `id`.
    /// - `StoreError::Validation` when validation is on and `updates` is not
    ///   an object.
    pub fn update_item(&mut self, id: &str, updates: Value) -> StoreResult<()> {
        let Some(index) = self.records.iter().position(|record| record.id() == id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        if self.config.validate_data {
            if let Err(err) = check_item(&updates) {
                error!(
                    "event=record_update module=store status=rejected reason=validation kind={}",
                    value_kind(&updates)
                );
                return Err(err.into());
            }
        }

        self.records[index].merge(coerce_fields(updates), now_ms());
        debug!("event=record_update module=store status=ok id={id}");

        self.save_if_enabled();
        Ok(())
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.records.clear();
        info!("event=record_clear module=store status=ok");
        self.save_if_enabled();
    }

    pub fn stats(&self) -> StoreStats {
        let total = self.records.len();
        let max_items = self.config.max_items;
        let ratio = total as f64 / max_items as f64 * 100.0;
        StoreStats {
            total,
            max_items,
            percentage: format!("{}%", format_hundredths(ratio)),
        }
    }

    /// Writes all records under the storage key.
    ///
    /// Failures are logged and reported to the observer only.
    pub fn save(&self) {
        let _ = self.try_save();
    }

    /// Same as [`RecordStore::save`] but also returns the outcome.
    pub fn try_save(&self) -> PersistResult<()> {
        let result = self.write_snapshot();
        match &result {
            Ok(()) => info!(
                "event=records_save module=store status=ok key={} total={}",
                self.config.storage_key,
                self.records.len()
            ),
            Err(err) => error!(
                "event=records_save module=store status=error key={} error={}",
                self.config.storage_key, err
            ),
        }
        self.notify(PersistenceOp::Save, result.as_ref().map(|_| ()));
        result
    }

    /// Replaces the in-memory records with the persisted ones, if present.
    ///
    /// Failures are logged and reported to the observer; memory is untouched.
    pub fn load(&mut self) {
        let _ = self.try_load();
    }

    /// Same as [`RecordStore::load`] but also returns the outcome.
    ///
    /// Returns `Ok(true)` when persisted records replaced the in-memory ones
    /// and `Ok(false)` when the storage key holds nothing.
    pub fn try_load(&mut self) -> PersistResult<bool> {
        let result = self.read_snapshot();
        let outcome = match result {
            Ok(Some(records)) => {
                self.records = records;
                info!(
                    "event=records_load module=store status=ok key={} total={}",
                    self.config.storage_key,
                    self.records.len()
                );
                Ok(true)
            }
            Ok(None) => {
                debug!(
                    "event=records_load module=store status=empty key={}",
                    self.config.storage_key
                );
                Ok(false)
            }
            Err(err) => {
                error!(
                    "event=records_load module=store status=error key={} error={}",
                    self.config.storage_key, err
                );
                Err(err)
            }
        };
        self.notify(PersistenceOp::Load, outcome.as_ref().map(|_| ()));
        outcome
    }

    fn write_snapshot(&self) -> PersistResult<()> {
        let encoded = serde_json::to_string(&self.records).map_err(PersistError::Serialize)?;
        self.kv.set(&self.config.storage_key, &encoded)?;
        Ok(())
    }

    fn read_snapshot(&self) -> PersistResult<Option<Vec<Record>>> {
        let Some(encoded) = self.kv.get(&self.config.storage_key)? else {
            return Ok(None);
        };
        if encoded.is_empty() {
            return Ok(None);
        }

        let records: Vec<Record> =
            serde_json::from_str(&encoded).map_err(PersistError::Deserialize)?;
        check_loaded_records(&records, self.config.max_items)?;
        Ok(Some(records))
    }

    fn save_if_enabled(&self) {
        if self.config.auto_save {
            self.save();
        }
    }

    fn notify(&self, op: PersistenceOp, outcome: Result<(), &PersistError>) {
        if let Some(observer) = &self.observer {
            observer(op, outcome);
        }
    }

    fn next_unique_id(&self) -> RecordId {
        loop {
            let candidate = generate_id();
            if self.get_item(&candidate).is_none() {
                return candidate;
            }
            warn!("event=record_id_collision module=store status=retry id={candidate}");
        }
    }
}

/// Generates `<epoch-ms>-<9 base36 chars>`.
///
/// Uniqueness is probabilistic; `RecordStore::add` retries on collision.
pub fn generate_id() -> RecordId {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect();
    format!("{}-{suffix}", now_ms())
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Formats a non-negative value with two decimals, rounding ties up.
///
/// Works on the exact decimal expansion of `value`, so `3.125` renders as
/// `3.13` where `{:.2}` would give `3.12`.
fn format_hundredths(value: f64) -> String {
    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, value);
    let Some((whole, fraction)) = exact.split_once('.') else {
        return format!("{value:.2}");
    };
    let digits = fraction.as_bytes();
    let (Ok(whole), true) = (whole.parse::<u64>(), digits.len() >= 3) else {
        return format!("{value:.2}");
    };

    let mut hundredths =
        whole * 100 + u64::from(digits[0] - b'0') * 10 + u64::from(digits[1] - b'0');
    if digits[2] >= b'5' {
        hundredths += 1;
    }
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

fn check_loaded_records(records: &[Record], max_items: usize) -> PersistResult<()> {
    if records.len() > max_items {
        return Err(PersistError::InvalidData(format!(
            "{} records exceed maxItems {max_items}",
            records.len()
        )));
    }

    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id()) {
            return Err(PersistError::InvalidData(format!(
                "duplicate record id `{}`",
                record.id()
            )));
        }
    }
    Ok(())
}

//! In-process key-value backend.
//!
//! Mirrors the behavior of a browser-style local storage: values live for
//! the lifetime of the instance, total size can be capped, and the whole
//! backend can be switched off to simulate an unavailable store.

use super::{KeyValueStore, KvError, KvResult};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// Single-threaded in-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RefCell<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
    unavailable: Cell<bool>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose keys plus values may not exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Makes every subsequent call fail with `KvError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Bytes currently used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }

    fn ensure_available(&self) -> KvResult<()> {
        if self.unavailable.get() {
            return Err(KvError::Unavailable(
                "memory store switched off".to_string(),
            ));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> KvResult<Option<String>> {
        self.ensure_available()?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> KvResult<()> {
        self.ensure_available()?;

        if let Some(quota) = self.quota_bytes {
            let replaced = self
                .entries
                .borrow()
                .get(key)
                .map_or(0, |previous| key.len() + previous.len());
            let required = self.used_bytes() - replaced + key.len() + value.len();
            if required > quota {
                return Err(KvError::QuotaExceeded { required, quota });
            }
        }

        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> KvResult<()> {
        self.ensure_available()?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

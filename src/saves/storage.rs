//! In-memory key-value storage with an optional byte budget.
//!
//! Stands in for `localStorage` when running natively. Clones share the same
//! items, so a caller can keep a handle while the store owns another.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::StorageError;
use crate::platform::KeyValueStorage;

#[derive(Debug, Default)]
struct Items {
    values: HashMap<String, String>,
    quota_bytes: Option<usize>,
    write_failure: Option<String>,
}

impl Items {
    fn used_bytes(&self) -> usize {
        self.values.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<Items>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would push total key+value bytes past `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        let storage = Self::default();
        storage.items.borrow_mut().quota_bytes = Some(bytes);
        storage
    }

    pub fn set_quota(&self, bytes: Option<usize>) {
        self.items.borrow_mut().quota_bytes = bytes;
    }

    /// Make every subsequent write fail with a non-quota error.
    pub fn fail_writes(&self, reason: Option<&str>) {
        self.items.borrow_mut().write_failure = reason.map(str::to_string);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.borrow().values.get(key).cloned()
    }

    pub fn used_bytes(&self) -> usize {
        self.items.borrow().used_bytes()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.borrow_mut();
        if let Some(reason) = items.write_failure.clone() {
            return Err(StorageError::WriteFailed(reason));
        }
        if let Some(quota) = items.quota_bytes {
            let replaced = items.values.get(key).map_or(0, |old| key.len() + old.len());
            let after = items.used_bytes() - replaced + key.len() + value.len();
            if after > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        items.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

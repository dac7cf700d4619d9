//! `window.localStorage` adapter.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::DomException;

use crate::error::StorageError;
use crate::platform::KeyValueStorage;

/// Legacy numeric code browsers still report for quota failures.
const QUOTA_EXCEEDED_CODE: u16 = 22;

pub struct LocalStorage {
    inner: Option<web_sys::Storage>,
}

impl LocalStorage {
    /// Open the page's local storage. Private browsing modes may refuse it; the
    /// adapter then reports every access as unavailable.
    pub fn open() -> Self {
        let inner = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if inner.is_none() {
            tracing::warn!("localStorage unavailable; saves are disabled");
        }
        Self { inner }
    }

    fn storage(&self) -> Result<&web_sys::Storage, StorageError> {
        self.inner
            .as_ref()
            .ok_or_else(|| StorageError::Unavailable("localStorage is not available".into()))
    }
}

impl KeyValueStorage for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(describe(&e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage()?.set_item(key, value).map_err(classify)
    }
}

fn classify(err: JsValue) -> StorageError {
    match err.dyn_ref::<DomException>() {
        Some(ex)
            if ex.name() == "QuotaExceededError"
                || ex.name() == "NS_ERROR_DOM_QUOTA_REACHED"
                || ex.code() == QUOTA_EXCEEDED_CODE =>
        {
            StorageError::QuotaExceeded
        }
        _ => StorageError::WriteFailed(describe(&err)),
    }
}

fn describe(err: &JsValue) -> String {
    match err.dyn_ref::<DomException>() {
        Some(ex) => format!("{}: {}", ex.name(), ex.message()),
        None => err.as_string().unwrap_or_else(|| format!("{:?}", err)),
    }
}

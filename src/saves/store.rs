//! Multi-slot save store on top of browser local storage.
//!
//! Every mutation is a read-modify-write of the single collection key, done on
//! an in-memory copy while holding the store lock. Storage is only written
//! once the full collection has been serialized, so a failed write leaves the
//! previous value untouched.

use futures::lock::Mutex;
use std::rc::Rc;

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::i18n::Localization;
use crate::platform::{Clock, Dialog, KeyValueStorage, PageUi, Platform};
use crate::saves::view::{render_save_list, time_label};
use crate::saves::{SaveCollection, SaveRecord};

/// Result of a `load` that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Server state replaced and the page asked to reload.
    Restored,
    /// Player declined; nothing changed.
    Declined,
}

/// Result of a `delete` that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
    /// No such id; nothing changed.
    Missing,
}

pub struct SaveStore<P: Platform> {
    api: Rc<ApiClient<P::Transport>>,
    storage: Mutex<P::Storage>,
    page: Rc<P::Page>,
    clock: P::Clock,
    i18n: Rc<Localization>,
    key: String,
}

impl<P: Platform> SaveStore<P> {
    pub fn new(
        api: Rc<ApiClient<P::Transport>>,
        storage: P::Storage,
        page: Rc<P::Page>,
        clock: P::Clock,
        i18n: Rc<Localization>,
        key: String,
    ) -> Self {
        Self {
            api,
            storage: Mutex::new(storage),
            page,
            clock,
            i18n,
            key,
        }
    }

    // ── save ───────────────────────────────────────────────────────

    /// Snapshot the server session into a new record. A blank `name` gets the
    /// localized default with the creation time.
    pub async fn save(&self, name: Option<&str>) -> Result<SaveRecord, ClientError> {
        match self.try_save(name).await {
            Ok(record) => {
                tracing::info!(id = %record.id, name = %record.name, "game saved");
                self.page.close_dialog(Dialog::SaveEntry);
                self.page
                    .notify(&self.i18n.format("save.success", &[("name", &record.name)]));
                self.refresh_listing().await;
                Ok(record)
            }
            Err(err) => {
                tracing::warn!(error = %err, "save failed");
                self.page.notify(&self.i18n.get(err.save_message_key()));
                Err(err)
            }
        }
    }

    async fn try_save(&self, name: Option<&str>) -> Result<SaveRecord, ClientError> {
        let payload = self.api.snapshot().await?;
        let now = self.clock.now();
        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => self
                .i18n
                .format("save.default_name", &[("time", &time_label(now))]),
        };

        let mut storage = self.storage.lock().await;
        let mut saves = read_collection(&*storage, &self.key)?;
        let record = SaveRecord::new(saves.next_id(now), name, now, payload);
        saves.insert(record.clone());
        write_collection(&mut *storage, &self.key, &saves)?;
        Ok(record)
    }

    // ── list ───────────────────────────────────────────────────────

    /// All records, most recent first. Never writes; an unreadable collection
    /// lists as empty.
    pub async fn list(&self) -> Vec<SaveRecord> {
        let storage = self.storage.lock().await;
        match read_collection(&*storage, &self.key) {
            Ok(saves) => saves.sorted(),
            Err(err) => {
                tracing::warn!(error = %err, "save collection unreadable; listing nothing");
                Vec::new()
            }
        }
    }

    /// Listing HTML for the save/load dialog.
    pub async fn render_listing(&self) -> String {
        render_save_list(&self.list().await, &self.i18n)
    }

    async fn refresh_listing(&self) {
        let html = self.render_listing().await;
        self.page.refresh_save_list(&html);
    }

    // ── load ───────────────────────────────────────────────────────

    /// Restore a record into the server session after the player confirms.
    /// The stored collection is never modified.
    pub async fn load(&self, id: &str) -> Result<LoadOutcome, ClientError> {
        let result = self.try_load(id).await;
        if let Err(err) = &result {
            tracing::warn!(id, error = %err, "load failed");
            self.page.notify(&self.i18n.get(err.load_message_key()));
        }
        result
    }

    async fn try_load(&self, id: &str) -> Result<LoadOutcome, ClientError> {
        let record = {
            let storage = self.storage.lock().await;
            read_collection(&*storage, &self.key)?.get(id).cloned()
        }
        .ok_or_else(|| ClientError::NotFound(id.to_string()))?;

        if !self.page.confirm(&self.i18n.get("load.confirm")).await {
            tracing::info!(id, "load declined");
            return Ok(LoadOutcome::Declined);
        }

        self.api.restore(&record).await?;
        tracing::info!(id, name = %record.name, "save restored; reloading page");
        self.page.reload();
        Ok(LoadOutcome::Restored)
    }

    // ── delete ─────────────────────────────────────────────────────

    /// Remove a record after the player confirms. Unknown ids are a no-op.
    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome, ClientError> {
        let result = self.try_delete(id).await;
        match &result {
            Ok(DeleteOutcome::Deleted) => {
                self.page.notify(&self.i18n.get("delete.success"));
                self.refresh_listing().await;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(id, error = %err, "delete failed");
                self.page.notify(&self.i18n.get(err.save_message_key()));
            }
        }
        result
    }

    async fn try_delete(&self, id: &str) -> Result<DeleteOutcome, ClientError> {
        let exists = {
            let storage = self.storage.lock().await;
            read_collection(&*storage, &self.key)?.contains(id)
        };
        if !exists {
            tracing::debug!(id, "delete of unknown save ignored");
            return Ok(DeleteOutcome::Missing);
        }

        if !self.page.confirm(&self.i18n.get("delete.confirm")).await {
            tracing::info!(id, "delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        let mut storage = self.storage.lock().await;
        let mut saves = read_collection(&*storage, &self.key)?;
        if saves.remove(id).is_none() {
            return Ok(DeleteOutcome::Missing);
        }
        write_collection(&mut *storage, &self.key, &saves)?;
        tracing::info!(id, remaining = saves.len(), "save deleted");
        Ok(DeleteOutcome::Deleted)
    }
}

fn read_collection<S: KeyValueStorage>(
    storage: &S,
    key: &str,
) -> Result<SaveCollection, ClientError> {
    match storage.get(key)? {
        None => Ok(SaveCollection::default()),
        Some(raw) if raw.trim().is_empty() => Ok(SaveCollection::default()),
        Some(raw) => SaveCollection::from_json(&raw).map_err(|e| {
            ClientError::StorageFailure(format!("stored saves are unreadable: {}", e))
        }),
    }
}

fn write_collection<S: KeyValueStorage>(
    storage: &mut S,
    key: &str,
    saves: &SaveCollection,
) -> Result<(), ClientError> {
    let raw = saves
        .to_json()
        .map_err(|e| ClientError::StorageFailure(format!("could not encode saves: {}", e)))?;
    storage.set(key, &raw)?;
    Ok(())
}

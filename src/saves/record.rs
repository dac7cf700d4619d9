//! Save records and the persisted collection.
//!
//! The whole collection lives under one storage key as a JSON object
//! `{ "<id>": { "name", "timestamp", "data" } }`. The id is the map key and is
//! not repeated inside the entry. An empty collection is `{}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One named snapshot of server-side session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    /// Creation time; only used for ordering.
    pub timestamp: DateTime<Utc>,
    /// Opaque server snapshot, stored verbatim.
    #[serde(rename = "data")]
    pub payload: Value,
}

impl SaveRecord {
    pub fn new(id: String, name: String, timestamp: DateTime<Utc>, payload: Value) -> Self {
        Self {
            id,
            name,
            timestamp,
            payload,
        }
    }
}

/// Keyed save collection, ordered only when listed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveCollection {
    records: BTreeMap<String, SaveRecord>,
}

impl SaveCollection {
    /// Decode the stored JSON object, restoring each record's id from its key.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let mut records: BTreeMap<String, SaveRecord> = serde_json::from_str(raw)?;
        for (id, record) in records.iter_mut() {
            record.id = id.clone();
        }
        Ok(Self { records })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&SaveRecord> {
        self.records.get(id)
    }

    /// Insert or replace the record under its own id.
    pub fn insert(&mut self, record: SaveRecord) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn remove(&mut self, id: &str) -> Option<SaveRecord> {
        self.records.remove(id)
    }

    /// A fresh id derived from `now`, suffixed when the millisecond is taken.
    pub fn next_id(&self, now: DateTime<Utc>) -> String {
        let base = format!("save_{}", now.timestamp_millis());
        if !self.contains(&base) {
            return base;
        }
        (1u32..)
            .map(|n| format!("{}_{}", base, n))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or(base)
    }

    /// All records, most recent first. Equal timestamps fall back to id order.
    pub fn sorted(&self) -> Vec<SaveRecord> {
        let mut list: Vec<SaveRecord> = self.records.values().cloned().collect();
        list.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.id.cmp(&a.id))
        });
        list
    }
}

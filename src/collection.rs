//! A single named slot in the key-value store holding an ordered list of
//! records, newest first.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CollectionError, DecodeError};
use crate::record::Record;
use crate::store::KeyValueStore;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct VersionedOut<'a, T> {
    version: u32,
    records: &'a [T],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Stored<T> {
    Versioned { version: u32, records: Vec<T> },
    Bare(Vec<T>),
}

pub struct PersistedCollection<T: Record> {
    key: &'static str,
    store: Arc<dyn KeyValueStore>,
    records: Vec<T>,
}

impl<T: Record> PersistedCollection<T> {
    pub fn open(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        let records = load_records(store.as_ref(), key);
        Self {
            key,
            store,
            records,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn list(&self) -> &[T] {
        self.records.as_slice()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|record| record.id() == id)
    }

    /// Replaces the record with the same id in place, or inserts at the front.
    /// The in-memory list only changes once the store accepted the write.
    pub fn upsert(&mut self, record: T) -> Result<(), CollectionError> {
        let mut next = self.records.clone();
        match next.iter().position(|existing| existing.id() == record.id()) {
            Some(index) => next[index] = record,
            None => next.insert(0, record),
        }
        self.persist(next.as_slice())?;
        self.records = next;
        Ok(())
    }

    /// Returns whether a record was removed; an unknown id is not an error.
    pub fn delete_by_id(&mut self, id: &str) -> Result<bool, CollectionError> {
        if self.find_by_id(id).is_none() {
            return Ok(false);
        }
        let next: Vec<T> = self
            .records
            .iter()
            .filter(|record| record.id() != id)
            .cloned()
            .collect();
        self.persist(next.as_slice())?;
        self.records = next;
        Ok(true)
    }

    pub fn reload(&mut self) {
        self.records = load_records(self.store.as_ref(), self.key);
    }

    fn persist(&self, records: &[T]) -> Result<(), CollectionError> {
        let text = encode(records).map_err(|source| CollectionError::Encode {
            key: self.key,
            source,
        })?;
        self.store
            .set(self.key, text.as_str())
            .map_err(|source| {
                warn!(key = self.key, error = %source, "store rejected collection write");
                CollectionError::Persistence {
                    key: self.key,
                    source,
                }
            })?;
        debug!(key = self.key, count = records.len(), "persisted collection");
        Ok(())
    }
}

pub fn encode<T: Record>(records: &[T]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&VersionedOut {
        version: SCHEMA_VERSION,
        records,
    })
}

/// Accepts the versioned envelope and the older bare array layout.
pub fn decode<T: Record>(raw: &str) -> Result<Vec<T>, DecodeError> {
    match serde_json::from_str::<Stored<T>>(raw)? {
        Stored::Versioned { version, records } => {
            if version > SCHEMA_VERSION {
                return Err(DecodeError::UnsupportedVersion {
                    found: version,
                    supported: SCHEMA_VERSION,
                });
            }
            Ok(records)
        }
        Stored::Bare(records) => Ok(records),
    }
}

fn load_records<T: Record>(store: &dyn KeyValueStore, key: &'static str) -> Vec<T> {
    let loaded = store
        .get(key)
        .map_err(DecodeError::from)
        .and_then(|raw| match raw {
            Some(raw) => decode(raw.as_str()),
            None => Ok(Vec::new()),
        });
    match loaded {
        Ok(records) => {
            debug!(key, count = records.len(), "loaded collection");
            records
        }
        Err(err) => {
            warn!(key, error = %err, "stored collection unreadable; starting empty");
            Vec::new()
        }
    }
}

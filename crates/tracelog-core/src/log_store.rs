//! Append-only storage of log entries.
//!
//! Every query is a linear scan over [`KeyValueStore::values`]. Audit logs
//! are append-only and moderate in volume, so no secondary indexes are kept.

use tracelog_types::LogEntry;

use crate::error::StoreError;
use crate::store::KeyValueStore;

/// Durable collection of log entries keyed by entry id.
#[derive(Debug)]
pub struct LogStore<L> {
    store: L,
}

impl<L: KeyValueStore<LogEntry>> LogStore<L> {
    /// Wraps a key-value store holding log entries.
    pub fn new(store: L) -> Self {
        Self { store }
    }

    /// Appends an entry under its own id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if an entry with the same id exists.
    pub fn insert(&mut self, entry: LogEntry) -> Result<(), StoreError> {
        let key = entry.id.as_str().to_string();
        self.store.insert(&key, entry)
    }

    /// Every stored entry in insertion order.
    pub fn all(&self) -> Result<Vec<LogEntry>, StoreError> {
        self.store.values()
    }

    /// Entries for which `predicate` holds, in insertion order.
    pub fn filter<P>(&self, predicate: P) -> Result<Vec<LogEntry>, StoreError>
    where
        P: Fn(&LogEntry) -> bool,
    {
        Ok(self
            .store
            .values()?
            .into_iter()
            .filter(|entry| predicate(entry))
            .collect())
    }

    /// The first entry, in insertion order, for which `predicate` holds.
    pub fn find<P>(&self, predicate: P) -> Result<Option<LogEntry>, StoreError>
    where
        P: Fn(&LogEntry) -> bool,
    {
        Ok(self.store.values()?.into_iter().find(|entry| predicate(entry)))
    }
}

use std::collections::HashMap;

use super::KeyValueStore;
use crate::error::StoreError;

/// Insertion-ordered in-memory store.
#[derive(Debug, Clone)]
pub struct MemoryStore<V> {
    collection: String,
    entries: Vec<V>,
    index: HashMap<String, usize>,
}

impl<V> MemoryStore<V> {
    /// Creates an empty store; `collection` only appears in error messages.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> KeyValueStore<V> for MemoryStore<V> {
    fn insert(&mut self, key: &str, value: V) -> Result<(), StoreError> {
        if self.index.contains_key(key) {
            return Err(StoreError::DuplicateKey {
                collection: self.collection.clone(),
                key: key.to_string(),
            });
        }
        self.index.insert(key.to_string(), self.entries.len());
        self.entries.push(value);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<V>, StoreError> {
        Ok(self.index.get(key).map(|&i| self.entries[i].clone()))
    }

    fn contains_key(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.index.contains_key(key))
    }

    fn values(&self) -> Result<Vec<V>, StoreError> {
        Ok(self.entries.clone())
    }
}

//! The durable key-value substrate.
//!
//! The registry and the log store only ever talk to a [`KeyValueStore`].
//! [`MemoryStore`] backs tests and ephemeral deployments; [`SqliteStore`]
//! persists each collection as JSON rows in the `kv_entries` table.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::StoreError;

/// Collection name used by the service registry.
pub const SERVICES_COLLECTION: &str = "services";

/// Collection name used by the log store.
pub const LOGS_COLLECTION: &str = "logs";

/// An append-only map from string keys to values.
pub trait KeyValueStore<V> {
    /// Inserts a value under a new key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateKey`] if `key` is already present.
    fn insert(&mut self, key: &str, value: V) -> Result<(), StoreError>;

    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<V>, StoreError>;

    /// Returns `true` if `key` is present.
    fn contains_key(&self, key: &str) -> Result<bool, StoreError>;

    /// Returns every stored value in insertion order.
    fn values(&self) -> Result<Vec<V>, StoreError>;
}

/// A type-erased store, used when the backend is picked at runtime.
pub type DynStore<V> = Box<dyn KeyValueStore<V> + Send>;

impl<V, T: KeyValueStore<V> + ?Sized> KeyValueStore<V> for Box<T> {
    fn insert(&mut self, key: &str, value: V) -> Result<(), StoreError> {
        (**self).insert(key, value)
    }

    fn get(&self, key: &str) -> Result<Option<V>, StoreError> {
        (**self).get(key)
    }

    fn contains_key(&self, key: &str) -> Result<bool, StoreError> {
        (**self).contains_key(key)
    }

    fn values(&self) -> Result<Vec<V>, StoreError> {
        (**self).values()
    }
}

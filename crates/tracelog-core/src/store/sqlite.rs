//! SQLite-backed collections.
//!
//! Each value is serialised to JSON and stored as one row of `kv_entries`
//! under `(collection, key)`. The table is created by the `tracelog-db`
//! migrations and refuses updates and deletes.

use std::marker::PhantomData;

use rusqlite::{ffi, params, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use tracelog_db::DbPool;

use super::KeyValueStore;
use crate::error::StoreError;

/// One named collection inside the `kv_entries` table.
#[derive(Debug, Clone)]
pub struct SqliteStore<V> {
    pool: DbPool,
    collection: String,
    _value: PhantomData<fn() -> V>,
}

impl<V> SqliteStore<V> {
    /// Binds a collection name to a pool whose database has been migrated.
    pub fn new(pool: DbPool, collection: impl Into<String>) -> Self {
        Self {
            pool,
            collection: collection.into(),
            _value: PhantomData,
        }
    }
}

impl<V: Serialize + DeserializeOwned> KeyValueStore<V> for SqliteStore<V> {
    fn insert(&mut self, key: &str, value: V) -> Result<(), StoreError> {
        let value_json = serde_json::to_string(&value)?;
        let conn = self.pool.get()?;

        match conn.execute(
            "INSERT INTO kv_entries (collection, key, value_json) VALUES (?1, ?2, ?3)",
            params![self.collection, key, value_json],
        ) {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Err(StoreError::DuplicateKey {
                    collection: self.collection.clone(),
                    key: key.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get(&self, key: &str) -> Result<Option<V>, StoreError> {
        let conn = self.pool.get()?;
        let value_json: Option<String> = conn
            .query_row(
                "SELECT value_json FROM kv_entries WHERE collection = ?1 AND key = ?2",
                params![self.collection, key],
                |row| row.get(0),
            )
            .optional()?;

        match value_json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn contains_key(&self, key: &str) -> Result<bool, StoreError> {
        let conn = self.pool.get()?;
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM kv_entries WHERE collection = ?1 AND key = ?2)",
            params![self.collection, key],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn values(&self) -> Result<Vec<V>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT value_json FROM kv_entries WHERE collection = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![self.collection], |row| row.get::<_, String>(0))?;

        let mut values = Vec::new();
        for row in rows {
            values.push(serde_json::from_str(&row?)?);
        }
        Ok(values)
    }
}

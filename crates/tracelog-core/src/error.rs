//! Error types for the storage layer.

use tracelog_types::TracingError;

/// Errors raised by a [`KeyValueStore`](crate::KeyValueStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A database operation failed.
    #[error("store database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No pooled connection could be obtained.
    #[error("store connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization or deserialization of a stored value failed.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The key is already present; collections are append-only.
    #[error("key '{key}' already exists in collection '{collection}'")]
    DuplicateKey {
        /// The collection that rejected the insert.
        collection: String,
        /// The offending key.
        key: String,
    },
}

impl From<StoreError> for TracingError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "internal store failure, masking as invalid payload");
        TracingError::unknown()
    }
}

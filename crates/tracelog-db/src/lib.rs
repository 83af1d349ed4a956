//! Database layer for the tracelog service.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and embedded SQL migrations. The schema is a single append-only
//! key-value table (`kv_entries`) partitioned by collection name; the
//! service registry and the log store each own one collection.
//!
//! Update and delete on `kv_entries` are rejected by triggers, so even a
//! direct SQL client cannot rewrite history without dropping them first.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};

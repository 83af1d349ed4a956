//! Tracelog server library logic.

pub mod api;
pub mod config;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use config::{Config, ConfigError, StorageBackend};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracelog_core::store::{LOGS_COLLECTION, SERVICES_COLLECTION};
use tracelog_core::{DynStore, DynTracingService, MemoryStore, SqliteStore, TracingService};
use tracelog_db::{DbRuntimeSettings, MigrationError, PoolError};
use tracelog_types::{LogEntry, Service};

/// Application state shared across all request handlers.
pub struct AppState {
    /// The tracing service. Every request holds this lock for its whole call.
    pub service: Mutex<DynTracingService>,
}

impl AppState {
    pub fn new(service: DynTracingService) -> Self {
        Self {
            service: Mutex::new(service),
        }
    }
}

/// Errors raised while assembling the tracing service at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("failed to get database connection for migrations: {0}")]
    Connection(#[from] r2d2::Error),
    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// Builds the tracing service on the configured storage backend.
///
/// For the SQLite backend this opens the pool and applies pending
/// migrations before handing the collections to the service.
///
/// # Errors
///
/// Returns `StartupError` if the configuration is invalid or the database
/// cannot be opened or migrated.
pub fn build_service(config: &Config) -> Result<DynTracingService, StartupError> {
    let options = config.tracing_options()?;

    let (services, logs): (DynStore<Service>, DynStore<LogEntry>) = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage, logs will not survive a restart");
            (
                Box::new(MemoryStore::new(SERVICES_COLLECTION)),
                Box::new(MemoryStore::new(LOGS_COLLECTION)),
            )
        }
        StorageBackend::Sqlite => {
            let pool = tracelog_db::create_pool(
                &config.database.path,
                DbRuntimeSettings {
                    busy_timeout_ms: config.database.busy_timeout_ms,
                    pool_max_size: config.database.pool_max_size,
                },
            )?;

            {
                let conn = pool.get()?;
                let applied = tracelog_db::run_migrations(&conn)?;
                if applied > 0 {
                    tracing::info!(count = applied, "applied database migrations");
                }
            }

            tracing::info!(path = %config.database.path, "using sqlite storage");
            (
                Box::new(SqliteStore::new(pool.clone(), SERVICES_COLLECTION)),
                Box::new(SqliteStore::new(pool, LOGS_COLLECTION)),
            )
        }
    };

    Ok(TracingService::new(options, services, logs))
}

/// Maximum request body size (64 KiB). Every request body is a handful of short strings.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/services", post(api::initialize_handler))
        .route(
            "/api/logs",
            post(api::add_log_handler).get(api::get_logs_handler),
        )
        .route("/api/logs/verify", post(api::verify_log_handler))
        .route(
            "/api/logs/action/{action}",
            get(api::get_logs_by_action_handler),
        )
        .route(
            "/api/logs/user/{userId}",
            get(api::get_logs_by_user_handler),
        )
        .route(
            "/api/logs/user/{userId}/data/{dataId}",
            get(api::get_logs_by_user_and_data_id_handler),
        )
        .route(
            "/api/logs/data/{dataId}",
            get(api::get_logs_by_data_id_handler),
        )
        .route(
            "/api/logs/data/{dataId}/action/{action}",
            get(api::get_logs_by_data_id_and_action_handler),
        )
        .route("/api/ids", get(api::generate_id_handler))
        .layer(axum::middleware::from_fn(middleware::caller_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}

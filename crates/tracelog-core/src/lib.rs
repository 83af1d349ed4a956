//! Core of the tracelog audit-log service.
//!
//! Registered services record immutable log entries (who did which action
//! to which data) and query them back by action, user, data id, or the
//! two supported combinations. Each entry carries a keyed composite hash of
//! its `(user_id, data_id, action)` triple so that [`TracingService::verify_log`]
//! can detect entries whose stored fields no longer agree with their hash.
//!
//! # Components
//!
//! | Component | Type |
//! |-----------|------|
//! | Action validator | [`ActionWhitelist`] |
//! | Integrity hasher | [`IntegrityHasher`] |
//! | Identity generator | [`generate_id`] |
//! | Service registry | [`ServiceRegistry`] |
//! | Log store | [`LogStore`] |
//! | Orchestrator | [`TracingService`] |
//!
//! Both collections sit behind the [`KeyValueStore`] trait, with an
//! in-memory and a SQLite implementation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tracelog_core::{ActionWhitelist, IntegrityHasher, TracingOptions, TracingService};
//! use tracelog_types::Identity;
//!
//! let controller = Identity::new("controller");
//! let mut service = TracingService::in_memory(TracingOptions {
//!     controller: controller.clone(),
//!     whitelist: ActionWhitelist::default(),
//!     hasher: IntegrityHasher::new("integrity-key"),
//! });
//!
//! let svc = Identity::new("billing");
//! service.initialize(&controller, svc.clone())?;
//! service.add_log(&svc, "READ", "invoice-7", "Invoice 7", "alice")?;
//! assert!(service.verify_log(&svc, "alice", "invoice-7", "read")?);
//! ```
//!
//! The service holds no lock of its own. Hosts that serve requests in
//! parallel must serialize every call, e.g. behind one `Mutex`.

mod action;
mod error;
mod id;
mod integrity;
mod log_store;
mod registry;
mod service;
pub mod store;

pub use action::{ActionWhitelist, WhitelistError};
pub use error::StoreError;
pub use id::generate_id;
pub use integrity::IntegrityHasher;
pub use log_store::LogStore;
pub use registry::ServiceRegistry;
pub use service::{DynTracingService, TracingOptions, TracingService};
pub use store::{DynStore, KeyValueStore, MemoryStore, SqliteStore};

//! The tracing service: the public operations of the audit log.
//!
//! Every operation takes the caller identity explicitly. All operations
//! except [`TracingService::initialize`] authorize the caller against the
//! service registry before anything else, so an unauthorized call never
//! validates input, never touches the log store, and has no side effect.

use chrono::Utc;
use tracelog_db::DbPool;
use tracelog_types::{Identity, LogEntry, Service, TracingError};

use crate::action::ActionWhitelist;
use crate::id::generate_id;
use crate::integrity::IntegrityHasher;
use crate::log_store::LogStore;
use crate::registry::ServiceRegistry;
use crate::store::{
    DynStore, KeyValueStore, MemoryStore, SqliteStore, LOGS_COLLECTION, SERVICES_COLLECTION,
};

/// Deployment-fixed settings of a [`TracingService`].
#[derive(Debug, Clone)]
pub struct TracingOptions {
    /// The identity allowed to register services.
    pub controller: Identity,
    /// Permitted actions.
    pub whitelist: ActionWhitelist,
    /// Composite hash function.
    pub hasher: IntegrityHasher,
}

/// A service whose backend is chosen at runtime.
pub type DynTracingService = TracingService<DynStore<Service>, DynStore<LogEntry>>;

/// Orchestrates the registry, the whitelist, the hasher and the log store.
#[derive(Debug)]
pub struct TracingService<S, L> {
    registry: ServiceRegistry<S>,
    logs: LogStore<L>,
    whitelist: ActionWhitelist,
    hasher: IntegrityHasher,
}

impl TracingService<MemoryStore<Service>, MemoryStore<LogEntry>> {
    /// A service over fresh in-memory collections.
    pub fn in_memory(options: TracingOptions) -> Self {
        Self::new(
            options,
            MemoryStore::new(SERVICES_COLLECTION),
            MemoryStore::new(LOGS_COLLECTION),
        )
    }
}

impl TracingService<SqliteStore<Service>, SqliteStore<LogEntry>> {
    /// A service over the `services` and `logs` collections of a migrated database.
    pub fn sqlite(options: TracingOptions, pool: DbPool) -> Self {
        Self::new(
            options,
            SqliteStore::new(pool.clone(), SERVICES_COLLECTION),
            SqliteStore::new(pool, LOGS_COLLECTION),
        )
    }
}

impl<S, L> TracingService<S, L>
where
    S: KeyValueStore<Service>,
    L: KeyValueStore<LogEntry>,
{
    /// Assembles a service from its two collections.
    pub fn new(options: TracingOptions, services: S, logs: L) -> Self {
        Self {
            registry: ServiceRegistry::new(options.controller, services),
            logs: LogStore::new(logs),
            whitelist: options.whitelist,
            hasher: options.hasher,
        }
    }

    /// The service registry.
    pub fn registry(&self) -> &ServiceRegistry<S> {
        &self.registry
    }

    /// Registers a new service. Only the controller may call this.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for any caller other than the controller, `Conflict`
    /// if the service already exists.
    pub fn initialize(
        &mut self,
        caller: &Identity,
        service_id: Identity,
    ) -> Result<Service, TracingError> {
        self.registry.initialize(caller, service_id)
    }

    /// Records a new log entry written by `caller`.
    ///
    /// The action is validated and lower-cased, the composite hash is
    /// computed over `(user_id, data_id, action)`, and a fresh id is assigned.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for unregistered callers, `InvalidPayload` for an
    /// unsupported action.
    pub fn add_log(
        &mut self,
        caller: &Identity,
        action: &str,
        data_id: &str,
        data_name: &str,
        user_id: &str,
    ) -> Result<LogEntry, TracingError> {
        self.registry.authorize(caller)?;
        let action = self.whitelist.validate(action)?;

        let entry = LogEntry {
            id: generate_id(),
            service_id: caller.clone(),
            user_id: user_id.to_string(),
            data_id: data_id.to_string(),
            data_name: data_name.to_string(),
            composite_hash: self.hasher.compute_hash(user_id, data_id, &action),
            action,
            created_at: Utc::now(),
        };

        self.logs.insert(entry.clone())?;

        tracing::info!(
            entry_id = %entry.id,
            service_id = %entry.service_id,
            action = %entry.action,
            "log entry recorded"
        );
        Ok(entry)
    }

    /// Every stored entry.
    pub fn get_logs(&self, caller: &Identity) -> Result<Vec<LogEntry>, TracingError> {
        self.registry.authorize(caller)?;
        Ok(self.logs.all()?)
    }

    /// Entries with the given action (compared lower-case).
    ///
    /// # Errors
    ///
    /// `InvalidPayload` if the action is not whitelisted.
    pub fn get_logs_by_action(
        &self,
        caller: &Identity,
        action: &str,
    ) -> Result<Vec<LogEntry>, TracingError> {
        self.registry.authorize(caller)?;
        let action = self.whitelist.validate(action)?;
        tracing::debug!(%action, "querying logs by action");
        Ok(self.logs.filter(|e| e.action == action)?)
    }

    /// Entries attributed to `user_id`.
    pub fn get_logs_by_user(
        &self,
        caller: &Identity,
        user_id: &str,
    ) -> Result<Vec<LogEntry>, TracingError> {
        self.registry.authorize(caller)?;
        tracing::debug!(user_id, "querying logs by user");
        Ok(self.logs.filter(|e| e.user_id == user_id)?)
    }

    /// Entries touching `data_id`.
    pub fn get_logs_by_data_id(
        &self,
        caller: &Identity,
        data_id: &str,
    ) -> Result<Vec<LogEntry>, TracingError> {
        self.registry.authorize(caller)?;
        tracing::debug!(data_id, "querying logs by data id");
        Ok(self.logs.filter(|e| e.data_id == data_id)?)
    }

    /// Entries matching both `user_id` and `data_id`.
    pub fn get_logs_by_user_and_data_id(
        &self,
        caller: &Identity,
        user_id: &str,
        data_id: &str,
    ) -> Result<Vec<LogEntry>, TracingError> {
        self.registry.authorize(caller)?;
        tracing::debug!(user_id, data_id, "querying logs by user and data id");
        Ok(self
            .logs
            .filter(|e| e.user_id == user_id && e.data_id == data_id)?)
    }

    /// Entries matching both `data_id` and `action`.
    ///
    /// # Errors
    ///
    /// `InvalidPayload` if the action is not whitelisted.
    pub fn get_logs_by_data_id_and_action(
        &self,
        caller: &Identity,
        data_id: &str,
        action: &str,
    ) -> Result<Vec<LogEntry>, TracingError> {
        self.registry.authorize(caller)?;
        let action = self.whitelist.validate(action)?;
        tracing::debug!(data_id, %action, "querying logs by data id and action");
        Ok(self
            .logs
            .filter(|e| e.data_id == data_id && e.action == action)?)
    }

    /// Checks that a log for `(user_id, data_id, action)` exists and is intact.
    ///
    /// Recomputes the composite hash and looks up the first entry carrying
    /// it. Returns `Ok(true)` when that entry's stored fields equal the
    /// inputs and `Ok(false)` when they do not, which only happens if the
    /// stored plaintext no longer agrees with its hash.
    ///
    /// # Errors
    ///
    /// `InvalidPayload` for an unsupported action, `NotFound` when no entry
    /// carries the recomputed hash.
    pub fn verify_log(
        &self,
        caller: &Identity,
        user_id: &str,
        data_id: &str,
        action: &str,
    ) -> Result<bool, TracingError> {
        self.registry.authorize(caller)?;
        let action = self.whitelist.validate(action)?;
        let hash = self.hasher.compute_hash(user_id, data_id, &action);

        let entry = self
            .logs
            .find(|e| e.composite_hash == hash)?
            .ok_or_else(|| {
                TracingError::NotFound(
                    "No log entry matches the given user, data and action.".to_string(),
                )
            })?;

        let intact = entry.matches_triple(user_id, data_id, &action);
        if !intact {
            tracing::warn!(
                entry_id = %entry.id,
                "log entry fields disagree with its composite hash"
            );
        }
        Ok(intact)
    }

    /// Returns a fresh unique identity without storing anything.
    pub fn generate_id(&self, caller: &Identity) -> Result<Identity, TracingError> {
        self.registry.authorize(caller)?;
        Ok(generate_id())
    }
}

//! The service registry.
//!
//! Registered services are the only callers allowed to write or read logs.
//! New services are registered by the controller identity fixed at
//! deployment; nothing is ever removed.

use chrono::Utc;
use tracelog_types::{Identity, Service, TracingError};

use crate::error::StoreError;
use crate::store::KeyValueStore;

/// Durable set of authorized caller identities.
#[derive(Debug)]
pub struct ServiceRegistry<S> {
    controller: Identity,
    store: S,
}

impl<S: KeyValueStore<Service>> ServiceRegistry<S> {
    /// Creates a registry whose services are kept in `store`.
    pub fn new(controller: Identity, store: S) -> Self {
        Self { controller, store }
    }

    /// The administrative identity allowed to register services.
    pub fn controller(&self) -> &Identity {
        &self.controller
    }

    /// Registers `service_id` on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// - [`TracingError::Unauthorized`] if `caller` is not the controller.
    /// - [`TracingError::InvalidPayload`] if `service_id` is blank.
    ///
    /// Surrounding whitespace is stripped before the id is stored, matching
    /// how callers are resolved from request headers.
    /// - [`TracingError::Conflict`] if `service_id` is already registered.
    pub fn initialize(
        &mut self,
        caller: &Identity,
        service_id: Identity,
    ) -> Result<Service, TracingError> {
        if *caller != self.controller {
            tracing::warn!(caller = %caller, "service registration rejected: caller is not the controller");
            return Err(TracingError::unauthorized());
        }

        let service_id = Identity::new(service_id.as_str().trim());
        if service_id.is_empty() {
            return Err(TracingError::InvalidPayload(
                "Service id could not be empty.".to_string(),
            ));
        }

        if self.store.contains_key(service_id.as_str())? {
            tracing::warn!(service_id = %service_id, "service registration rejected: already exists");
            return Err(conflict());
        }

        let service = Service {
            id: service_id,
            created_at: Utc::now(),
        };

        match self.store.insert(service.id.as_str(), service.clone()) {
            Ok(()) => {}
            Err(StoreError::DuplicateKey { .. }) => return Err(conflict()),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(service_id = %service.id, "service registered");
        Ok(service)
    }

    /// Returns `true` iff `identity` is a registered service.
    pub fn is_authorized(&self, identity: &Identity) -> Result<bool, StoreError> {
        self.store.contains_key(identity.as_str())
    }

    /// Fails with `Unauthorized` unless `identity` is a registered service.
    pub fn authorize(&self, identity: &Identity) -> Result<(), TracingError> {
        if self.is_authorized(identity)? {
            Ok(())
        } else {
            tracing::warn!(caller = %identity, "rejected call from unregistered caller");
            Err(TracingError::unauthorized())
        }
    }

    /// Looks up a registered service.
    pub fn get(&self, identity: &Identity) -> Result<Option<Service>, StoreError> {
        self.store.get(identity.as_str())
    }

    /// Every registered service in registration order.
    pub fn services(&self) -> Result<Vec<Service>, StoreError> {
        self.store.values()
    }
}

fn conflict() -> TracingError {
    TracingError::Conflict("Service already exists!".to_string())
}

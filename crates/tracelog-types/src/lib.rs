//! Shared types, error definitions, and constants for the tracelog service.
//!
//! This crate holds the records that cross crate boundaries: caller and
//! entry identities, registered services, audit log entries, and the
//! four-kind [`TracingError`] every public operation returns.
//!
//! Field names serialize in camelCase so stored records and HTTP bodies share
//! one shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod error;
pub use error::TracingError;

/// Actions permitted when no whitelist is configured.
pub const DEFAULT_ACTIONS: &[&str] = &["create", "read", "write", "update", "delete", "share", "export"];

/// An opaque principal: a service id, the controller, a caller, or a log entry id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wraps a raw identity string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identity is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for Identity {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// A registered caller permitted to write and query logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// The registry key.
    pub id: Identity,
    /// When the controller registered this service.
    pub created_at: DateTime<Utc>,
}

/// One immutable audit record of an action taken on a piece of data by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Generated, globally unique entry identity.
    pub id: Identity,
    /// The registered service that wrote this entry.
    pub service_id: Identity,
    /// The end user the action is attributed to.
    pub user_id: String,
    /// Identifier of the data the action touched.
    pub data_id: String,
    /// Human-readable name of that data. Not covered by `composite_hash`.
    pub data_name: String,
    /// Lower-cased action, drawn from the whitelist.
    pub action: String,
    /// Integrity digest of `(user_id, data_id, action)`.
    pub composite_hash: String,
    /// Write time.
    pub created_at: DateTime<Utc>,
}

impl LogEntry {
    /// Returns `true` if the entry's plaintext triple equals the given one.
    pub fn matches_triple(&self, user_id: &str, data_id: &str, action: &str) -> bool {
        self.user_id == user_id && self.data_id == data_id && self.action == action
    }
}

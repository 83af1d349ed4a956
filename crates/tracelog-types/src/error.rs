//! The external error taxonomy.

use serde::{Deserialize, Serialize};

/// Errors returned by every tracing operation.
///
/// Serializes externally tagged (`{"Unauthorized": "..."}`), which is also the
/// shape of HTTP error bodies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum TracingError {
    /// The referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The entity already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller is not allowed to perform the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The request was malformed, or an internal failure was masked.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl TracingError {
    /// Message used when an internal failure is masked as `InvalidPayload`.
    pub const UNKNOWN: &'static str = "An unknown error occurred.";

    /// The standard rejection for callers that are not registered services.
    pub fn unauthorized() -> Self {
        Self::Unauthorized("Unauthorized access!".to_string())
    }

    /// An `InvalidPayload` carrying the generic unknown-error message.
    pub fn unknown() -> Self {
        Self::InvalidPayload(Self::UNKNOWN.to_string())
    }

    /// Returns the variant name, as used in logs and tagged bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NotFound",
            Self::Conflict(_) => "Conflict",
            Self::Unauthorized(_) => "Unauthorized",
            Self::InvalidPayload(_) => "InvalidPayload",
        }
    }

    /// Returns the human-readable message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(m) | Self::Conflict(m) | Self::Unauthorized(m) | Self::InvalidPayload(m) => m,
        }
    }
}

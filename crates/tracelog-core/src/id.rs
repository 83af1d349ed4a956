//! Log entry identity generation.

use tracelog_types::Identity;
use uuid::Uuid;

/// Returns a fresh, globally unique identity (random UUID v4).
pub fn generate_id() -> Identity {
    Identity::new(Uuid::new_v4().to_string())
}

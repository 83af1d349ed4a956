//! Composite hashing for tamper evidence.
//!
//! The composite hash is an HMAC-SHA256 over a length-prefixed encoding of
//! `(user_id, data_id, action)`:
//!
//! ```text
//! <len(user_id)>:<user_id>|<len(data_id)>:<data_id>|<len(action)>:<action>
//! ```
//!
//! Lengths are byte counts, so no two distinct triples share an encoding.
//! The same function runs at write time and at verify time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Keyed, deterministic hasher for log entry triples.
#[derive(Clone)]
pub struct IntegrityHasher {
    mac: HmacSha256,
}

impl IntegrityHasher {
    /// Creates a hasher keyed with the deployment's integrity key.
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        let mac = HmacSha256::new_from_slice(key.as_ref()).expect("HMAC accepts keys of any length");
        Self { mac }
    }

    /// Computes the hex-encoded composite hash of a triple.
    pub fn compute_hash(&self, user_id: &str, data_id: &str, action: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(canonical_triple(user_id, data_id, action).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for IntegrityHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrityHasher").finish_non_exhaustive()
    }
}

fn canonical_triple(user_id: &str, data_id: &str, action: &str) -> String {
    format!(
        "{}:{}|{}:{}|{}:{}",
        user_id.len(),
        user_id,
        data_id.len(),
        data_id,
        action.len(),
        action
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let hasher = IntegrityHasher::new("k");
        let a = hasher.compute_hash("u1", "d1", "read");
        let b = hasher.compute_hash("u1", "d1", "read");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_depends_on_every_field() {
        let hasher = IntegrityHasher::new("k");
        let base = hasher.compute_hash("u1", "d1", "read");
        assert_ne!(base, hasher.compute_hash("u2", "d1", "read"));
        assert_ne!(base, hasher.compute_hash("u1", "d2", "read"));
        assert_ne!(base, hasher.compute_hash("u1", "d1", "write"));
    }

    #[test]
    fn shifted_field_boundaries_do_not_collide() {
        let hasher = IntegrityHasher::new("k");
        assert_ne!(
            hasher.compute_hash("ab", "c", "read"),
            hasher.compute_hash("a", "bc", "read")
        );
        assert_ne!(
            hasher.compute_hash("a|1:b", "c", "read"),
            hasher.compute_hash("a", "b|1:c", "read")
        );
    }

    #[test]
    fn key_changes_the_hash() {
        let one = IntegrityHasher::new("key-one").compute_hash("u", "d", "read");
        let two = IntegrityHasher::new("key-two").compute_hash("u", "d", "read");
        assert_ne!(one, two);
    }

    #[test]
    fn canonical_encoding_is_length_prefixed() {
        assert_eq!(canonical_triple("u1", "doc", "read"), "2:u1|3:doc|4:read");
    }
}

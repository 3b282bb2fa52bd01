//! State fingerprinting - canonical identity keys for observed world-states.
//!
//! Two observations that describe the same world configuration must hash to
//! the same fingerprint no matter how the environment happened to order or
//! space its output. Location text is whitespace-collapsed; inventory,
//! visible items, and actions are treated as sets. Every field is fed to the
//! hasher with a length prefix so adjacent fields cannot blur into each other.

use serde::{Deserialize, Serialize};

use crate::observation::{canonical_set, canonical_text, Observation};

/// Policy knobs for fingerprint derivation.
///
/// Score is excluded by default: most environments award points independently
/// of reachable state, so "same room, same items, different score" is one
/// node. Environments where score gates reachability can opt it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintPolicy {
    /// Include the score in the identity key.
    #[serde(default)]
    pub include_score: bool,
}

impl Default for FingerprintPolicy {
    fn default() -> Self {
        Self { include_score: false }
    }
}

/// A deterministic identity key for a canonicalized observation.
///
/// Rendered as 64 lowercase hex characters of a blake3 digest. Fingerprints
/// are the node keys of the world graph and the unit of cross-session dedup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derive the fingerprint of an observation under the given policy.
    pub fn of(observation: &Observation, policy: &FingerprintPolicy) -> Self {
        let mut hasher = blake3::Hasher::new();

        hash_field(&mut hasher, b"location", canonical_text(&observation.location).as_bytes());
        hash_set(&mut hasher, b"inventory", &observation.inventory);
        hash_set(&mut hasher, b"items", &observation.visible_items);
        hash_set(&mut hasher, b"actions", &observation.available_actions);

        if policy.include_score {
            hash_field(&mut hasher, b"score", &observation.score.to_le_bytes());
        }

        Self(hasher.finalize().to_hex().to_string())
    }

    /// Reconstruct a fingerprint from its hex form (e.g. from storage).
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The full 64-character hex key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated key for logs.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(8)]
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn hash_field(hasher: &mut blake3::Hasher, name: &[u8], value: &[u8]) {
    hasher.update(&(name.len() as u64).to_le_bytes());
    hasher.update(name);
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value);
}

fn hash_set(hasher: &mut blake3::Hasher, name: &[u8], values: &[String]) {
    let set = canonical_set(values);
    hasher.update(&(name.len() as u64).to_le_bytes());
    hasher.update(name);
    hasher.update(&(set.len() as u64).to_le_bytes());
    for value in set {
        hasher.update(&(value.len() as u64).to_le_bytes());
        hasher.update(value.as_bytes());
    }
}

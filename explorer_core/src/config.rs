//! Runtime configuration for the exploration engine.

use serde::{Deserialize, Serialize};
use std::path::Path;

use world_graph::FingerprintPolicy;

use crate::error::{ExplorerError, Result};

/// Tunables for sessions and planning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Hard cap on moves per session. Hitting it abandons the session with a
    /// recorded reason.
    pub max_moves: u64,

    /// When backtracking, route over edges any session has recorded rather
    /// than only this session's own trace.
    pub share_discoveries: bool,

    /// Fingerprint derivation policy.
    pub fingerprint: FingerprintPolicy,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_moves: 100,
            share_discoveries: true,
            fingerprint: FingerprintPolicy::default(),
        }
    }
}

impl ExplorerConfig {
    /// Parse a configuration from TOML text. Missing fields take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ExplorerError::Config(e.to_string()))
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ExplorerError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExplorerConfig::default();
        assert_eq!(config.max_moves, 100);
        assert!(config.share_discoveries);
        assert!(!config.fingerprint.include_score);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ExplorerConfig::from_toml_str("max_moves = 25\n").unwrap();
        assert_eq!(config.max_moves, 25);
        assert!(config.share_discoveries);
    }

    #[test]
    fn test_from_toml_fingerprint_section() {
        let config = ExplorerConfig::from_toml_str(
            "share_discoveries = false\n\n[fingerprint]\ninclude_score = true\n",
        )
        .unwrap();
        assert!(!config.share_discoveries);
        assert!(config.fingerprint.include_score);
    }

    #[test]
    fn test_from_toml_invalid() {
        assert!(ExplorerConfig::from_toml_str("max_moves = \"many\"").is_err());
    }
}

//! Optional TOML configuration overrides for CLI defaults (SPEC_FULL §2.3).
//!
//! Precedence, highest first: explicit CLI flags > `VAMANA_CONFIG` file >
//! built-in defaults. The config file is entirely optional; a CLI run with
//! no file and no flags falls back to [`Defaults::default`].

use crate::error::{Result, VamanaError};
use serde::Deserialize;
use std::path::Path;

/// Environment variable naming a TOML file of default overrides.
pub const CONFIG_ENV_VAR: &str = "VAMANA_CONFIG";

/// Build/search defaults that a config file may override.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Default pruning aggressiveness.
    pub alpha: f32,
    /// Default candidate pool size.
    pub l: usize,
    /// Default out-degree cap.
    pub r: usize,
    /// Default medoid/filtered-medoid sample size.
    pub medoid_sample_size: usize,
    /// Default `compute-gt` max-distances cap.
    pub max_distances: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self { alpha: 1.2, l: 32, r: 16, medoid_sample_size: 1000, max_distances: 1000 }
    }
}

impl Defaults {
    /// Loads defaults, applying a `VAMANA_CONFIG` TOML override if the
    /// environment variable is set.
    ///
    /// # Errors
    ///
    /// Returns [`VamanaError::InvalidArgument`] if the variable is set but
    /// the file is missing or fails to parse.
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::from_file(path),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Loads defaults from an explicit TOML file, bypassing the environment
    /// variable (used by tests and by a future `-config` flag).
    ///
    /// # Errors
    ///
    /// Returns [`VamanaError::InvalidArgument`] if the file can't be read or
    /// parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| VamanaError::InvalidArgument(format!("cannot read config file: {e}")))?;
        toml::from_str(&text)
            .map_err(|e| VamanaError::InvalidArgument(format!("malformed config file: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let d = Defaults::default();
        assert_eq!(d.l, 32);
        assert_eq!(d.r, 16);
        assert!((d.alpha - 1.2).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_override_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vamana.toml");
        std::fs::write(&path, "r = 64\n").unwrap();
        let d = Defaults::from_file(&path).unwrap();
        assert_eq!(d.r, 64);
        assert_eq!(d.l, 32);
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vamana.toml");
        std::fs::write(&path, "not valid toml {{{").unwrap();
        let err = Defaults::from_file(&path).unwrap_err();
        assert!(matches!(err, VamanaError::InvalidArgument(_)));
    }
}

//! Tracker configuration
//!
//! Scorer weights, the match threshold τ, and the commit-depth budget are
//! tunable rather than fixed constants; the defaults here were fit against
//! a corpus of known-refactoring commits. A `codetrail.toml` at the
//! repository root overrides them per project.

use crate::error::TrackError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const CONFIG_FILE: &str = "codetrail.toml";

/// Weights of the candidate score's components.
///
/// Signature and AST coverage outweigh naming so pure renames with
/// unchanged bodies are still detected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub name: f64,
    pub signature: f64,
    pub coverage: f64,
    pub container: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            name: 0.2,
            signature: 0.3,
            coverage: 0.35,
            container: 0.15,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.name + self.signature + self.coverage + self.container
    }
}

/// Configuration of one tracking run. Validated eagerly at tracker
/// construction, never inside `track()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Minimum candidate score for a match; below it the transition is
    /// treated as `Introduced` rather than guessing
    pub tau: f64,
    pub weights: ScoreWeights,
    /// Maximum number of commits visited across all branches
    pub max_commits: usize,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            tau: 0.4,
            weights: ScoreWeights::default(),
            max_commits: 1000,
        }
    }
}

impl TrackConfig {
    pub fn validate(&self) -> Result<(), TrackError> {
        if !(0.0..=1.0).contains(&self.tau) {
            return Err(TrackError::Config(format!(
                "tau must be within [0, 1], got {}",
                self.tau
            )));
        }
        let w = &self.weights;
        for (label, value) in [
            ("name", w.name),
            ("signature", w.signature),
            ("coverage", w.coverage),
            ("container", w.container),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TrackError::Config(format!(
                    "weight '{label}' must be non-negative, got {value}"
                )));
            }
        }
        if w.sum() <= 0.0 {
            return Err(TrackError::Config(
                "score weights must not all be zero".to_string(),
            ));
        }
        if self.max_commits == 0 {
            return Err(TrackError::Config(
                "max_commits must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load `codetrail.toml` from a repository root, falling back to defaults
/// when the file does not exist.
pub fn load_config(root: &Path) -> Result<TrackConfig> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(TrackConfig::default());
    }
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: TrackConfig =
        toml::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))?;
    debug!(?path, "loaded project configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        TrackConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_tau() {
        let config = TrackConfig {
            tau: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TrackError::Config(msg)) if msg.contains("tau")
        ));
    }

    #[test]
    fn rejects_zero_weights() {
        let config = TrackConfig {
            weights: ScoreWeights {
                name: 0.0,
                signature: 0.0,
                coverage: 0.0,
                container: 0.0,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_overrides_defaults() {
        let config: TrackConfig = toml::from_str("tau = 0.6\n[weights]\ncoverage = 0.5\n").unwrap();
        assert_eq!(config.tau, 0.6);
        assert_eq!(config.weights.coverage, 0.5);
        // Untouched fields keep their defaults.
        assert_eq!(config.weights.name, 0.2);
        assert_eq!(config.max_commits, 1000);
    }
}

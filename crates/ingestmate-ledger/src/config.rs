use std::path::PathBuf;

use ingestmate_core::AgentMode;
use serde::{Deserialize, Serialize};

use crate::executor::{SimulatedExecutor, DEFAULT_SUCCESS_RATE};
use crate::paths::WorkspacePaths;

// ── Errors ──

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("approval_success_rate must be within [0, 1], got {0}")]
    InvalidSuccessRate(f64),
}

// ── Config ──

/// Monitor settings stored in `.ingestmate/config.json`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub agent_mode: AgentMode,
    /// Recorded as the approver when a command does not name one.
    pub principal: String,
    pub approval_success_rate: f64,
    /// Fixes approval outcomes for reproducible runs.
    pub rng_seed: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            agent_mode: AgentMode::Autonomous,
            principal: "operator".to_string(),
            approval_success_rate: DEFAULT_SUCCESS_RATE,
            rng_seed: None,
        }
    }
}

impl MonitorConfig {
    /// Load from `.ingestmate/config.json`. A missing file yields the defaults.
    pub fn load(paths: &WorkspacePaths) -> Result<Self, ConfigError> {
        let path = &paths.config_json;
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };
        let config: Self =
            serde_json::from_str(&content).map_err(|source| ConfigError::Malformed {
                path: path.clone(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.approval_success_rate) {
            return Err(ConfigError::InvalidSuccessRate(self.approval_success_rate));
        }
        Ok(())
    }

    /// Executor used by `approve`. With `rng_seed` set, each intervention id gets its own draw.
    pub fn executor(&self) -> SimulatedExecutor {
        match self.rng_seed {
            Some(seed) => SimulatedExecutor::seeded(seed, self.approval_success_rate),
            None => SimulatedExecutor::from_entropy(self.approval_success_rate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::RemediationExecutor;
    use crate::ledger::tests::pending;

    fn workspace() -> (tempfile::TempDir, WorkspacePaths) {
        let tmp = tempfile::tempdir().unwrap();
        let paths = WorkspacePaths::discover(tmp.path());
        paths.ensure_layout().unwrap();
        (tmp, paths)
    }

    #[test]
    fn missing_file_gives_defaults() {
        let (_tmp, paths) = workspace();
        let cfg = MonitorConfig::load(&paths).unwrap();
        assert_eq!(cfg, MonitorConfig::default());
        assert_eq!(cfg.agent_mode, AgentMode::Autonomous);
        assert_eq!(cfg.principal, "operator");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let (_tmp, paths) = workspace();
        std::fs::write(
            &paths.config_json,
            r#"{"agent_mode": "supervised", "rng_seed": 9, "unrelated": true}"#,
        )
        .unwrap();
        let cfg = MonitorConfig::load(&paths).unwrap();
        assert_eq!(cfg.agent_mode, AgentMode::Supervised);
        assert_eq!(cfg.rng_seed, Some(9));
        assert_eq!(cfg.approval_success_rate, DEFAULT_SUCCESS_RATE);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let (_tmp, paths) = workspace();
        std::fs::write(&paths.config_json, r#"{"agent_mode": "sometimes"}"#).unwrap();
        assert!(matches!(
            MonitorConfig::load(&paths),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn out_of_range_rate_is_rejected() {
        let (_tmp, paths) = workspace();
        std::fs::write(&paths.config_json, r#"{"approval_success_rate": 1.5}"#).unwrap();
        assert!(matches!(
            MonitorConfig::load(&paths),
            Err(ConfigError::InvalidSuccessRate(r)) if r == 1.5
        ));
    }

    #[test]
    fn seeded_executor_is_reproducible() {
        let cfg = MonitorConfig {
            rng_seed: Some(11),
            ..MonitorConfig::default()
        };
        let (mut a, mut b) = (cfg.executor(), cfg.executor());
        for k in 0..20 {
            let i = pending(&format!("int_{k}"), "p1");
            assert_eq!(a.execute(&i), b.execute(&i));
        }
    }
}

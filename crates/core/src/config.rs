use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FanoutError;
use crate::policy::Policy;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

// ── Top-level config ──────────────────────────────────────────

/// Defaults for iteration runs, parsed from `fanout.toml` with
/// environment variable overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FanoutConfig {
    #[serde(default)]
    pub iteration: IterationConfig,

    #[serde(default)]
    pub violations: ViolationConfig,
}

/// `[iteration]` section: the default concurrency policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationConfig {
    /// One of `unbounded`, `series` or `limit`.
    #[serde(default = "default_policy")]
    pub policy: String,

    /// In-flight window when `policy = "limit"`.
    pub limit: Option<usize>,
}

fn default_policy() -> String {
    "unbounded".into()
}

impl Default for IterationConfig {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            limit: None,
        }
    }
}

impl IterationConfig {
    /// Resolve the configured policy.
    pub fn policy(&self) -> Result<Policy, FanoutError> {
        match self.policy.trim().to_ascii_lowercase().as_str() {
            "limit" | "limited" => self.limit.map(Policy::Limited).ok_or_else(|| {
                FanoutError::Config("iteration.policy = \"limit\" requires iteration.limit".into())
            }),
            other => other.parse(),
        }
    }
}

/// `[violations]` section: how callback misuse is surfaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationConfig {
    /// Emit a `warn` log line for every violation.
    #[serde(default = "default_log")]
    pub log: bool,
}

fn default_log() -> bool {
    true
}

impl Default for ViolationConfig {
    fn default() -> Self {
        Self { log: default_log() }
    }
}

impl FanoutConfig {
    /// Parse config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, FanoutError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FanoutError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Build config from defaults plus environment (call `load_dotenv()` first).
    pub fn from_env() -> Result<Self, FanoutError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check that the configured policy resolves.
    pub fn validate(&self) -> Result<(), FanoutError> {
        self.iteration.policy().map(|_| ())
    }

    /// The default policy for runs built from this config.
    pub fn policy(&self) -> Result<Policy, FanoutError> {
        self.iteration.policy()
    }

    /// Apply environment variable overrides.
    ///
    /// - `FANOUT_POLICY` -> `iteration.policy`
    /// - `FANOUT_LIMIT` -> `iteration.limit`
    /// - `FANOUT_LOG_VIOLATIONS` -> `violations.log`
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Some(v) = env_opt("FANOUT_POLICY") {
            self.iteration.policy = v;
        }
        if let Some(v) = env_opt("FANOUT_LIMIT") {
            if let Ok(limit) = v.parse::<usize>() {
                self.iteration.limit = Some(limit);
            }
        }
        if let Some(v) = env_opt("FANOUT_LOG_VIOLATIONS") {
            if let Ok(log) = v.parse::<bool>() {
                self.violations.log = log;
            }
        }
    }
}

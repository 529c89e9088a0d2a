//! Evaluator configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! read_only_methods = ["GET", "HEAD", "OPTIONS", "CONNECT"]
//! timestamp_tolerance_ms = 1000
//! mutating_default = "precondition_required"
//! read_only_default = "pass"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::evaluator::DEFAULT_TOLERANCE_MS;
use crate::method::{DefaultBehavior, MethodClassifier, READ_ONLY_METHODS};
use crate::{PreconditionError, Result};

/// Standard locations searched when no path is given.
const CONFIG_CANDIDATES: &[&str] = &[
    ".foodshare-preconditions.toml",
    "foodshare-preconditions.toml",
    ".config/foodshare-preconditions.toml",
];

/// Evaluator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreconditionConfig {
    /// Methods that never mutate
    #[serde(default = "default_read_only_methods")]
    pub read_only_methods: Vec<String>,

    /// Timestamp comparison tolerance in milliseconds
    #[serde(default = "default_tolerance_ms")]
    pub timestamp_tolerance_ms: i64,

    /// Outcome for mutating requests that cannot be evaluated
    #[serde(default = "default_mutating")]
    pub mutating_default: DefaultBehavior,

    /// Outcome for read-only requests that cannot be evaluated
    #[serde(default = "default_read_only")]
    pub read_only_default: DefaultBehavior,

    /// Where the configuration was loaded from
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

impl Default for PreconditionConfig {
    fn default() -> Self {
        Self {
            read_only_methods: default_read_only_methods(),
            timestamp_tolerance_ms: default_tolerance_ms(),
            mutating_default: default_mutating(),
            read_only_default: default_read_only(),
            path: None,
        }
    }
}

fn default_read_only_methods() -> Vec<String> {
    READ_ONLY_METHODS.iter().map(|m| (*m).to_string()).collect()
}

fn default_tolerance_ms() -> i64 {
    DEFAULT_TOLERANCE_MS
}

fn default_mutating() -> DefaultBehavior {
    DefaultBehavior::Fail
}

fn default_read_only() -> DefaultBehavior {
    DefaultBehavior::Pass
}

impl PreconditionConfig {
    /// Load configuration from a file path, a standard location, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).or_else(find_config_file);

        let mut config = match config_path {
            Some(ref p) => load_config_file(p)?,
            None => Self::default(),
        };
        config.path = config_path;
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| PreconditionError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if let Some(blank) = self.read_only_methods.iter().position(|m| m.trim().is_empty()) {
            return Err(PreconditionError::config(format!(
                "read_only_methods[{}] must not be blank",
                blank
            )));
        }
        if self.timestamp_tolerance_ms <= 0 {
            return Err(PreconditionError::config(
                "timestamp_tolerance_ms must be positive",
            ));
        }
        Ok(())
    }

    /// Build the method classifier this configuration describes
    pub fn classifier(&self) -> MethodClassifier {
        MethodClassifier::new(&self.read_only_methods)
            .with_mutating_default(self.mutating_default)
            .with_read_only_default(self.read_only_default)
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<PreconditionConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PreconditionError::config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    toml::from_str(&content).map_err(|e| {
        PreconditionError::config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

//! Executor configuration
//!
//! Loaded from a JSON file like the rest of the database configuration.
//! Missing fields take their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{ExecutorError, ExecutorResult};

fn default_yield_enabled() -> bool {
    true
}

fn default_yield_period_works() -> u64 {
    128
}

/// Configuration for a `PlanExecutor`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Whether the executor yields on its own
    #[serde(default = "default_yield_enabled")]
    pub yield_enabled: bool,

    /// Number of works between automatic yields. Must be positive.
    #[serde(default = "default_yield_period_works")]
    pub yield_period_works: u64,

    /// When true, `IsEof` only means "nothing new yet"
    #[serde(default)]
    pub tailable: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            yield_enabled: default_yield_enabled(),
            yield_period_works: default_yield_period_works(),
            tailable: false,
        }
    }
}

impl ExecutorConfig {
    /// Configuration that never yields automatically
    pub fn without_yielding() -> Self {
        Self {
            yield_enabled: false,
            ..Self::default()
        }
    }

    /// Parses and validates a JSON configuration string
    pub fn from_json(text: &str) -> ExecutorResult<Self> {
        let config: ExecutorConfig =
            serde_json::from_str(text).map_err(|e| ExecutorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file
    pub fn load(path: impl AsRef<Path>) -> ExecutorResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Rejects configurations the executor cannot run with
    pub fn validate(&self) -> ExecutorResult<()> {
        if self.yield_period_works == 0 {
            return Err(ExecutorError::Config(
                "yield_period_works must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

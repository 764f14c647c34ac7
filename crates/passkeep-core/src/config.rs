//! Tunables for the pool and the quality estimator.
//!
//! All structs deserialize with `#[serde(default)]`, so a host application can
//! store a partial JSON object and get sensible values for everything else.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default wall-clock budget for one strength estimate.
pub const DEFAULT_TIME_BUDGET_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Search budget in milliseconds. Zero means "return the fallback cover".
    pub time_budget_ms: u64,
    /// Passwords longer than this are estimated on their first
    /// `max_password_len` characters. `None` disables the cap.
    pub max_password_len: Option<usize>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: DEFAULT_TIME_BUDGET_MS,
            max_password_len: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Fold an [`EnvironmentSnapshot`](crate::environment::EnvironmentSnapshot)
    /// into new pools.
    pub seed_environment: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            seed_environment: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub estimator: EstimatorConfig,
    pub pool: PoolConfig,
}

impl CoreConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::invalid(format!("config: {e}")))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::InternalInvariantViolation(format!("config encoding: {e}")))
    }
}

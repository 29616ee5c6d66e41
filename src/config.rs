//! Engine-wide configuration options.

use serde::{Deserialize, Serialize};

fn default_failure_threshold() -> i64 {
    10
}

fn default_short_life_millis() -> i64 {
    60_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmConfig {
    /// Cumulative per-role failure count triggering fatal teardown.
    #[serde(default = "default_failure_threshold")]
    pub container_failure_threshold: i64,
    /// Milliseconds; below this a start-to-crash is also counted as
    /// `start_failed`.
    #[serde(default = "default_short_life_millis")]
    pub container_failure_short_life_millis: i64,
}

impl Default for AmConfig {
    fn default() -> Self {
        Self {
            container_failure_threshold: default_failure_threshold(),
            container_failure_short_life_millis: default_short_life_millis(),
        }
    }
}

impl AmConfig {
    pub fn from_yaml_str(s: &str) -> crate::error::Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }
}

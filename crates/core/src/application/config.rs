// Pending queue configuration
//
// Read once at construction; no hot reload.

use crate::application::retry::RetryConfig;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default backpressure bound per key
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Default delay before the scheduling agent is asked to look at a key again
/// after a pop failed
pub const DEFAULT_POP_FAILURE_REDELIVERY_MS: u64 = 5000;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://pending-queue.db";

/// Queue implementation selectable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    Sqlite,
    /// Migration adapter over two of the others
    Dual,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::Sqlite => "sqlite",
            BackendKind::Dual => "dual",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "sqlite" => Ok(BackendKind::Sqlite),
            "dual" => Ok(BackendKind::Dual),
            other => Err(AppError::Config(format!(
                "unknown queue implementation '{}' (expected memory, sqlite or dual)",
                other
            ))),
        }
    }
}

/// Delegates of the migration adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DualConfig {
    /// Drained first; never written to
    pub previous: BackendKind,
    /// Receives every new entry
    pub primary: BackendKind,
}

impl Default for DualConfig {
    fn default() -> Self {
        Self {
            previous: BackendKind::Memory,
            primary: BackendKind::Sqlite,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub implementation: BackendKind,
    pub dual: DualConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            implementation: BackendKind::Sqlite,
            dual: DualConfig::default(),
        }
    }
}

/// Everything the queue reads from its host's configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PendingQueueConfig {
    /// Backpressure bound per key (approximate under concurrent enqueues)
    pub max_depth: usize,
    /// Partition label of this instance; `None` serves unsharded entries only
    pub shard: Option<String>,
    pub retry: RetryConfig,
    pub pop_failure_redelivery_ms: u64,
    pub backend: BackendConfig,
    pub database_url: String,
}

impl Default for PendingQueueConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            shard: None,
            retry: RetryConfig::default(),
            pop_failure_redelivery_ms: DEFAULT_POP_FAILURE_REDELIVERY_MS,
            backend: BackendConfig::default(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

impl PendingQueueConfig {
    pub fn pop_failure_redelivery(&self) -> Duration {
        Duration::from_millis(self.pop_failure_redelivery_ms)
    }

    /// Reject configurations that cannot be wired
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(AppError::Config(
                "max_depth must be at least 1".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(AppError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        if let Some(shard) = &self.shard {
            if shard.trim().is_empty() {
                return Err(AppError::Config(
                    "shard must not be blank (omit it for an unsharded instance)".to_string(),
                ));
            }
        }

        if self.backend.implementation == BackendKind::Dual {
            let dual = &self.backend.dual;
            if dual.previous == BackendKind::Dual || dual.primary == BackendKind::Dual {
                return Err(AppError::Config(
                    "dual delegates must be concrete implementations".to_string(),
                ));
            }
            if dual.previous == dual.primary {
                return Err(AppError::Config(format!(
                    "dual previous and primary are both '{}'",
                    dual.primary
                )));
            }
        }

        Ok(())
    }
}

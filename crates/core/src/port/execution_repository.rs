// Execution Repository Port (owned by the orchestration engine)

use crate::domain::ExecutionId;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution status as far as admission control cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    NotStarted,
    Running,
    Succeeded,
    Terminal,
    Canceled,
}

impl ExecutionStatus {
    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Succeeded | ExecutionStatus::Terminal | ExecutionStatus::Canceled
        )
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NOT_STARTED" => Some(ExecutionStatus::NotStarted),
            "RUNNING" => Some(ExecutionStatus::Running),
            "SUCCEEDED" => Some(ExecutionStatus::Succeeded),
            "TERMINAL" => Some(ExecutionStatus::Terminal),
            "CANCELED" => Some(ExecutionStatus::Canceled),
            _ => None,
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::NotStarted => write!(f, "NOT_STARTED"),
            ExecutionStatus::Running => write!(f, "RUNNING"),
            ExecutionStatus::Succeeded => write!(f, "SUCCEEDED"),
            ExecutionStatus::Terminal => write!(f, "TERMINAL"),
            ExecutionStatus::Canceled => write!(f, "CANCELED"),
        }
    }
}

/// The slice of an execution the queue reads before canceling it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub id: ExecutionId,
    pub status: ExecutionStatus,
    pub cancellation_reason: Option<String>,
}

/// Repository interface for pipeline executions
#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    /// Fetch an execution before mutating it
    async fn retrieve(&self, id: &ExecutionId) -> Result<Option<ExecutionSummary>>;

    /// Mark an execution canceled with a reason
    async fn cancel(&self, id: &ExecutionId, reason: &str) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// In-memory execution repository that records cancellations
    #[derive(Default)]
    pub struct MockExecutionRepository {
        executions: Mutex<HashMap<ExecutionId, ExecutionSummary>>,
        cancels: Mutex<Vec<(ExecutionId, String)>>,
        fail_cancel: Mutex<bool>,
    }

    impl MockExecutionRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_execution(self, id: impl Into<ExecutionId>) -> Self {
            self.insert_not_started(id);
            self
        }

        /// Seed a NOT_STARTED execution
        pub fn insert_not_started(&self, id: impl Into<ExecutionId>) {
            self.insert_with_status(id, ExecutionStatus::NotStarted);
        }

        pub fn insert_with_status(&self, id: impl Into<ExecutionId>, status: ExecutionStatus) {
            let id = id.into();
            self.executions.lock().insert(
                id.clone(),
                ExecutionSummary {
                    id,
                    status,
                    cancellation_reason: None,
                },
            );
        }

        /// Make every subsequent cancel fail with a database error
        pub fn set_fail_cancel(&self, fail: bool) {
            *self.fail_cancel.lock() = fail;
        }

        pub fn cancels(&self) -> Vec<(ExecutionId, String)> {
            self.cancels.lock().clone()
        }

        pub fn status_of(&self, id: &ExecutionId) -> Option<ExecutionStatus> {
            self.executions.lock().get(id).map(|e| e.status)
        }
    }

    #[async_trait]
    impl ExecutionRepository for MockExecutionRepository {
        async fn retrieve(&self, id: &ExecutionId) -> Result<Option<ExecutionSummary>> {
            Ok(self.executions.lock().get(id).cloned())
        }

        async fn cancel(&self, id: &ExecutionId, reason: &str) -> Result<()> {
            if *self.fail_cancel.lock() {
                return Err(AppError::Database("cancel failed".to_string()));
            }
            let mut executions = self.executions.lock();
            let execution = executions
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound(format!("Execution {} not found", id)))?;
            execution.status = ExecutionStatus::Canceled;
            execution.cancellation_reason = Some(reason.to_string());
            self.cancels.lock().push((id.clone(), reason.to_string()));
            Ok(())
        }
    }
}

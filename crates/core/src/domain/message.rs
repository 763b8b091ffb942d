// Queue Message Domain Model

use super::key::{ExecutionId, PipelineConfigKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Command payload held by the pending queue
///
/// Only `StartExecution` carries execution identity. The other kinds are
/// advisory: the orchestration engine can regenerate them, so losing one
/// under backpressure is acceptable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// Start a specific execution that is waiting for its turn
    StartExecution { execution_id: ExecutionId },

    /// Ask the scheduling agent to look at a key again
    StartWaitingExecutions {
        pipeline_config_id: PipelineConfigKey,
        #[serde(default)]
        purge_queue: bool,
    },

    /// Any other advisory signal; attributes are opaque to the queue
    Advisory {
        name: String,
        #[serde(default)]
        attributes: serde_json::Value,
    },
}

impl Message {
    pub fn start_execution(execution_id: impl Into<ExecutionId>) -> Self {
        Message::StartExecution {
            execution_id: execution_id.into(),
        }
    }

    pub fn start_waiting(pipeline_config_id: PipelineConfigKey, purge_queue: bool) -> Self {
        Message::StartWaitingExecutions {
            pipeline_config_id,
            purge_queue,
        }
    }

    pub fn advisory(name: impl Into<String>) -> Self {
        Message::Advisory {
            name: name.into(),
            attributes: serde_json::Value::Null,
        }
    }

    /// Execution targeted by this message, if any
    pub fn execution_id(&self) -> Option<&ExecutionId> {
        match self {
            Message::StartExecution { execution_id } => Some(execution_id),
            _ => None,
        }
    }

    pub fn is_start_execution(&self) -> bool {
        matches!(self, Message::StartExecution { .. })
    }

    /// Discriminator as written to the `kind` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Message::StartExecution { .. } => "start_execution",
            Message::StartWaitingExecutions { .. } => "start_waiting_executions",
            Message::Advisory { .. } => "advisory",
        }
    }
}

/// Why the queue canceled an execution
///
/// The rendered text is recorded on the execution and must stay distinct
/// from user- or policy-driven cancellations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    QueueSaturated { max_depth: usize },
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::QueueSaturated { max_depth } => write!(
                f,
                "Pending execution queue saturated (max depth {})",
                max_depth
            ),
        }
    }
}

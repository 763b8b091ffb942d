// Admission control (backpressure) shared by every queue implementation

use crate::domain::{CancelReason, Message, PipelineConfigKey};
use crate::error::Result;
use crate::port::{ExecutionRepository, QueueEvent, QueueMetrics};
use std::sync::Arc;
use tracing::{debug, warn};

/// Decides what happens to a message once a key's depth is known
///
/// Load is shed by outcome, not by space: a saturated key never grows,
/// and a rejected start request fails its execution explicitly instead of
/// leaving it NOT_STARTED with no queued work behind it.
pub struct Admission {
    max_depth: usize,
    execution_repository: Arc<dyn ExecutionRepository>,
    metrics: Arc<dyn QueueMetrics>,
}

impl Admission {
    pub fn new(
        max_depth: usize,
        execution_repository: Arc<dyn ExecutionRepository>,
        metrics: Arc<dyn QueueMetrics>,
    ) -> Self {
        Self {
            max_depth,
            execution_repository,
            metrics,
        }
    }

    pub fn is_saturated(&self, depth: usize) -> bool {
        depth >= self.max_depth
    }

    /// Record a message that was committed to a backend
    pub fn admitted(&self, backend: &str, key: &PipelineConfigKey, message: &Message) {
        self.metrics.record(QueueEvent::Enqueued);
        debug!(
            backend = backend,
            key = %key,
            kind = message.kind(),
            "Message enqueued"
        );
    }

    /// Shed a message for a saturated key
    ///
    /// # Errors
    /// Propagates execution repository failures: a start request that was
    /// neither queued nor canceled must be visible to the caller.
    pub async fn reject(&self, backend: &str, key: &PipelineConfigKey, message: Message) -> Result<()> {
        let Some(execution_id) = message.execution_id() else {
            self.metrics.record(QueueEvent::DroppedOnSaturation);
            warn!(
                backend = backend,
                key = %key,
                kind = message.kind(),
                max_depth = self.max_depth,
                "Pending queue saturated, dropping advisory message"
            );
            return Ok(());
        };

        let Some(execution) = self.execution_repository.retrieve(execution_id).await? else {
            self.metrics.record(QueueEvent::DroppedOnSaturation);
            warn!(
                backend = backend,
                key = %key,
                execution_id = %execution_id,
                "Pending queue saturated and execution no longer exists, dropping"
            );
            return Ok(());
        };

        // A finished execution keeps its outcome; there is nothing to cancel
        if execution.status.is_complete() {
            self.metrics.record(QueueEvent::DroppedOnSaturation);
            warn!(
                backend = backend,
                key = %key,
                execution_id = %execution.id,
                status = %execution.status,
                "Pending queue saturated and execution already finished, dropping"
            );
            return Ok(());
        }

        let reason = CancelReason::QueueSaturated {
            max_depth: self.max_depth,
        };
        self.execution_repository
            .cancel(&execution.id, &reason.to_string())
            .await?;
        self.metrics.record(QueueEvent::CanceledOnSaturation);

        warn!(
            backend = backend,
            key = %key,
            execution_id = %execution.id,
            max_depth = self.max_depth,
            "Pending queue saturated, canceled execution"
        );
        Ok(())
    }
}

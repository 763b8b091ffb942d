// Migration adapter: drain `previous`, write `primary`

use crate::domain::{Message, PipelineConfigKey};
use crate::error::Result;
use crate::port::{PendingExecutionQueue, QueueEvent, QueueMetrics};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

pub const BACKEND_NAME: &str = "dual";

/// Composes two queue backends so one can replace the other without a
/// flag-day cutover
///
/// New entries only ever reach `primary`. Pops consult `previous` first, so
/// entries left in the old backend are served before newer ones and the old
/// backend drains to zero. The `ServedFromPrevious` counter tells operators
/// when it is safe to decommission it.
///
/// Admission control runs inside `primary` against `primary`'s own depth.
pub struct DualPendingQueue {
    previous: Arc<dyn PendingExecutionQueue>,
    primary: Arc<dyn PendingExecutionQueue>,
    metrics: Arc<dyn QueueMetrics>,
}

impl DualPendingQueue {
    pub fn new(
        previous: Arc<dyn PendingExecutionQueue>,
        primary: Arc<dyn PendingExecutionQueue>,
        metrics: Arc<dyn QueueMetrics>,
    ) -> Self {
        info!(
            previous = previous.name(),
            primary = primary.name(),
            "Pending queue migration adapter enabled"
        );
        Self {
            previous,
            primary,
            metrics,
        }
    }

    fn served_from_previous(&self, key: &PipelineConfigKey, message: &Message) {
        self.metrics.record(QueueEvent::ServedFromPrevious);
        debug!(
            key = %key,
            kind = message.kind(),
            previous = self.previous.name(),
            "Served pending message from previous backend"
        );
    }
}

#[async_trait]
impl PendingExecutionQueue for DualPendingQueue {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn enqueue(&self, key: &PipelineConfigKey, message: Message) -> Result<()> {
        self.primary.enqueue(key, message).await
    }

    async fn pop_oldest(&self, key: &PipelineConfigKey) -> Result<Option<Message>> {
        if let Some(message) = self.previous.pop_oldest(key).await? {
            self.served_from_previous(key, &message);
            return Ok(Some(message));
        }
        self.primary.pop_oldest(key).await
    }

    async fn pop_newest(&self, key: &PipelineConfigKey) -> Result<Option<Message>> {
        if let Some(message) = self.previous.pop_newest(key).await? {
            self.served_from_previous(key, &message);
            return Ok(Some(message));
        }
        self.primary.pop_newest(key).await
    }

    async fn depth(&self, key: &PipelineConfigKey) -> Result<usize> {
        let previous = self.previous.depth(key).await?;
        let primary = self.primary.depth(key).await?;
        Ok(previous + primary)
    }
}

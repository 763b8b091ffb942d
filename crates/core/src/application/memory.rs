// In-memory pending queue (single process, no persistence)

use crate::application::admission::Admission;
use crate::domain::{Message, PipelineConfigKey};
use crate::error::Result;
use crate::port::{PendingExecutionQueue, QueueEvent, QueueMetrics};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

pub const BACKEND_NAME: &str = "memory";

/// Per-key double-ended list guarded by one process-wide lock
///
/// Depth is exact and the bound is enforced under the same lock as the
/// insert, so this backend never exceeds `max_depth`.
pub struct InMemoryPendingQueue {
    queues: Mutex<HashMap<PipelineConfigKey, VecDeque<Message>>>,
    admission: Arc<Admission>,
    metrics: Arc<dyn QueueMetrics>,
}

impl InMemoryPendingQueue {
    pub fn new(admission: Arc<Admission>, metrics: Arc<dyn QueueMetrics>) -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            admission,
            metrics,
        }
    }

    fn pop(&self, key: &PipelineConfigKey, newest: bool) -> Option<Message> {
        let mut queues = self.queues.lock();
        let queue = queues.get_mut(key)?;
        let message = if newest {
            queue.pop_back()
        } else {
            queue.pop_front()
        };
        if queue.is_empty() {
            queues.remove(key);
        }
        if message.is_some() {
            self.metrics.record(QueueEvent::Popped);
        }
        message
    }
}

#[async_trait]
impl PendingExecutionQueue for InMemoryPendingQueue {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn enqueue(&self, key: &PipelineConfigKey, message: Message) -> Result<()> {
        // The lock is released before any repository call in `reject`
        let rejected = {
            let mut queues = self.queues.lock();
            let queue = queues.entry(key.clone()).or_default();
            if self.admission.is_saturated(queue.len()) {
                Some(message)
            } else {
                self.admission.admitted(BACKEND_NAME, key, &message);
                queue.push_back(message);
                None
            }
        };

        match rejected {
            Some(message) => self.admission.reject(BACKEND_NAME, key, message).await,
            None => Ok(()),
        }
    }

    async fn pop_oldest(&self, key: &PipelineConfigKey) -> Result<Option<Message>> {
        Ok(self.pop(key, false))
    }

    async fn pop_newest(&self, key: &PipelineConfigKey) -> Result<Option<Message>> {
        Ok(self.pop(key, true))
    }

    async fn depth(&self, key: &PipelineConfigKey) -> Result<usize> {
        Ok(self.queues.lock().get(key).map_or(0, VecDeque::len))
    }
}

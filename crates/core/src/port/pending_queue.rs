// Pending Execution Queue Port (Interface)

use crate::domain::{Message, PipelineConfigKey};
use crate::error::Result;
use async_trait::async_trait;

/// Per-key queue of start requests waiting for the running execution to finish
///
/// Implementations: in-memory, SQLite-backed, and the dual (migration) adapter.
/// Every operation is scoped to one pipeline configuration key; there is no
/// ordering or fairness across keys.
#[async_trait]
pub trait PendingExecutionQueue: Send + Sync {
    /// Backend label used in logs and metrics
    fn name(&self) -> &'static str;

    /// Admit a message, or shed it when the key is saturated
    ///
    /// Saturation is not an error: a `StartExecution` is canceled in the
    /// execution repository, any other kind is dropped.
    async fn enqueue(&self, key: &PipelineConfigKey, message: Message) -> Result<()>;

    /// Remove and return the earliest-enqueued message (FIFO)
    async fn pop_oldest(&self, key: &PipelineConfigKey) -> Result<Option<Message>>;

    /// Remove and return the most recently enqueued message (LIFO)
    ///
    /// Older entries stay in place.
    async fn pop_newest(&self, key: &PipelineConfigKey) -> Result<Option<Message>>;

    /// Drain every message for `key` in FIFO order
    ///
    /// # Returns
    /// Number of messages handed to `callback`
    async fn purge(
        &self,
        key: &PipelineConfigKey,
        callback: &mut (dyn FnMut(Message) + Send),
    ) -> Result<usize> {
        let mut drained = 0;
        while let Some(message) = self.pop_oldest(key).await? {
            callback(message);
            drained += 1;
        }
        Ok(drained)
    }

    /// Current number of pending messages; may be stale under concurrent writers
    async fn depth(&self, key: &PipelineConfigKey) -> Result<usize>;
}

// SQLite PendingExecutionQueue Implementation

use crate::map_sqlx_error;
use async_trait::async_trait;
use pending_core::application::{Admission, PendingQueueConfig, RetryPolicy};
use pending_core::domain::{Message, PendingEntry, PipelineConfigKey};
use pending_core::error::Result;
use pending_core::port::{
    IdProvider, PendingExecutionQueue, QueueEvent, QueueMetrics, TimeProvider, WorkQueue,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

pub const BACKEND_NAME: &str = "sqlite";

// `shard IS ?` matches NULL when bound to NULL, so one statement serves
// sharded and unsharded instances alike.

const POP_OLDEST_SQL: &str = r#"
    DELETE FROM pending_executions
    WHERE pipeline_config_id = ? AND id = (
        SELECT id FROM pending_executions
        WHERE pipeline_config_id = ? AND shard IS ?
        ORDER BY id ASC
        LIMIT 1
    )
    RETURNING id, message
"#;

const POP_NEWEST_SQL: &str = r#"
    DELETE FROM pending_executions
    WHERE pipeline_config_id = ? AND id = (
        SELECT id FROM pending_executions
        WHERE pipeline_config_id = ? AND shard IS ?
        ORDER BY id DESC
        LIMIT 1
    )
    RETURNING id, message
"#;

#[derive(Debug, Clone, Copy)]
enum PopOrder {
    Oldest,
    Newest,
}

impl PopOrder {
    fn sql(self) -> &'static str {
        match self {
            PopOrder::Oldest => POP_OLDEST_SQL,
            PopOrder::Newest => POP_NEWEST_SQL,
        }
    }

    fn operation(self) -> &'static str {
        match self {
            PopOrder::Oldest => "pending.pop_oldest",
            PopOrder::Newest => "pending.pop_newest",
        }
    }
}

/// Row handed back by the delete
#[derive(Debug, sqlx::FromRow)]
struct PoppedRow {
    id: String,
    message: String,
}

/// Durable, multi-instance-safe pending queue
///
/// Instances sharing one database file coordinate only through SQLite's
/// transactional locking. A pop is a single `DELETE ... RETURNING` inside
/// one transaction: the row is chosen, locked and removed as one unit, so
/// two concurrent pops never receive the same entry.
pub struct SqlitePendingQueue {
    pool: SqlitePool,
    shard: Option<String>,
    admission: Arc<Admission>,
    work_queue: Arc<dyn WorkQueue>,
    metrics: Arc<dyn QueueMetrics>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    retry: RetryPolicy,
    pop_failure_redelivery: Duration,
}

impl SqlitePendingQueue {
    pub fn new(
        pool: SqlitePool,
        admission: Arc<Admission>,
        work_queue: Arc<dyn WorkQueue>,
        metrics: Arc<dyn QueueMetrics>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        config: &PendingQueueConfig,
    ) -> Self {
        Self {
            pool,
            shard: config.shard.clone(),
            admission,
            work_queue,
            metrics,
            id_provider,
            time_provider,
            retry: RetryPolicy::new(config.retry.clone()),
            pop_failure_redelivery: config.pop_failure_redelivery(),
        }
    }

    async fn insert_entry(&self, entry: &PendingEntry, payload: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            INSERT INTO pending_executions (id, pipeline_config_id, shard, message, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.key.as_str())
        .bind(entry.shard.as_deref())
        .bind(payload)
        .bind(self.time_provider.now_millis())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Select, lock and delete one row in a single transaction
    async fn delete_one(&self, key: &PipelineConfigKey, order: PopOrder) -> Result<Option<PoppedRow>> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, PoppedRow>(order.sql())
            .bind(key.as_str())
            .bind(key.as_str())
            .bind(self.shard.as_deref())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        // Dropping `tx` without commit rolls the delete back, so a failed
        // commit leaves the entry in place for the retry.
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(row)
    }

    async fn count(&self, key: &PipelineConfigKey) -> Result<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM pending_executions WHERE pipeline_config_id = ? AND shard IS ?",
        )
        .bind(key.as_str())
        .bind(self.shard.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn pop(&self, key: &PipelineConfigKey, order: PopOrder) -> Result<Option<Message>> {
        let popped = self
            .retry
            .run(order.operation(), move || async move {
                self.delete_one(key, order).await
            })
            .await;

        let row = match popped {
            Ok(Some(row)) => row,
            Ok(None) => return Ok(None),
            Err(e) => {
                error!(
                    key = %key,
                    shard = ?self.shard,
                    error = %e,
                    "Failed to pop pending message"
                );
                self.signal_retry(key).await;
                return Ok(None);
            }
        };

        match serde_json::from_str::<Message>(&row.message) {
            Ok(message) => {
                self.metrics.record(QueueEvent::Popped);
                debug!(
                    key = %key,
                    entry_id = %row.id,
                    kind = message.kind(),
                    "Popped pending message"
                );
                Ok(Some(message))
            }
            Err(e) => {
                // The row is already gone; it could never have been served
                error!(
                    key = %key,
                    entry_id = %row.id,
                    error = %e,
                    "Discarded undecodable pending message"
                );
                self.signal_retry(key).await;
                Ok(None)
            }
        }
    }

    /// Ask the scheduling agent to look at `key` again later so entries
    /// behind a failed pop are not stranded
    async fn signal_retry(&self, key: &PipelineConfigKey) {
        self.metrics.record(QueueEvent::PopFailed);

        let signal = Message::start_waiting(key.clone(), false);
        match self.work_queue.push(signal, self.pop_failure_redelivery).await {
            Ok(()) => warn!(
                key = %key,
                delay_ms = self.pop_failure_redelivery.as_millis() as u64,
                "Scheduled pending queue re-check after pop failure"
            ),
            Err(e) => error!(
                key = %key,
                error = %e,
                "Could not schedule pending queue re-check"
            ),
        }
    }
}

#[async_trait]
impl PendingExecutionQueue for SqlitePendingQueue {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn enqueue(&self, key: &PipelineConfigKey, message: Message) -> Result<()> {
        // Not in the insert's transaction: concurrent enqueues may overshoot
        // max_depth by a few entries.
        let depth = self.depth(key).await?;
        if self.admission.is_saturated(depth) {
            return self.admission.reject(BACKEND_NAME, key, message).await;
        }

        let entry = PendingEntry::new(
            self.id_provider.next_id(),
            key.clone(),
            self.shard.clone(),
            message,
        );
        let payload = serde_json::to_string(&entry.message)?;

        let entry_ref = &entry;
        let payload_ref = payload.as_str();
        self.retry
            .run("pending.enqueue", move || async move {
                self.insert_entry(entry_ref, payload_ref).await
            })
            .await?;

        self.admission.admitted(BACKEND_NAME, key, &entry.message);
        debug!(key = %key, entry_id = %entry.id, depth = depth + 1, "Stored pending entry");
        Ok(())
    }

    async fn pop_oldest(&self, key: &PipelineConfigKey) -> Result<Option<Message>> {
        self.pop(key, PopOrder::Oldest).await
    }

    async fn pop_newest(&self, key: &PipelineConfigKey) -> Result<Option<Message>> {
        self.pop(key, PopOrder::Newest).await
    }

    async fn depth(&self, key: &PipelineConfigKey) -> Result<usize> {
        let count = self
            .retry
            .run("pending.depth", move || async move { self.count(key).await })
            .await?;
        Ok(count.max(0) as usize)
    }
}

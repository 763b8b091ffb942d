// SQLite WorkQueue Implementation

use crate::map_sqlx_error;
use async_trait::async_trait;
use pending_core::domain::Message;
use pending_core::error::Result;
use pending_core::port::{IdProvider, TimeProvider, WorkQueue};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A delayed message as stored
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedWork {
    pub id: String,
    pub message: Message,
    /// Epoch ms
    pub deliver_at: i64,
}

/// Delayed-delivery table standing in for the orchestration engine's
/// active work queue
pub struct SqliteWorkQueue {
    pool: SqlitePool,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteWorkQueue {
    pub fn new(
        pool: SqlitePool,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            pool,
            id_provider,
            time_provider,
        }
    }

    /// Messages whose delay has elapsed, oldest delivery time first
    pub async fn list_ready(&self, limit: i64) -> Result<Vec<QueuedWork>> {
        let now = self.time_provider.now_millis();
        let rows: Vec<(String, String, i64)> = sqlx::query_as(
            r#"
            SELECT id, message, deliver_at FROM work_queue
            WHERE deliver_at <= ?
            ORDER BY deliver_at ASC, id ASC
            LIMIT ?
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|(id, message, deliver_at)| -> Result<QueuedWork> {
                Ok(QueuedWork {
                    id,
                    message: serde_json::from_str(&message)?,
                    deliver_at,
                })
            })
            .collect()
    }
}

#[async_trait]
impl WorkQueue for SqliteWorkQueue {
    async fn push(&self, message: Message, delay: Duration) -> Result<()> {
        let id = self.id_provider.next_id();
        let deliver_at = self.time_provider.now_millis() + delay.as_millis() as i64;
        let payload = serde_json::to_string(&message)?;

        sqlx::query("INSERT INTO work_queue (id, message, deliver_at) VALUES (?, ?, ?)")
            .bind(id.to_string())
            .bind(payload)
            .bind(deliver_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        debug!(work_id = %id, kind = message.kind(), deliver_at = deliver_at, "Pushed work message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use pending_core::port::time_provider::FixedTimeProvider;
    use pending_core::port::UlidProvider;

    #[tokio::test]
    async fn test_delayed_message_is_not_ready_yet() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let queue = SqliteWorkQueue::new(
            pool,
            Arc::new(UlidProvider::new()),
            Arc::new(FixedTimeProvider(10_000)),
        );

        queue
            .push(Message::advisory("now"), Duration::ZERO)
            .await
            .unwrap();
        queue
            .push(Message::advisory("later"), Duration::from_secs(5))
            .await
            .unwrap();

        let ready = queue.list_ready(10).await.unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].message, Message::advisory("now"));
        assert_eq!(ready[0].deliver_at, 10_000);
    }
}

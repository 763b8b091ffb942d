// SQLite ExecutionRepository Implementation

use crate::map_sqlx_error;
use async_trait::async_trait;
use pending_core::domain::{ExecutionId, PipelineConfigKey};
use pending_core::error::{AppError, Result};
use pending_core::port::{ExecutionRepository, ExecutionStatus, ExecutionSummary, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

/// Execution status store for hosts without their own repository
pub struct SqliteExecutionRepository {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteExecutionRepository {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    /// Record an execution that is waiting for its turn
    pub async fn insert_not_started(
        &self,
        id: &ExecutionId,
        key: Option<&PipelineConfigKey>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO executions (id, pipeline_config_id, status, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(id.as_str())
        .bind(key.map(|k| k.as_str()))
        .bind(ExecutionStatus::NotStarted.to_string())
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}

#[async_trait]
impl ExecutionRepository for SqliteExecutionRepository {
    async fn retrieve(&self, id: &ExecutionId) -> Result<Option<ExecutionSummary>> {
        let row = sqlx::query_as::<_, ExecutionRow>(
            "SELECT id, status, cancellation_reason FROM executions WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(ExecutionRow::into_summary).transpose()
    }

    async fn cancel(&self, id: &ExecutionId, reason: &str) -> Result<()> {
        // Conditional update: a completed execution keeps its outcome
        let result = sqlx::query(
            r#"
            UPDATE executions
            SET status = ?, cancellation_reason = ?, canceled_at = ?
            WHERE id = ?
              AND status NOT IN ('SUCCEEDED', 'TERMINAL', 'CANCELED')
            "#,
        )
        .bind(ExecutionStatus::Canceled.to_string())
        .bind(reason)
        .bind(self.time_provider.now_millis())
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            match self.retrieve(id).await? {
                None => return Err(AppError::NotFound(format!("Execution {} not found", id))),
                Some(execution) => debug!(
                    execution_id = %id,
                    status = %execution.status,
                    "Execution already complete, cancel ignored"
                ),
            }
        }

        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ExecutionRow {
    id: String,
    status: String,
    cancellation_reason: Option<String>,
}

impl ExecutionRow {
    fn into_summary(self) -> Result<ExecutionSummary> {
        let status = ExecutionStatus::parse(&self.status).ok_or_else(|| {
            AppError::Database(format!(
                "Execution {} has unknown status {}",
                self.id, self.status
            ))
        })?;

        Ok(ExecutionSummary {
            id: ExecutionId::new(self.id),
            status,
            cancellation_reason: self.cancellation_reason,
        })
    }
}

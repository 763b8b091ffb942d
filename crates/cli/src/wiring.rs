//! Composition root: build the configured queue and its collaborators

use anyhow::{Context, Result};
use pending_core::application::{
    Admission, BackendKind, DualPendingQueue, InMemoryPendingQueue, PendingQueueConfig,
};
use pending_core::port::{
    AtomicQueueMetrics, IdProvider, PendingExecutionQueue, SystemTimeProvider, TimeProvider,
    UlidProvider,
};
use pending_core::AppError;
use pending_infra_sqlite::{
    create_pool, run_migrations, SqliteExecutionRepository, SqlitePendingQueue, SqlitePool,
    SqliteWorkQueue,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a subcommand may need
///
/// `work_queue` stands in for the orchestration engine's active work queue
/// and lives in the same database file as the pending queue. A pop that
/// exhausts its retries on a locked database pushes its re-check signal
/// into that same locked file, so the push usually fails too and is only
/// logged. The stand-in gives no protection against lock stalls.
pub struct Wiring {
    pub queue: Arc<dyn PendingExecutionQueue>,
    pub executions: Arc<SqliteExecutionRepository>,
    pub work_queue: Arc<SqliteWorkQueue>,
    pub metrics: Arc<AtomicQueueMetrics>,
}

/// Shared dependencies handed to each backend
struct Deps<'a> {
    config: &'a PendingQueueConfig,
    pool: SqlitePool,
    admission: Arc<Admission>,
    work_queue: Arc<SqliteWorkQueue>,
    metrics: Arc<AtomicQueueMetrics>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

pub async fn build(config: &PendingQueueConfig) -> Result<Wiring> {
    config.validate()?;

    info!(database_url = %config.database_url, "Initializing database...");
    let pool = create_pool(&config.database_url)
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // DI wiring
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let id_provider: Arc<dyn IdProvider> = Arc::new(UlidProvider::new());
    let metrics = Arc::new(AtomicQueueMetrics::new());
    let executions = Arc::new(SqliteExecutionRepository::new(
        pool.clone(),
        time_provider.clone(),
    ));
    let work_queue = Arc::new(SqliteWorkQueue::new(
        pool.clone(),
        id_provider.clone(),
        time_provider.clone(),
    ));
    let admission = Arc::new(Admission::new(
        config.max_depth,
        executions.clone(),
        metrics.clone(),
    ));

    let deps = Deps {
        config,
        pool,
        admission,
        work_queue: work_queue.clone(),
        metrics: metrics.clone(),
        id_provider,
        time_provider,
    };

    let queue: Arc<dyn PendingExecutionQueue> = match config.backend.implementation {
        BackendKind::Dual => {
            let dual = &config.backend.dual;
            let previous = backend(dual.previous, &deps)?;
            let primary = backend(dual.primary, &deps)?;
            Arc::new(DualPendingQueue::new(previous, primary, metrics.clone()))
        }
        kind => backend(kind, &deps)?,
    };

    info!(
        backend = queue.name(),
        max_depth = config.max_depth,
        shard = ?config.shard,
        "Pending queue ready"
    );

    Ok(Wiring {
        queue,
        executions,
        work_queue,
        metrics,
    })
}

fn backend(kind: BackendKind, deps: &Deps<'_>) -> Result<Arc<dyn PendingExecutionQueue>> {
    match kind {
        BackendKind::Memory => {
            warn!("In-memory pending queue does not persist between invocations");
            Ok(Arc::new(InMemoryPendingQueue::new(
                deps.admission.clone(),
                deps.metrics.clone(),
            )))
        }
        BackendKind::Sqlite => Ok(Arc::new(SqlitePendingQueue::new(
            deps.pool.clone(),
            deps.admission.clone(),
            deps.work_queue.clone(),
            deps.metrics.clone(),
            deps.id_provider.clone(),
            deps.time_provider.clone(),
            deps.config,
        ))),
        BackendKind::Dual => Err(AppError::Config(
            "dual cannot be nested inside dual".to_string(),
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pending_core::domain::{Message, PipelineConfigKey};

    fn config_for(dir: &tempfile::TempDir, kind: BackendKind) -> PendingQueueConfig {
        let mut config = PendingQueueConfig {
            database_url: format!("sqlite://{}", dir.path().join("pending.db").display()),
            ..Default::default()
        };
        config.backend.implementation = kind;
        config
    }

    #[tokio::test]
    async fn test_builds_each_backend_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for kind in [BackendKind::Memory, BackendKind::Sqlite, BackendKind::Dual] {
            let wiring = build(&config_for(&dir, kind)).await.unwrap();
            assert_eq!(wiring.queue.name(), kind.as_str());
        }
    }

    #[tokio::test]
    async fn test_sqlite_backend_persists_across_builds() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir, BackendKind::Sqlite);
        let key = PipelineConfigKey::from("cfg");

        {
            let wiring = build(&config).await.unwrap();
            wiring
                .queue
                .enqueue(&key, Message::start_execution("exec-1"))
                .await
                .unwrap();
        }

        let wiring = build(&config).await.unwrap();
        assert_eq!(wiring.queue.depth(&key).await.unwrap(), 1);
        assert_eq!(
            wiring.queue.pop_oldest(&key).await.unwrap(),
            Some(Message::start_execution("exec-1"))
        );
    }
}

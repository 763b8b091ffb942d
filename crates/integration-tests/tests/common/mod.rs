//! Shared fixtures: a file-backed database and queues wired against it

#![allow(dead_code)]

use pending_core::application::{
    Admission, InMemoryPendingQueue, PendingQueueConfig, RetryConfig,
};
use pending_core::port::{
    AtomicQueueMetrics, PendingExecutionQueue, SystemTimeProvider, UlidProvider, WorkQueue,
};
use pending_infra_sqlite::{
    create_pool, run_migrations, SqliteExecutionRepository, SqlitePendingQueue, SqlitePool,
    SqliteWorkQueue,
};
use std::sync::Arc;
use tempfile::TempDir;

pub struct Fixture {
    // Keeps the database file alive for the test's duration
    _dir: TempDir,
    pub url: String,
    pub pool: SqlitePool,
    pub executions: Arc<SqliteExecutionRepository>,
    pub work_queue: Arc<SqliteWorkQueue>,
    pub metrics: Arc<AtomicQueueMetrics>,
}

impl Fixture {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("pending.db").display());
        let pool = create_pool(&url).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let time_provider = Arc::new(SystemTimeProvider);
        Self {
            _dir: dir,
            url,
            executions: Arc::new(SqliteExecutionRepository::new(
                pool.clone(),
                time_provider.clone(),
            )),
            work_queue: Arc::new(SqliteWorkQueue::new(
                pool.clone(),
                Arc::new(UlidProvider::new()),
                time_provider,
            )),
            metrics: Arc::new(AtomicQueueMetrics::new()),
            pool,
        }
    }

    pub fn config(max_depth: usize) -> PendingQueueConfig {
        PendingQueueConfig {
            max_depth,
            retry: RetryConfig {
                max_attempts: 5,
                base_delay_ms: 5,
                backoff_factor: 2.0,
                max_delay_ms: 50,
            },
            pop_failure_redelivery_ms: 1000,
            ..Default::default()
        }
    }

    pub fn admission(&self, max_depth: usize) -> Arc<Admission> {
        Arc::new(Admission::new(
            max_depth,
            self.executions.clone(),
            self.metrics.clone(),
        ))
    }

    pub fn memory_queue(&self, max_depth: usize) -> InMemoryPendingQueue {
        InMemoryPendingQueue::new(self.admission(max_depth), self.metrics.clone())
    }

    /// Durable queue on its own pool, as a separate process would have
    pub async fn sqlite_queue(&self, config: &PendingQueueConfig) -> SqlitePendingQueue {
        self.sqlite_queue_signaling(config, self.work_queue.clone())
            .await
    }

    /// Durable queue whose pop-failure signals go to `work_queue`
    pub async fn sqlite_queue_signaling(
        &self,
        config: &PendingQueueConfig,
        work_queue: Arc<dyn WorkQueue>,
    ) -> SqlitePendingQueue {
        let pool = create_pool(&self.url).await.unwrap();
        SqlitePendingQueue::new(
            pool,
            self.admission(config.max_depth),
            work_queue,
            self.metrics.clone(),
            Arc::new(UlidProvider::new()),
            Arc::new(SystemTimeProvider),
            config,
        )
    }

    /// Both implementations, for properties every backend must hold
    pub async fn backends(&self, max_depth: usize) -> Vec<Arc<dyn PendingExecutionQueue>> {
        vec![
            Arc::new(self.memory_queue(max_depth)),
            Arc::new(self.sqlite_queue(&Self::config(max_depth)).await),
        ]
    }
}

/// Work queue in a database of its own, so it stays writable while the
/// queue database is locked
pub async fn separate_work_queue() -> (TempDir, Arc<SqliteWorkQueue>) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("signals.db").display());
    let pool = create_pool(&url).await.unwrap();
    run_migrations(&pool).await.unwrap();
    let work_queue = Arc::new(SqliteWorkQueue::new(
        pool,
        Arc::new(UlidProvider::new()),
        Arc::new(SystemTimeProvider),
    ));
    (dir, work_queue)
}

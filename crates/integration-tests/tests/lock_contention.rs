//! Lock contention on a shared database file: SQLITE_BUSY is transient,
//! retried, and only re-signals once retries run out

mod common;

use common::{separate_work_queue, Fixture};
use pending_core::domain::{Message, PipelineConfigKey};
use pending_core::port::PendingExecutionQueue;
use pending_core::AppError;
use pending_infra_sqlite::{create_pool, map_sqlx_error, SqlitePool};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Connection, Sqlite};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outlasts the pool's 5s busy timeout, so the first attempt gives up
const HOLD: Duration = Duration::from_secs(6);

/// Another process holding the database write lock
async fn hold_write_lock(url: &str) -> (SqlitePool, PoolConnection<Sqlite>) {
    let pool = create_pool(url).await.unwrap();
    let mut conn = pool.acquire().await.unwrap();
    sqlx::query("BEGIN IMMEDIATE")
        .execute(&mut *conn)
        .await
        .unwrap();
    (pool, conn)
}

async fn release(mut conn: PoolConnection<Sqlite>) {
    sqlx::query("ROLLBACK").execute(&mut *conn).await.unwrap();
}

#[tokio::test]
async fn test_busy_database_maps_to_transient() {
    let fx = Fixture::new().await;
    let (_blocker, lock) = hold_write_lock(&fx.url).await;

    let options = SqliteConnectOptions::from_str(&fx.url)
        .unwrap()
        .busy_timeout(Duration::ZERO);
    let mut impatient = SqliteConnection::connect_with(&options).await.unwrap();

    let err = sqlx::query("DELETE FROM pending_executions")
        .execute(&mut impatient)
        .await
        .unwrap_err();
    let mapped = map_sqlx_error(err);

    assert!(mapped.is_transient(), "unexpected error: {}", mapped);
    assert!(matches!(mapped, AppError::Transient(_)));

    release(lock).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pop_retries_through_a_held_lock() {
    let fx = Fixture::new().await;
    let key = PipelineConfigKey::from("contended");
    let queue = Arc::new(fx.sqlite_queue(&Fixture::config(10)).await);
    queue.enqueue(&key, Message::advisory("a")).await.unwrap();

    let (_blocker, lock) = hold_write_lock(&fx.url).await;

    let started = Instant::now();
    let pop = {
        let queue = queue.clone();
        let key = key.clone();
        tokio::spawn(async move { queue.pop_oldest(&key).await })
    };

    tokio::time::sleep(HOLD).await;
    release(lock).await;

    let popped = pop.await.unwrap().unwrap();
    assert_eq!(popped, Some(Message::advisory("a")));
    assert!(started.elapsed() >= HOLD);

    let stats = fx.metrics.snapshot();
    assert_eq!(stats.pop_failed, 0);
    assert_eq!(stats.popped, 1);
    assert!(fx.work_queue.list_ready(10).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_exhausted_retries_signal_and_keep_the_entry() {
    let fx = Fixture::new().await;
    let key = PipelineConfigKey::from("stalled");
    let (_signals_dir, signals) = separate_work_queue().await;

    let mut config = Fixture::config(10);
    config.retry.max_attempts = 1;
    config.pop_failure_redelivery_ms = 0;
    let queue = fx.sqlite_queue_signaling(&config, signals.clone()).await;
    queue.enqueue(&key, Message::advisory("a")).await.unwrap();

    let (_blocker, lock) = hold_write_lock(&fx.url).await;

    // Gives up after one busy timeout
    assert!(queue.pop_oldest(&key).await.unwrap().is_none());
    assert_eq!(fx.metrics.snapshot().pop_failed, 1);

    let ready = signals.list_ready(10).await.unwrap();
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].message, Message::start_waiting(key.clone(), false));
    assert_eq!(ready[0].message.kind(), "start_waiting_executions");

    release(lock).await;

    assert_eq!(
        queue.pop_oldest(&key).await.unwrap(),
        Some(Message::advisory("a"))
    );
}

// Pending Infrastructure - SQLite Adapter
// Implements: PendingExecutionQueue (durable), ExecutionRepository, WorkQueue

mod connection;
mod error;
mod execution_repository;
mod migration;
mod pending_queue;
mod work_queue;

pub use connection::create_pool;
pub use error::map_sqlx_error;
pub use execution_repository::SqliteExecutionRepository;
pub use migration::run_migrations;
pub use pending_queue::{SqlitePendingQueue, BACKEND_NAME};
pub use work_queue::{QueuedWork, SqliteWorkQueue};

// Hosts wire the pool without depending on sqlx directly
pub use sqlx::SqlitePool;

// Note: sqlx::Error conversion is handled by `map_sqlx_error`
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)

// Port Layer - Interfaces for the queue and its external collaborators

pub mod execution_repository;
pub mod id_provider; // Deterministic ordering ids
pub mod metrics;
pub mod pending_queue;
pub mod time_provider;
pub mod work_queue;

// Re-exports
pub use execution_repository::{ExecutionRepository, ExecutionStatus, ExecutionSummary};
pub use id_provider::{IdProvider, UlidProvider};
pub use metrics::{AtomicQueueMetrics, MetricsSnapshot, QueueEvent, QueueMetrics};
pub use pending_queue::PendingExecutionQueue;
pub use time_provider::{SystemTimeProvider, TimeProvider};
pub use work_queue::WorkQueue;

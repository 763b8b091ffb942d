// Application Layer - Admission control, queue implementations and policies

pub mod admission;
pub mod config;
pub mod dual;
pub mod memory;
pub mod retry;

// Re-exports
pub use admission::Admission;
pub use config::{BackendConfig, BackendKind, DualConfig, PendingQueueConfig};
pub use dual::DualPendingQueue;
pub use memory::InMemoryPendingQueue;
pub use retry::{RetryConfig, RetryPolicy};

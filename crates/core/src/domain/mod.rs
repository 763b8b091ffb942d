// Domain Layer - Pending entries, messages and their identities

pub mod entry;
pub mod error;
pub mod key;
pub mod message;

// Re-exports
pub use entry::{EntryId, PendingEntry};
pub use error::DomainError;
pub use key::{ExecutionId, PipelineConfigKey};
pub use message::{CancelReason, Message};

// Active Work Queue Port (owned by the orchestration engine)

use crate::domain::Message;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Queue that dispatches runnable messages to workers
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Deliver `message` no earlier than `delay` from now
    async fn push(&self, message: Message, delay: Duration) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use parking_lot::Mutex;

    /// Records every push; can be told to fail
    #[derive(Default)]
    pub struct MockWorkQueue {
        pushed: Mutex<Vec<(Message, Duration)>>,
        fail: Mutex<bool>,
    }

    impl MockWorkQueue {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_fail(&self, fail: bool) {
            *self.fail.lock() = fail;
        }

        pub fn pushed(&self) -> Vec<(Message, Duration)> {
            self.pushed.lock().clone()
        }
    }

    #[async_trait]
    impl WorkQueue for MockWorkQueue {
        async fn push(&self, message: Message, delay: Duration) -> Result<()> {
            if *self.fail.lock() {
                return Err(AppError::Transient("work queue unavailable".to_string()));
            }
            self.pushed.lock().push((message, delay));
            Ok(())
        }
    }
}

// ID Provider Port (ordering ids for pending entries)

use crate::domain::EntryId;
use parking_lot::Mutex;
use std::time::SystemTime;
use ulid::{Generator, Ulid};

/// ID provider interface (allows deterministic IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate an id that sorts after every id previously returned
    fn next_id(&self) -> EntryId;
}

/// Monotonic ULID provider (production)
///
/// Ids from one provider strictly increase even within one millisecond.
/// Ids from different processes order by their millisecond timestamp.
pub struct UlidProvider {
    generator: Mutex<Generator>,
}

impl UlidProvider {
    pub fn new() -> Self {
        Self {
            generator: Mutex::new(Generator::new()),
        }
    }
}

impl Default for UlidProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdProvider for UlidProvider {
    fn next_id(&self) -> EntryId {
        let mut generator = self.generator.lock();
        match generator.generate_from_datetime(SystemTime::now()) {
            Ok(ulid) => EntryId::from(ulid),
            // Random component exhausted within this millisecond: move on to a fresh one
            Err(_) => {
                let last = generator
                    .generate_from_datetime(SystemTime::now() + std::time::Duration::from_millis(1))
                    .unwrap_or_else(|_| Ulid::new());
                EntryId::from(last)
            }
        }
    }
}

// Queue Metrics Port

use std::sync::atomic::{AtomicU64, Ordering};

/// Countable queue outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueEvent {
    Enqueued,
    CanceledOnSaturation,
    DroppedOnSaturation,
    Popped,
    PopFailed,
    /// Migration adapter served a message from the `previous` backend
    ServedFromPrevious,
}

impl QueueEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueEvent::Enqueued => "pending.enqueued",
            QueueEvent::CanceledOnSaturation => "pending.saturation.canceled",
            QueueEvent::DroppedOnSaturation => "pending.saturation.dropped",
            QueueEvent::Popped => "pending.popped",
            QueueEvent::PopFailed => "pending.pop_failed",
            QueueEvent::ServedFromPrevious => "pending.served_from_previous",
        }
    }
}

/// Counter sink; format of exposure is up to the implementation
pub trait QueueMetrics: Send + Sync {
    fn record(&self, event: QueueEvent);
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub enqueued: u64,
    pub canceled_on_saturation: u64,
    pub dropped_on_saturation: u64,
    pub popped: u64,
    pub pop_failed: u64,
    pub served_from_previous: u64,
}

/// Lock-free in-process counters
#[derive(Debug, Default)]
pub struct AtomicQueueMetrics {
    enqueued: AtomicU64,
    canceled_on_saturation: AtomicU64,
    dropped_on_saturation: AtomicU64,
    popped: AtomicU64,
    pop_failed: AtomicU64,
    served_from_previous: AtomicU64,
}

impl AtomicQueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            canceled_on_saturation: self.canceled_on_saturation.load(Ordering::Relaxed),
            dropped_on_saturation: self.dropped_on_saturation.load(Ordering::Relaxed),
            popped: self.popped.load(Ordering::Relaxed),
            pop_failed: self.pop_failed.load(Ordering::Relaxed),
            served_from_previous: self.served_from_previous.load(Ordering::Relaxed),
        }
    }

    fn counter(&self, event: QueueEvent) -> &AtomicU64 {
        match event {
            QueueEvent::Enqueued => &self.enqueued,
            QueueEvent::CanceledOnSaturation => &self.canceled_on_saturation,
            QueueEvent::DroppedOnSaturation => &self.dropped_on_saturation,
            QueueEvent::Popped => &self.popped,
            QueueEvent::PopFailed => &self.pop_failed,
            QueueEvent::ServedFromPrevious => &self.served_from_previous,
        }
    }
}

impl QueueMetrics for AtomicQueueMetrics {
    fn record(&self, event: QueueEvent) {
        self.counter(event).fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = event.as_str(), "counter incremented");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_event_has_its_own_counter() {
        let metrics = AtomicQueueMetrics::new();
        metrics.record(QueueEvent::Enqueued);
        metrics.record(QueueEvent::Enqueued);
        metrics.record(QueueEvent::ServedFromPrevious);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.enqueued, 2);
        assert_eq!(snapshot.served_from_previous, 1);
        assert_eq!(snapshot.popped, 0);
        assert_eq!(snapshot.pop_failed, 0);
    }
}

//! Process-wide request counters
//!
//! Injected as `Arc<RequestCounters>` and updated with atomic increments, so
//! concurrent handlers never lose updates.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Default)]
pub struct RequestCounters {
    total: AtomicU64,
    in_interval: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CounterSnapshot {
    /// Monotonic, never reset
    pub total_request_count: u64,
    /// Requests since the previous metrics read
    pub request_count_in_interval: u64,
    /// Monotonic, never reset
    pub error_count: u64,
}

impl RequestCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one inference attempt, successful or not
    pub fn record_request(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.in_interval.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Read without resetting the interval counter
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total_request_count: self.total.load(Ordering::Relaxed),
            request_count_in_interval: self.in_interval.load(Ordering::Relaxed),
            error_count: self.errors.load(Ordering::Relaxed),
        }
    }

    /// Read and zero `request_count_in_interval`. Each increment is observed
    /// by exactly one reader.
    pub fn read_and_reset(&self) -> CounterSnapshot {
        CounterSnapshot {
            total_request_count: self.total.load(Ordering::Relaxed),
            request_count_in_interval: self.in_interval.swap(0, Ordering::Relaxed),
            error_count: self.errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn second_read_sees_zero_interval() {
        let counters = RequestCounters::new();
        for _ in 0..3 {
            counters.record_request();
        }
        counters.record_error();

        let first = counters.read_and_reset();
        assert_eq!(first.request_count_in_interval, 3);
        assert_eq!(first.total_request_count, 3);
        assert_eq!(first.error_count, 1);

        let second = counters.read_and_reset();
        assert_eq!(second.request_count_in_interval, 0);
        assert_eq!(second.total_request_count, 3);
        assert_eq!(second.error_count, 1);
    }

    #[test]
    fn snapshot_does_not_reset() {
        let counters = RequestCounters::new();
        counters.record_request();
        assert_eq!(counters.snapshot().request_count_in_interval, 1);
        assert_eq!(counters.snapshot().request_count_in_interval, 1);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let counters = Arc::new(RequestCounters::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counters = counters.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counters.record_request();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut drained = 0;
        let mut previous_total = 0;
        loop {
            let snap = counters.read_and_reset();
            assert!(snap.total_request_count >= previous_total);
            previous_total = snap.total_request_count;
            if snap.request_count_in_interval == 0 {
                break;
            }
            drained += snap.request_count_in_interval;
        }
        assert_eq!(drained, 8000);
        assert_eq!(previous_total, 8000);
    }
}

//! Time bucket model

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregated counts for one `[bucket_start, bucket_start + width)` interval.
///
/// Buckets are derived on read from events and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub bucket_start: DateTime<Utc>,
    pub request_count: u64,
    pub error_count: u64,
}

impl Bucket {
    pub fn empty(bucket_start: DateTime<Utc>) -> Self {
        Self {
            bucket_start,
            request_count: 0,
            error_count: 0,
        }
    }
}

/// `floor(timestamp / width) * width` in epoch milliseconds.
///
/// Uses euclidean division so pre-epoch timestamps still floor downwards.
/// `width_ms` must be positive.
pub fn align_to_bucket(timestamp_ms: i64, width_ms: i64) -> i64 {
    timestamp_ms.div_euclid(width_ms) * width_ms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_down_to_width() {
        assert_eq!(align_to_bucket(125_000, 60_000), 120_000);
        assert_eq!(align_to_bucket(120_000, 60_000), 120_000);
        assert_eq!(align_to_bucket(179_999, 60_000), 120_000);
    }

    #[test]
    fn aligns_negative_timestamps_down() {
        assert_eq!(align_to_bucket(-1, 60_000), -60_000);
    }
}

//! Bucket aggregator
//!
//! Turns the raw event log into a fixed-length, gap-filled series of
//! `width`-wide buckets ending with the bucket that contains `now`. The
//! series is ordered oldest first.
//!
//! Events are bucketed by their own timestamp, so an event written with a
//! clock slightly behind the reader may land one bucket earlier than
//! expected, or fall outside the window entirely. Reads are eventually
//! consistent with concurrent writes.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::domain::{align_to_bucket, Bucket, EventRepository, GatewayError, GatewayResult};

#[derive(Clone)]
pub struct BucketAggregator {
    repository: Arc<dyn EventRepository>,
}

impl BucketAggregator {
    pub fn new(repository: Arc<dyn EventRepository>) -> Self {
        Self { repository }
    }

    pub async fn recent_buckets(&self, n: usize, width: Duration) -> GatewayResult<Vec<Bucket>> {
        self.recent_buckets_at(n, width, Utc::now()).await
    }

    /// Exactly `n` buckets spaced `width` apart, the last one containing `now`
    pub async fn recent_buckets_at(
        &self,
        n: usize,
        width: Duration,
        now: DateTime<Utc>,
    ) -> GatewayResult<Vec<Bucket>> {
        let width_ms = width.num_milliseconds();
        if width_ms <= 0 {
            return Err(GatewayError::InvalidConfiguration(format!(
                "bucket width must be positive, got {}ms",
                width_ms
            )));
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let span = i64::try_from(n - 1)
            .ok()
            .and_then(|k| k.checked_mul(width_ms))
            .ok_or_else(|| GatewayError::InvalidConfiguration("bucket window too large".to_string()))?;

        let last_start = align_to_bucket(now.timestamp_millis(), width_ms);
        let first_start = last_start - span;
        let window_end = last_start + width_ms;

        let from = DateTime::<Utc>::from_timestamp_millis(first_start).ok_or_else(|| {
            GatewayError::InvalidConfiguration("bucket window starts out of range".to_string())
        })?;
        let events = self.repository.since(from).await?;

        // bucket start (ms) -> (requests, errors)
        let mut grouped: BTreeMap<i64, (u64, u64)> = BTreeMap::new();
        for event in &events {
            let ts = event.timestamp.timestamp_millis();
            if ts >= window_end {
                continue;
            }
            let entry = grouped.entry(align_to_bucket(ts, width_ms)).or_default();
            entry.0 += 1;
            if event.kind.is_error() {
                entry.1 += 1;
            }
        }

        (0..n)
            .map(|i| {
                let start_ms = first_start + (i as i64) * width_ms;
                let bucket_start = DateTime::<Utc>::from_timestamp_millis(start_ms).ok_or_else(
                    || GatewayError::Internal(format!("bucket start {} out of range", start_ms)),
                )?;
                Ok(match grouped.get(&start_ms) {
                    Some(&(request_count, error_count)) => Bucket {
                        bucket_start,
                        request_count,
                        error_count,
                    },
                    None => Bucket::empty(bucket_start),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventKind, EventSource, NewEvent};
    use crate::infrastructure::database::{test_database, SeaOrmEventRepository};

    async fn setup() -> (BucketAggregator, Arc<SeaOrmEventRepository>) {
        let repo = Arc::new(SeaOrmEventRepository::new(test_database().await));
        (BucketAggregator::new(repo.clone()), repo)
    }

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(ms).unwrap()
    }

    async fn append(repo: &SeaOrmEventRepository, ms: i64, kind: EventKind) {
        repo.append(NewEvent::new(at(ms), kind, "alice", EventSource::Predict))
            .await
            .unwrap();
    }

    const MINUTE: i64 = 60_000;
    // 2023-11-14T22:13:00Z, minute aligned
    const NOW_FLOOR: i64 = 1_700_000_000_000 / MINUTE * MINUTE;

    #[tokio::test]
    async fn returns_exactly_n_increasing_evenly_spaced() {
        let (aggregator, _) = setup().await;
        let now = at(NOW_FLOOR + 42_000);

        for n in [1usize, 2, 7, 20] {
            let buckets = aggregator
                .recent_buckets_at(n, Duration::minutes(1), now)
                .await
                .unwrap();
            assert_eq!(buckets.len(), n);
            for pair in buckets.windows(2) {
                assert_eq!(pair[1].bucket_start - pair[0].bucket_start, Duration::minutes(1));
            }
            assert_eq!(buckets[n - 1].bucket_start, at(NOW_FLOOR));
        }
    }

    #[tokio::test]
    async fn empty_range_is_zero_filled_on_every_read() {
        let (aggregator, _) = setup().await;
        let now = at(NOW_FLOOR);

        for _ in 0..3 {
            let buckets = aggregator
                .recent_buckets_at(5, Duration::seconds(10), now)
                .await
                .unwrap();
            assert_eq!(buckets.len(), 5);
            assert!(buckets.iter().all(|b| b.request_count == 0 && b.error_count == 0));
        }
    }

    #[tokio::test]
    async fn event_lands_in_the_bucket_containing_it() {
        let (aggregator, repo) = setup().await;
        let t = NOW_FLOOR - 2 * MINUTE + 17_500;
        append(&repo, t, EventKind::Success).await;

        let buckets = aggregator
            .recent_buckets_at(5, Duration::minutes(1), at(NOW_FLOOR + 1))
            .await
            .unwrap();

        let containing: Vec<&Bucket> = buckets
            .iter()
            .filter(|b| b.request_count > 0)
            .collect();
        assert_eq!(containing.len(), 1);
        let bucket = containing[0];
        assert!(bucket.bucket_start <= at(t));
        assert!(at(t) < bucket.bucket_start + Duration::minutes(1));
        assert_eq!(bucket.bucket_start, at(NOW_FLOOR - 2 * MINUTE));
    }

    #[tokio::test]
    async fn counts_requests_and_errors_and_skips_out_of_window() {
        let (aggregator, repo) = setup().await;
        // Before the window
        append(&repo, NOW_FLOOR - 3 * MINUTE - 1, EventKind::Error).await;
        // Oldest bucket
        append(&repo, NOW_FLOOR - 2 * MINUTE, EventKind::Success).await;
        append(&repo, NOW_FLOOR - 2 * MINUTE + 59_999, EventKind::Error).await;
        // Current bucket
        append(&repo, NOW_FLOOR + 5_000, EventKind::Error).await;
        // Ahead of the reader's clock
        append(&repo, NOW_FLOOR + MINUTE, EventKind::Success).await;

        let buckets = aggregator
            .recent_buckets_at(3, Duration::minutes(1), at(NOW_FLOOR + 10_000))
            .await
            .unwrap();

        let counts: Vec<(u64, u64)> = buckets
            .iter()
            .map(|b| (b.request_count, b.error_count))
            .collect();
        assert_eq!(counts, vec![(2, 1), (0, 0), (1, 1)]);
    }

    #[tokio::test]
    async fn zero_buckets_is_empty() {
        let (aggregator, repo) = setup().await;
        append(&repo, NOW_FLOOR, EventKind::Success).await;
        let buckets = aggregator
            .recent_buckets_at(0, Duration::minutes(1), at(NOW_FLOOR))
            .await
            .unwrap();
        assert!(buckets.is_empty());
    }

    #[tokio::test]
    async fn non_positive_width_is_configuration_error() {
        let (aggregator, _) = setup().await;
        for width in [Duration::zero(), Duration::seconds(-5)] {
            let err = aggregator
                .recent_buckets_at(3, width, at(NOW_FLOOR))
                .await
                .unwrap_err();
            assert!(matches!(err, GatewayError::InvalidConfiguration(_)));
        }
    }
}

//! Metrics DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::Bucket;

/// Query for `GET /metrics/buckets`
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BucketQuery {
    /// Number of buckets, newest last
    pub count: Option<usize>,
    /// Bucket width in seconds
    pub width: Option<i64>,
}

/// One point of the aggregated series.
///
/// `total` counts every recorded event in the bucket, failed logins
/// included; `errors` is the failing subset.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BucketPoint {
    pub timestamp: DateTime<Utc>,
    pub total: u64,
    pub errors: u64,
}

impl From<Bucket> for BucketPoint {
    fn from(bucket: Bucket) -> Self {
        Self {
            timestamp: bucket.bucket_start,
            total: bucket.request_count,
            errors: bucket.error_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BucketSeries {
    pub width_secs: i64,
    pub buckets: Vec<BucketPoint>,
}

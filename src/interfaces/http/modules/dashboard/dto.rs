use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::{CounterSample, DashboardSnapshot};
use crate::interfaces::http::modules::metrics::BucketPoint;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CounterSampleDto {
    pub polled_at: DateTime<Utc>,
    pub total_request_count: u64,
}

impl From<CounterSample> for CounterSampleDto {
    fn from(sample: CounterSample) -> Self {
        Self {
            polled_at: sample.polled_at,
            total_request_count: sample.total_request_count,
        }
    }
}

/// Latest poll; `polled_at` is null until the first poll completes
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardSeries {
    pub polled_at: Option<DateTime<Utc>>,
    pub width_secs: i64,
    pub buckets: Vec<BucketPoint>,
    pub history: Vec<CounterSampleDto>,
}

impl DashboardSeries {
    pub fn from_snapshot(snapshot: DashboardSnapshot, width_secs: i64) -> Self {
        Self {
            polled_at: snapshot.polled_at,
            width_secs,
            buckets: snapshot.buckets.into_iter().map(BucketPoint::from).collect(),
            history: snapshot.history.into_iter().map(CounterSampleDto::from).collect(),
        }
    }
}

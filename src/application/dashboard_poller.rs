//! Dashboard poller
//!
//! Background task that periodically pulls the aggregated bucket series and
//! a counter sample, keeping the latest series and a bounded history for
//! the dashboard chart.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::application::{BucketAggregator, RequestCounters};
use crate::domain::{Bucket, GatewayResult};
use crate::infrastructure::ShutdownSignal;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: StdDuration,
    pub bucket_count: usize,
    pub bucket_width: Duration,
    /// Maximum number of counter samples kept
    pub history_len: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: StdDuration::from_secs(2),
            bucket_count: 20,
            bucket_width: Duration::seconds(60),
            history_len: 20,
        }
    }
}

/// Total request count observed at one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterSample {
    pub polled_at: DateTime<Utc>,
    pub total_request_count: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub polled_at: Option<DateTime<Utc>>,
    pub buckets: Vec<Bucket>,
    pub history: VecDeque<CounterSample>,
}

pub struct DashboardPoller {
    aggregator: BucketAggregator,
    counters: Arc<RequestCounters>,
    config: PollerConfig,
    latest: RwLock<DashboardSnapshot>,
}

impl DashboardPoller {
    pub fn new(
        aggregator: BucketAggregator,
        counters: Arc<RequestCounters>,
        config: PollerConfig,
    ) -> Self {
        Self {
            aggregator,
            counters,
            config,
            latest: RwLock::new(DashboardSnapshot::default()),
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Most recent poll result
    pub async fn latest(&self) -> DashboardSnapshot {
        self.latest.read().await.clone()
    }

    /// Pull one series and one counter sample.
    ///
    /// On failure the previous series is kept.
    pub async fn poll_once(&self) -> GatewayResult<()> {
        let now = Utc::now();
        let buckets = self
            .aggregator
            .recent_buckets_at(self.config.bucket_count, self.config.bucket_width, now)
            .await?;
        let sample = CounterSample {
            polled_at: now,
            total_request_count: self.counters.snapshot().total_request_count,
        };

        let mut latest = self.latest.write().await;
        latest.polled_at = Some(now);
        latest.buckets = buckets;
        latest.history.push_back(sample);
        while latest.history.len() > self.config.history_len {
            latest.history.pop_front();
        }
        Ok(())
    }

    /// Run until `shutdown` fires
    pub fn start(self: Arc<Self>, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "📊 Dashboard poller started (interval: {}s, buckets: {})",
                self.config.interval.as_secs(),
                self.config.bucket_count
            );

            let mut interval = tokio::time::interval(self.config.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match self.poll_once().await {
                            Ok(()) => debug!("Dashboard series refreshed"),
                            Err(e) => warn!("Dashboard poll failed: {}", e),
                        }
                    }
                    _ = shutdown.wait() => {
                        info!("📊 Dashboard poller shutting down");
                        break;
                    }
                }
            }

            info!("📊 Dashboard poller stopped");
        })
    }
}

//! Rate-limit status monitoring.
//!
//! The service is read-only from the client's perspective. Refreshes may
//! overlap; only the most recent result is retained (last write wins via a
//! watch channel).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;

/// Current usage counters. Extra server fields are tolerated.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RateLimitStatus {
    #[serde(default)]
    pub total_limit: u32,
    #[serde(default)]
    pub total_remaining: u32,
    #[serde(default)]
    pub image_generation_limit: u32,
    #[serde(default)]
    pub image_generation_remaining: u32,
}

#[async_trait]
pub trait RateLimitSource: Send + Sync {
    async fn fetch(&self) -> Result<RateLimitStatus, ClientError>;
}

pub struct RateLimitMonitor {
    source: Arc<dyn RateLimitSource>,
    tx: watch::Sender<Option<RateLimitStatus>>,
}

impl RateLimitMonitor {
    pub fn new(source: Arc<dyn RateLimitSource>) -> Self {
        let (tx, _) = watch::channel(None);
        Self { source, tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<RateLimitStatus>> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> Option<RateLimitStatus> {
        self.tx.borrow().clone()
    }

    /// Fetch once and publish. Failures keep the previous value.
    pub async fn refresh(&self) {
        fetch_and_publish(self.source.clone(), self.tx.clone()).await;
    }

    /// Fire-and-forget refresh, used after every turn terminal state.
    pub fn request_refresh(&self) {
        tokio::spawn(fetch_and_publish(self.source.clone(), self.tx.clone()));
    }

    /// Refresh on a fixed interval until cancelled.
    pub fn spawn_polling(&self, every: Duration, cancel: CancellationToken) {
        let source = self.source.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => fetch_and_publish(source.clone(), tx.clone()).await,
                }
            }
        });
    }
}

async fn fetch_and_publish(
    source: Arc<dyn RateLimitSource>,
    tx: watch::Sender<Option<RateLimitStatus>>,
) {
    match source.fetch().await {
        Ok(status) => {
            let _ = tx.send(Some(status));
        }
        Err(e) => tracing::warn!("rate limit refresh failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    struct CountingSource {
        calls: AtomicU32,
    }

    #[async_trait]
    impl RateLimitSource for CountingSource {
        async fn fetch(&self) -> Result<RateLimitStatus, ClientError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(RateLimitStatus {
                total_limit: 20,
                total_remaining: 20 - n,
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_refresh_publishes_latest() {
        let source = Arc::new(CountingSource {
            calls: AtomicU32::new(0),
        });
        let monitor = RateLimitMonitor::new(source);
        assert!(monitor.latest().is_none());

        monitor.refresh().await;
        assert_eq!(monitor.latest().unwrap().total_remaining, 19);

        monitor.refresh().await;
        assert_eq!(monitor.latest().unwrap().total_remaining, 18);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_stops_on_cancel() {
        let source = Arc::new(CountingSource {
            calls: AtomicU32::new(0),
        });
        let monitor = Arc::new(RateLimitMonitor::new(source.clone()));
        let cancel = CancellationToken::new();

        monitor.spawn_polling(Duration::from_secs(60), cancel.clone());
        tokio::time::sleep(Duration::from_secs(150)).await;
        let polled = source.calls.load(Ordering::SeqCst);
        assert!(polled >= 2);

        cancel.cancel();
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), polled);
    }

    #[test]
    fn test_status_tolerates_extra_fields() {
        let json = r#"{
            "total_limit": 20,
            "total_remaining": 7,
            "image_generation_limit": 5,
            "image_generation_remaining": 0,
            "reset_time": "midnight JST"
        }"#;
        let status: RateLimitStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.total_remaining, 7);
        assert_eq!(status.image_generation_remaining, 0);
    }
}

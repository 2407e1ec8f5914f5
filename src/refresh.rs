use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::interval;
use tracing::{error, info};

use crate::api::health::HealthState;
use crate::contract::ContestReader;
use crate::error::Result;
use crate::state::{ContestStore, StoreDiff};

/// Periodically re-fetches every contest snapshot into the store.
///
/// Derived state is never cached: handlers classify the stored snapshots on
/// each request, so a refresh is the only way the board changes.
pub struct ContestRefresher<C> {
    client: Arc<C>,
    store: Arc<ContestStore>,
    health: Arc<HealthState>,
    interval_secs: u64,
}

impl<C: ContestReader + 'static> ContestRefresher<C> {
    pub fn new(
        client: Arc<C>,
        store: Arc<ContestStore>,
        health: Arc<HealthState>,
        interval_secs: u64,
    ) -> Self {
        Self { client, store, health, interval_secs }
    }

    pub async fn run(self) {
        let mut ticker = interval(Duration::from_secs(self.interval_secs));

        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh().await {
                self.health.record_failure();
                error!(
                    failures = self.health.consecutive_failures(),
                    "Contest refresh failed: {e}"
                );
            }
        }
    }

    /// Fetch a fresh snapshot set and swap it into the store.
    pub async fn refresh(&self) -> Result<StoreDiff> {
        let fresh = self.client.get_contests().await?;
        let diff = self.store.replace_all(fresh);
        self.health.record_success(now_secs());

        info!(
            added = diff.added,
            removed = diff.removed,
            updated = diff.updated,
            total = self.store.len(),
            "Contest refresh complete: +{} added, -{} removed, {} updated",
            diff.added,
            diff.removed,
            diff.updated,
        );
        Ok(diff)
    }
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

//! Background resync task

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::datasource::DataSourceManager;

/// Starts the periodic resync of a product's cache
#[derive(Debug, Clone, Copy)]
pub struct DataSynchronizer;

impl DataSynchronizer {
    /// Spawn the resync task if the product's configuration asks for one
    ///
    /// Returns `None` when no task was started.
    pub fn start(manager: &Arc<DataSourceManager>) -> Option<JoinHandle<()>> {
        let config = manager.config();
        if !config.sync_enabled() {
            debug!(product = %config.product_name, "Periodic cache sync disabled");
            return None;
        }

        let period = config.cache_expiry();
        info!(
            product = %config.product_name,
            period_secs = period.as_secs(),
            "Starting cache synchronizer"
        );

        Self::spawn(Arc::downgrade(manager), period)
    }

    /// Spawn a resync loop with an explicit period
    ///
    /// The first sync runs one period from now. Returns `None` for a zero
    /// period or one too large to schedule.
    pub fn spawn(manager: Weak<DataSourceManager>, period: Duration) -> Option<JoinHandle<()>> {
        let first_tick = match Instant::now().checked_add(period) {
            Some(first_tick) if !period.is_zero() => first_tick,
            _ => {
                warn!(period_secs = period.as_secs(), "Cannot schedule cache synchronizer");
                return None;
            }
        };

        Some(tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let Some(manager) = manager.upgrade() else {
                    debug!("Manager dropped, stopping cache synchronizer");
                    break;
                };

                let expired = manager.is_expired().await;
                debug!(
                    product = %manager.product_name(),
                    expired,
                    "Running scheduled cache sync"
                );
                manager.sync_cache().await;
            }
        }))
    }
}

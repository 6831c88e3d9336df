//! Background enqueue retry sweep.
//!
//! Commits stay durable when the broker rejects a publish; the job row is
//! marked enqueue_failed and this loop re-publishes it later. Delivery is
//! at-least-once; the worker dedupes on importId.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::state::AppState;

/// Periodically re-publish enqueue_failed jobs. Runs until shutdown.
pub async fn run_retry_sweep(state: Arc<AppState>) {
    let interval_secs = state.config.retry.sweep_interval_secs;
    if interval_secs == 0 {
        info!("Enqueue retry sweep disabled (RETRY_SWEEP_INTERVAL_SECS=0)");
        return;
    }

    let batch = i64::from(state.config.retry.batch_size);
    info!(
        interval_secs,
        batch_size = batch,
        "Enqueue retry sweep started"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match state.service.retry_enqueue_failed(batch).await {
            Ok(0) => {}
            Ok(delivered) => info!(delivered, "Retry sweep re-enqueued jobs"),
            Err(e) => warn!("Retry sweep failed: {}, will retry next interval", e),
        }
    }
}

// File: lisabot-core/src/tasks/model_refresh.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::model::{ModelHandle, Retrainer};
use crate::state::ActivityCounter;
use crate::Error;

/// Period used when a zero interval is requested.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// One refresh: perk the bot up, retrain on a blocking thread, publish on success.
/// On failure the active bundle is left untouched. Returns the new generation.
pub async fn run_refresh_cycle(
    retrainer: Arc<dyn Retrainer>,
    models: &ModelHandle,
    activity: &ActivityCounter,
    boost: i64,
) -> Result<u64, Error> {
    let level = activity.bump(boost);
    info!("Model refresh starting; activity now {}", level);

    let bundle = tokio::task::spawn_blocking(move || retrainer.retrain())
        .await
        .map_err(|e| Error::Training(format!("retrain task aborted: {e}")))??;

    let labels = bundle.label_map.len();
    let trained_at = bundle.trained_at;
    let generation = models.publish(bundle);
    info!(
        "Published model generation {} ({} labels, trained {:?})",
        generation, labels, trained_at
    );
    Ok(generation)
}

/// Spawns the periodic refresh loop. The first cycle runs immediately, then every
/// `interval` (a zero interval falls back to [`MIN_REFRESH_INTERVAL`]); the loop
/// exits once `shutdown` carries `true` or its sender is dropped.
pub fn spawn_model_refresh_task(
    retrainer: Arc<dyn Retrainer>,
    models: Arc<ModelHandle>,
    activity: Arc<ActivityCounter>,
    boost: i64,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let interval = if interval.is_zero() {
        warn!("Refresh interval is zero; using {:?}", MIN_REFRESH_INTERVAL);
        MIN_REFRESH_INTERVAL
    } else {
        interval
    };
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = run_refresh_cycle(retrainer.clone(), &models, &activity, boost).await {
                        error!("Model refresh failed; keeping current model: {:?}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Model refresh task shutting down.");
                        break;
                    }
                }
            }
        }
    })
}

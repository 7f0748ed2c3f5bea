//! Background ensure-content task with an owned lifecycle.
//!
//! [`RefreshTask::spawn`] runs [`StoryService::ensure_content`] on a fixed
//! interval (first pass immediately) and stops when [`RefreshTask::shutdown`]
//! is awaited. The handle owns the task; nothing keeps running past it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::story::service::StoryService;

pub struct RefreshTask {
    handle: JoinHandle<()>,
    stop: watch::Sender<bool>,
}

impl RefreshTask {
    /// Start the refresh loop. Each tick tops every key up to `floor`
    /// cached stories and repairs missing audio.
    pub fn spawn(service: Arc<StoryService>, interval: Duration, floor: usize) -> Self {
        let (stop, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match service.ensure_content(floor).await {
                            Ok(report) => info!(
                                keys = report.keys_checked,
                                generated = report.generated,
                                audio_repaired = report.audio_repaired,
                                "content refresh pass complete"
                            ),
                            Err(e) => warn!(error = %e, "content refresh pass failed"),
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("refresh task stopped");
        });

        Self { handle, stop }
    }

    /// Signal the loop to stop and wait for it to finish its current pass.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.handle.await;
    }

    /// Whether the task is still running.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

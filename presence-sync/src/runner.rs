//! Refresh Scheduler
//!
//! Fires a refresh at startup and then on every interval tick. Each tick
//! spawns the refresh and returns to the timer, so a slow cycle never delays
//! the schedule; ticks that land on a running cycle are dropped by the
//! service's guard.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::PresenceService;

/// Periodic refresh driver
pub struct RefreshScheduler {
    service: Arc<PresenceService>,
    period: Duration,
}

/// Handle to a running scheduler
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop scheduling new cycles and wait for the timer task to exit
    ///
    /// A cycle already in flight keeps running to completion.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            warn!(error = %e, "Refresh scheduler task ended abnormally");
        }
    }
}

impl RefreshScheduler {
    pub fn new(service: Arc<PresenceService>, period: Duration) -> Self {
        Self { service, period }
    }

    /// Start the timer task
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let service = self.service;
        let period = self.period;

        let task = tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(period_secs = period.as_secs(), "Refresh scheduler started");

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Refresh scheduler received shutdown signal");
                        break;
                    }
                    _ = timer.tick() => {
                        debug!("Scheduled refresh tick");
                        service.trigger_refresh();
                    }
                }
            }

            info!("Refresh scheduler stopped");
        });

        SchedulerHandle { shutdown_tx, task }
    }
}

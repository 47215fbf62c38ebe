/// Background Expiry Sweeper
///
/// Deletes sessions whose expiry has passed: once immediately on start, then
/// on a fixed interval until the cancellation token fires. Cancellation is
/// only observed between sweeps; a sweep in progress always completes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::{ConfigError, StoreError};
use crate::repository::SessionRepository;

pub struct SessionSweeper {
    sessions: Arc<dyn SessionRepository>,
    interval: Duration,
}

impl SessionSweeper {
    /// # Errors
    /// `InvalidValue` for a zero interval, which the tokio timer cannot tick on
    pub fn new(sessions: Arc<dyn SessionRepository>, interval: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "session sweep interval must be non-zero".to_string(),
            ));
        }
        Ok(Self { sessions, interval })
    }

    /// Delete every session expired at or before now; returns the count removed
    pub async fn sweep_once(&self) -> Result<u64, StoreError> {
        self.sessions.delete_expired(Utc::now()).await
    }

    /// Run the sweep loop until the cancellation token is triggered.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "Start clearing expired sessions");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                // First tick completes immediately
                _ = ticker.tick() => self.sweep_step().await,
            }
        }

        info!("Stop clearing expired sessions");
    }

    /// Spawn [`run`](Self::run) on the tokio runtime
    pub fn spawn(self, shutdown: CancellationToken) -> SweeperHandle {
        let task = tokio::spawn(self.run(shutdown.clone()));
        SweeperHandle { shutdown, task }
    }

    async fn sweep_step(&self) {
        match self.sweep_once().await {
            Ok(removed) => info!(removed = removed, "Cleared expired sessions"),
            // The next tick retries; nothing was partially applied
            Err(e) => error!(error = %e, "Can't clear expired sessions"),
        }
    }
}

/// Owner's handle to a running sweeper
pub struct SweeperHandle {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the sweeper and wait for it to exit
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "Session sweeper task failed");
        }
    }
}

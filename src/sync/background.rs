//! Periodic staleness sweep over every language the service has loaded.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::service::{CategorySyncService, UpdateCheck};

/// Default sweep period: six hours.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Tally of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub checked: usize,
    pub refresh_scheduled: usize,
    pub up_to_date: usize,
    pub failed: usize,
}

struct SweepLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the sweep timer. At most one timer runs per manager.
pub struct BackgroundSyncManager {
    service: CategorySyncService,
    period: Duration,
    running: Mutex<Option<SweepLoop>>,
}

impl BackgroundSyncManager {
    pub fn new(service: CategorySyncService, period: Duration) -> Self {
        let period = if period.is_zero() {
            tracing::warn!("Sync interval of zero requested, using the default");
            DEFAULT_SYNC_INTERVAL
        } else {
            period
        };

        Self {
            service,
            period,
            running: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|sweep| !sweep.handle.is_finished())
    }

    /// Start the timer. The first sweep runs immediately.
    ///
    /// Returns false if a timer is already running.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.as_ref().is_some_and(|sweep| !sweep.handle.is_finished()) {
            tracing::debug!("Background sync already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sweep_loop(
            self.service.clone(),
            self.period,
            cancel.clone(),
        ));
        *running = Some(SweepLoop { cancel, handle });

        tracing::info!(
            "Background sync started, checking every {} seconds",
            self.period.as_secs()
        );
        true
    }

    /// Stop the timer and wait for the loop to exit.
    ///
    /// Refreshes the loop already scheduled are left to finish on their own.
    pub async fn stop(&self) -> bool {
        let sweep = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(sweep) = sweep else {
            return false;
        };

        sweep.cancel.cancel();
        if let Err(e) = sweep.handle.await {
            tracing::warn!("Background sync loop ended abnormally: {}", e);
        }
        tracing::info!("Background sync stopped");
        true
    }

    /// Check every loaded language once.
    pub async fn sweep(&self) -> SweepReport {
        run_sweep(&self.service).await
    }
}

async fn sweep_loop(service: CategorySyncService, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let report = run_sweep(&service).await;
                tracing::debug!(?report, "Background sweep finished");
            }
        }
    }
}

async fn run_sweep(service: &CategorySyncService) -> SweepReport {
    let languages = service.get_loaded_languages();
    tracing::info!("Checking {} loaded language(s) for updates", languages.len());

    let outcomes = join_all(
        languages
            .iter()
            .map(|lang| service.trigger_background_update_if_needed(lang)),
    )
    .await;

    let mut report = SweepReport {
        checked: languages.len(),
        ..SweepReport::default()
    };
    for (lang, outcome) in languages.iter().zip(outcomes) {
        match outcome {
            Ok(UpdateCheck::UpToDate) => report.up_to_date += 1,
            Ok(UpdateCheck::RefreshScheduled | UpdateCheck::RefreshInProgress) => {
                report.refresh_scheduled += 1
            }
            Err(e) => {
                tracing::warn!("Background check failed for {}: {}", lang, e);
                report.failed += 1;
            }
        }
    }
    report
}

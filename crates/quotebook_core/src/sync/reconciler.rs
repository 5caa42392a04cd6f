//! Idle/Syncing reconciler over a shared quote store.
//!
//! # Invariants
//! - At most one reconciliation is in flight; a trigger that arrives while
//!   syncing is dropped (`ReconcileOutcome::Skipped`), never queued.
//! - The remote fetch is bounded by `timeout`; the latch is always released.
//! - The store lock is taken only after a successful fetch and decode, so a
//!   hung remote never blocks local mutations.

use crate::config::{SyncConfig, MAX_SYNC_DURATION_SECS};
use crate::repo::kv_repo::KvRepository;
use crate::service::quote_store::QuoteStore;
use crate::sync::merge::MergeStrategy;
use crate::sync::remote::{RemoteFormat, RemoteSource};
use crate::sync::SyncError;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Store handle shared by shells and the reconciler.
pub type SharedStore<R> = Arc<Mutex<QuoteStore<R>>>;

/// Outcome of one completed sync, as delivered by the periodic loop.
pub type SyncReport = Result<ReconcileOutcome, SyncError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Syncing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Remote state was applied; `count` is the resulting collection size.
    Applied { count: usize },
    /// Another reconciliation was already running.
    Skipped,
}

/// Runtime settings for the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerSettings {
    pub url: String,
    pub interval: Duration,
    pub timeout: Duration,
    pub strategy: MergeStrategy,
    pub format: RemoteFormat,
}

impl From<&SyncConfig> for ReconcilerSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            url: config.url.clone(),
            interval: Duration::from_secs(config.interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
            strategy: config.strategy,
            format: config.remote_format,
        }
    }
}

pub struct Reconciler<R: KvRepository + Send + 'static> {
    store: SharedStore<R>,
    remote: Arc<dyn RemoteSource>,
    settings: ReconcilerSettings,
    syncing: AtomicBool,
}

impl<R: KvRepository + Send + 'static> Reconciler<R> {
    pub fn new(
        store: SharedStore<R>,
        remote: Arc<dyn RemoteSource>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            store,
            remote,
            settings,
            syncing: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &ReconcilerSettings {
        &self.settings
    }

    pub fn state(&self) -> SyncState {
        if self.syncing.load(Ordering::Acquire) {
            SyncState::Syncing
        } else {
            SyncState::Idle
        }
    }

    /// Runs one reconciliation unless one is already in flight.
    ///
    /// # Errors
    /// - `Transport` / `Timeout` when the fetch fails; local state untouched.
    /// - `Format` when the payload is not a valid collection; untouched.
    /// - `Store` when persisting the reconciled collection fails; rolled back.
    pub async fn reconcile(&self) -> Result<ReconcileOutcome, SyncError> {
        let Some(_latch) = SyncLatch::acquire(&self.syncing) else {
            info!("event=sync_run module=sync status=skipped reason=in_flight");
            return Ok(ReconcileOutcome::Skipped);
        };

        let started_at = Instant::now();
        info!(
            "event=sync_run module=sync status=start strategy={}",
            self.settings.strategy.as_str()
        );
        match self.fetch_and_apply().await {
            Ok(count) => {
                info!(
                    "event=sync_run module=sync status=ok duration_ms={} count={count}",
                    started_at.elapsed().as_millis()
                );
                Ok(ReconcileOutcome::Applied { count })
            }
            Err(err) => {
                warn!(
                    "event=sync_run module=sync status=error duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Spawns the fixed-interval loop on the current tokio runtime.
    ///
    /// The first fire happens one interval after spawning. Each completed
    /// (non-skipped) run is sent once on `reports`. The loop ends when
    /// `shutdown` flips to `true` or its sender is dropped; an in-flight
    /// fetch is abandoned at that point.
    pub fn spawn_periodic(
        self: Arc<Self>,
        mut shutdown: watch::Receiver<bool>,
        reports: mpsc::UnboundedSender<SyncReport>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            // `interval_at` panics on a zero period or an unrepresentable start.
            let period = self
                .settings
                .interval
                .clamp(Duration::from_millis(1), max_sync_duration());
            let now = tokio::time::Instant::now();
            let start = now.checked_add(period).unwrap_or(now);
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(
                "event=sync_loop module=sync status=start interval_ms={}",
                period.as_millis()
            );

            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                        continue;
                    }
                }

                let report = tokio::select! {
                    report = self.reconcile() => report,
                    _ = shutdown.changed() => break,
                };
                if matches!(report, Ok(ReconcileOutcome::Skipped)) {
                    continue;
                }
                if reports.send(report).is_err() {
                    break;
                }
            }

            info!("event=sync_loop module=sync status=ok reason=shutdown");
        })
    }

    async fn fetch_and_apply(&self) -> Result<usize, SyncError> {
        let fetched = tokio::time::timeout(
            self.settings.timeout.min(max_sync_duration()),
            self.remote.fetch(&self.settings.url),
        )
        .await
        .map_err(|_| SyncError::Timeout(self.settings.timeout))??;
        let remote = self.settings.format.decode(&fetched)?;

        let mut store = self.store.lock().await;
        let merged = self.settings.strategy.merge(store.all(), remote);
        let count = store.replace_all(merged)?;
        Ok(count)
    }
}

fn max_sync_duration() -> Duration {
    Duration::from_secs(MAX_SYNC_DURATION_SECS)
}

/// Idle/Syncing latch; released on drop, including on cancellation.
struct SyncLatch<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SyncLatch<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SyncLatch<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::SyncLatch;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn latch_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let first = SyncLatch::acquire(&flag).expect("first acquire should succeed");
        assert!(SyncLatch::acquire(&flag).is_none());
        drop(first);
        assert!(!flag.load(Ordering::Acquire));
        assert!(SyncLatch::acquire(&flag).is_some());
    }
}

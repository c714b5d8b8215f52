//! Polling scheduler
//!
//! State machine: `Init -> Polling -> (Sleeping -> Polling)* -> Stopped`.
//!
//! Shutdown is cooperative. The flag is read after each cycle and wakes the
//! inter-cycle sleep, but an in-flight cycle always runs to completion.

use crate::domain::error::TrackerResult;
use crate::domain::types::TrackingState;
use crate::infra::config::Config;
use crate::io::notifier::Notifier;
use crate::io::provider::ListingProvider;
use crate::io::state_store::StateStore;
use crate::services::tracking_store::{CycleReport, TrackingStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Init,
    Polling,
    Sleeping,
    Stopped,
}

impl RunnerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunnerState::Init => "init",
            RunnerState::Polling => "polling",
            RunnerState::Sleeping => "sleeping",
            RunnerState::Stopped => "stopped",
        }
    }
}

pub struct Runner {
    store: TrackingStore,
    persistence: Arc<dyn StateStore>,
    interval: Duration,
    state: RunnerState,
    cycles: u64,
}

impl Runner {
    /// INIT: seed from configuration and merge any persisted snapshot
    pub fn init(
        config: &Config,
        provider: Arc<dyn ListingProvider>,
        notifier: Arc<dyn Notifier>,
        persistence: Arc<dyn StateStore>,
    ) -> Self {
        let mut state = config.seed_state();

        match persistence.load() {
            Ok(Some(snapshot)) => state.restore_from(snapshot),
            Ok(None) => info!("starting_without_snapshot"),
            // Tracking starts over; the next save replaces the unreadable file
            Err(e) => error!(kind = %e.kind(), error = %e, "snapshot_load_failed"),
        }

        info!(
            days = %state.days.len(),
            routes = %state.route_count(),
            interval_secs = %config.poll_interval_secs(),
            "runner_initialized"
        );

        Self {
            store: TrackingStore::new(state, provider, notifier),
            persistence,
            interval: config.poll_interval(),
            state: RunnerState::Init,
            cycles: 0,
        }
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn tracking_state(&self) -> &TrackingState {
        self.store.state()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// One POLLING step: run a cycle, then persist the whole state.
    ///
    /// A save failure is returned after the cycle; the in-memory state keeps
    /// the cycle's results and is saved again next time.
    pub async fn poll_once(&mut self) -> TrackerResult<CycleReport> {
        self.cycles += 1;
        let span = info_span!("cycle", cycle = %self.cycles, cycle_id = %Uuid::now_v7());

        let report = self.store.run_cycle().instrument(span.clone()).await;

        let _entered = span.enter();
        self.persistence.save(self.store.state())?;
        info!("state_persisted");
        Ok(report)
    }

    /// Drive the state machine until shutdown is requested.
    ///
    /// Returns the final tracking state.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> TrackingState {
        loop {
            let next = match self.state {
                RunnerState::Init => RunnerState::Polling,
                RunnerState::Polling => {
                    if let Err(e) = self.poll_once().await {
                        error!(cycle = %self.cycles, kind = %e.kind(), error = %e, "cycle_failed");
                    }
                    if *shutdown.borrow() {
                        RunnerState::Stopped
                    } else {
                        RunnerState::Sleeping
                    }
                }
                RunnerState::Sleeping => {
                    info!(interval_secs = %self.interval.as_secs(), "sleeping");
                    self.sleep(&mut shutdown).await;
                    if *shutdown.borrow() {
                        RunnerState::Stopped
                    } else {
                        RunnerState::Polling
                    }
                }
                RunnerState::Stopped => break,
            };
            debug!(from = %self.state.as_str(), to = %next.as_str(), "runner_state_changed");
            self.state = next;
        }

        info!(cycles = %self.cycles, "runner_stopped");
        self.store.into_state()
    }

    /// Sleep for one interval, waking early if shutdown is signalled
    async fn sleep(&self, shutdown: &mut watch::Receiver<bool>) {
        tokio::select! {
            _ = tokio::time::sleep(self.interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    // Sender gone: no signal can arrive any more
                    warn!("shutdown_channel_closed");
                    tokio::time::sleep(self.interval).await;
                }
            }
        }
    }
}

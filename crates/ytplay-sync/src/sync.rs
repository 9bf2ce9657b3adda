//! State synchronizer: full-state polls, snapshot replacement, persistence
//! and startup restoration.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ytplay_core::snapshot::{PersistedSnapshot, Snapshot, SnapshotOrigin};

use crate::busy::BusyIndicator;
use crate::config::ClientConfig;
use crate::error::RequestError;
use crate::events::{ClientEvent, Connection};
use crate::state::Shared;
use crate::store::SnapshotStore;
use crate::transport::{Endpoint, HttpBackend, QueryParams, Transport};

/// Shown on the busy indicator during the very first poll.
pub const CONNECTING_MESSAGE: &str = "Connecting...";

/// Options of a single poll.
#[derive(Debug, Clone, Default)]
pub struct PollOptions {
    /// Abort the fetch when this token fires.
    pub cancel: Option<CancellationToken>,
    /// Apply the result only if this control generation is still current.
    pub guard: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Applied,
    /// The guarding control action was superseded; the result was dropped.
    Superseded,
    Aborted,
    /// Fetch failed; the previous snapshot stays in place.
    Offline(RequestError),
}

pub struct StateSynchronizer<B> {
    shared: Shared,
    transport: Transport<B>,
    busy: BusyIndicator<B>,
    store: Arc<dyn SnapshotStore>,
    config: Arc<ClientConfig>,
}

impl<B> Clone for StateSynchronizer<B> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            transport: self.transport.clone(),
            busy: self.busy.clone(),
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl<B: HttpBackend> StateSynchronizer<B> {
    pub fn new(
        shared: Shared,
        transport: Transport<B>,
        busy: BusyIndicator<B>,
        store: Arc<dyn SnapshotStore>,
        config: Arc<ClientConfig>,
    ) -> Self {
        Self {
            shared,
            transport,
            busy,
            store,
            config,
        }
    }

    /// Fetch the full state and replace the snapshot wholesale.
    pub async fn poll(&self, options: PollOptions) -> PollOutcome {
        let first = {
            let mut state = self.shared.lock();
            !std::mem::replace(&mut state.has_attempted, true)
        };
        let _connecting = first.then(|| self.busy.begin(Some(CONNECTING_MESSAGE)));

        let result: Result<Snapshot, RequestError> = self
            .transport
            .fetch(
                &Endpoint::State,
                &QueryParams::new(),
                self.config.state_timeout,
                options.cancel.as_ref(),
            )
            .await;

        match result {
            Ok(snapshot) => self.apply(snapshot, options.guard),
            Err(e) if e.is_aborted() => {
                debug!("state poll aborted");
                PollOutcome::Aborted
            }
            Err(e) => {
                let mut state = self.shared.lock();
                if state.connection != Some(Connection::Offline) {
                    warn!(error = %e, "daemon unreachable");
                }
                self.shared.set_connection(&mut state, Connection::Offline);
                PollOutcome::Offline(e)
            }
        }
    }

    fn apply(&self, snapshot: Snapshot, guard: Option<u64>) -> PollOutcome {
        let now = Utc::now();
        let snapshot = Arc::new(snapshot);
        {
            let mut state = self.shared.lock();
            if let Some(generation) = guard {
                if !state.control.is_current(generation) {
                    debug!(generation, "state poll superseded");
                    return PollOutcome::Superseded;
                }
            }
            self.shared.set_connection(&mut state, Connection::Online);
            let origin = SnapshotOrigin::Live { received_at: now };
            if state.origin.is_some_and(|o| !o.is_restored()) {
                state.previous = state.snapshot.take();
            }
            state.snapshot = Some(Arc::clone(&snapshot));
            state.origin = Some(origin);
            self.shared.emit(ClientEvent::Snapshot {
                snapshot: Arc::clone(&snapshot),
                origin,
            });
        }

        let persisted = PersistedSnapshot::new((*snapshot).clone(), now);
        if let Err(e) = self.store.save(&persisted) {
            debug!(error = %e, "snapshot not persisted");
        }
        PollOutcome::Applied
    }

    /// Show the persisted snapshot, if any, before the first live poll lands.
    ///
    /// A restored snapshot also skips the first-poll connecting indicator.
    pub fn restore(&self) -> Option<SnapshotOrigin> {
        let persisted = match self.store.load() {
            Ok(Some(p)) => p,
            Ok(None) => return None,
            Err(e) => {
                debug!(error = %e, "persisted snapshot unreadable");
                return None;
            }
        };

        let mut state = self.shared.lock();
        if state.snapshot.is_some() {
            return None;
        }
        let origin = SnapshotOrigin::Restored {
            saved_at: persisted.saved_at,
        };
        let snapshot = Arc::new(persisted.data);
        state.snapshot = Some(Arc::clone(&snapshot));
        state.origin = Some(origin);
        state.has_attempted = true;
        self.shared.set_connection(&mut state, Connection::Restored);
        self.shared.emit(ClientEvent::Snapshot { snapshot, origin });
        info!(saved_at = %persisted.saved_at, "restored persisted snapshot");
        Some(origin)
    }

    /// Poll immediately, then every `state_poll_interval` until `shutdown`.
    ///
    /// Each tick spawns its own poll; failures never stop the timer.
    pub fn spawn_timer(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(this.config.state_poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let poller = this.clone();
                        tokio::spawn(async move {
                            poller.poll(PollOptions::default()).await;
                        });
                    }
                }
            }
            debug!("state poll timer stopped");
        })
    }
}

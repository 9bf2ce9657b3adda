//! Shared client state and the event channel.
//!
//! Every mutation of the snapshot, the control generation, the busy count,
//! the progress cursor and the page cache goes through [`Shared::lock`]. The
//! guard is a plain `std` mutex guard: it is never held across an await, so
//! it can also be taken from `Drop`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use ytplay_core::busy::BusyState;
use ytplay_core::generation::GenerationCounter;
use ytplay_core::pagination::PageCache;
use ytplay_core::snapshot::{Snapshot, SnapshotOrigin};

use crate::config::ClientConfig;
use crate::events::{ClientEvent, Connection, Status};

const EVENT_CAPACITY: usize = 256;

/// Table list of the inspection view.
#[derive(Debug, Clone, Default)]
pub struct TablesState {
    pub names: Vec<String>,
    pub loaded: bool,
    pub loading: bool,
}

pub struct ClientState {
    /// Control-action generation; one sequence per process.
    pub control: GenerationCounter,
    /// Cancellation handle of the current control action.
    pub control_cancel: Option<CancellationToken>,

    pub snapshot: Option<Arc<Snapshot>>,
    /// Snapshot replaced by the last live poll, for "new in queue" marks.
    pub previous: Option<Arc<Snapshot>>,
    pub origin: Option<SnapshotOrigin>,
    pub connection: Option<Connection>,
    /// Set once the first full-state poll has started (or a snapshot was restored).
    pub has_attempted: bool,

    pub request_status: Option<Status>,
    pub learning_status: Option<Status>,

    pub busy: BusyState,
    /// Cancelled when the current busy period ends.
    pub busy_period: Option<CancellationToken>,

    pub pages: PageCache,
    pub tables: TablesState,
}

impl ClientState {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            control: GenerationCounter::new(),
            control_cancel: None,
            snapshot: None,
            previous: None,
            origin: None,
            connection: None,
            has_attempted: false,
            request_status: None,
            learning_status: None,
            busy: BusyState::new(config.history_cap),
            busy_period: None,
            pages: PageCache::new(config.page_size),
            tables: TablesState::default(),
        }
    }

    pub fn busy_message(&self) -> ClientEvent {
        ClientEvent::BusyMessage {
            headline: self.busy.headline().map(str::to_string),
            history: self.busy.history(),
        }
    }
}

/// Handle onto the single state instance plus the event sender.
#[derive(Clone)]
pub struct Shared {
    state: Arc<Mutex<ClientState>>,
    events: broadcast::Sender<ClientEvent>,
}

impl Shared {
    pub fn new(config: &ClientConfig) -> Self {
        let (events, _rx) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(ClientState::new(config))),
            events,
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send an event. Having no subscriber is fine.
    pub fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub fn set_request_status(&self, status: Status) {
        let mut state = self.lock();
        state.request_status = Some(status.clone());
        self.emit(ClientEvent::RequestStatus(status));
    }

    pub fn set_learning_status(&self, status: Status) {
        let mut state = self.lock();
        state.learning_status = Some(status.clone());
        self.emit(ClientEvent::LearningStatus(status));
    }

    /// Record the poll health; emits only on change.
    pub fn set_connection(&self, state: &mut ClientState, connection: Connection) {
        if state.connection != Some(connection) {
            state.connection = Some(connection);
            self.emit(ClientEvent::Connection(connection));
        }
    }
}

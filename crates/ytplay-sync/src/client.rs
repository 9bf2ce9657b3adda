//! Client: wires the components onto one shared state and transport.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use ytplay_core::snapshot::{Snapshot, SnapshotOrigin};

use crate::busy::BusyIndicator;
use crate::config::ClientConfig;
use crate::coordinator::RequestCoordinator;
use crate::error::RequestError;
use crate::events::{ClientEvent, Connection, Status};
use crate::pages::PageLoader;
use crate::progress::ProgressConsumer;
use crate::state::Shared;
use crate::store::{FileStore, MemoryStore, SnapshotStore};
use crate::sync::StateSynchronizer;
use crate::transport::{HttpBackend, ReqwestBackend, Transport};

/// Busy indicator as last rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusyStatus {
    pub active: bool,
    pub headline: Option<String>,
    pub history: Vec<String>,
}

pub struct Client<B = ReqwestBackend> {
    shared: Shared,
    config: Arc<ClientConfig>,
    transport: Transport<B>,
    busy: BusyIndicator<B>,
    progress: ProgressConsumer<B>,
    sync: StateSynchronizer<B>,
    coordinator: RequestCoordinator<B>,
    pages: PageLoader<B>,
    shutdown: CancellationToken,
}

impl Client<ReqwestBackend> {
    /// Client over HTTP, persisting to `config.snapshot_path` when set.
    pub fn connect(config: ClientConfig) -> Result<Self, RequestError> {
        let backend = ReqwestBackend::new(&config.base_url)?;
        let store: Arc<dyn SnapshotStore> = match &config.snapshot_path {
            Some(path) => Arc::new(FileStore::new(path)),
            None => Arc::new(MemoryStore::new()),
        };
        Ok(Self::with_backend(config, backend, store))
    }
}

impl<B: HttpBackend> Client<B> {
    pub fn with_backend(config: ClientConfig, backend: B, store: Arc<dyn SnapshotStore>) -> Self {
        let config = Arc::new(config);
        let shared = Shared::new(&config);
        let transport = Transport::new(backend);

        let progress = ProgressConsumer::new(shared.clone(), transport.clone(), Arc::clone(&config));
        let busy = BusyIndicator::new(shared.clone(), progress.clone(), Arc::clone(&config));
        let sync = StateSynchronizer::new(
            shared.clone(),
            transport.clone(),
            busy.clone(),
            store,
            Arc::clone(&config),
        );
        let coordinator = RequestCoordinator::new(
            shared.clone(),
            transport.clone(),
            sync.clone(),
            busy.clone(),
            Arc::clone(&config),
        );
        let pages = PageLoader::new(shared.clone(), transport.clone(), Arc::clone(&config));

        Self {
            shared,
            config,
            transport,
            busy,
            progress,
            sync,
            coordinator,
            pages,
            shutdown: CancellationToken::new(),
        }
    }

    /// Restore the persisted snapshot and start the state poll timer.
    pub fn start(&self) -> JoinHandle<()> {
        info!(url = %self.config.base_url, "starting state sync");
        self.sync.restore();
        self.sync.spawn_timer(self.shutdown.child_token())
    }

    /// Stop the state poll timer.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.shared.subscribe()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &Transport<B> {
        &self.transport
    }

    pub fn busy(&self) -> &BusyIndicator<B> {
        &self.busy
    }

    pub fn progress(&self) -> &ProgressConsumer<B> {
        &self.progress
    }

    pub fn sync(&self) -> &StateSynchronizer<B> {
        &self.sync
    }

    pub fn coordinator(&self) -> &RequestCoordinator<B> {
        &self.coordinator
    }

    pub fn pages(&self) -> &PageLoader<B> {
        &self.pages
    }

    // ─── Read access ──────────────────────────────────────────────

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.shared.lock().snapshot.clone()
    }

    /// Snapshot replaced by the latest live poll.
    pub fn previous_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.shared.lock().previous.clone()
    }

    pub fn origin(&self) -> Option<SnapshotOrigin> {
        self.shared.lock().origin
    }

    pub fn connection(&self) -> Option<Connection> {
        self.shared.lock().connection
    }

    pub fn request_status(&self) -> Option<Status> {
        self.shared.lock().request_status.clone()
    }

    pub fn learning_status(&self) -> Option<Status> {
        self.shared.lock().learning_status.clone()
    }

    pub fn busy_status(&self) -> BusyStatus {
        let state = self.shared.lock();
        BusyStatus {
            active: state.busy.is_active(),
            headline: state.busy.headline().map(str::to_string),
            history: state.busy.history(),
        }
    }

    pub fn tables(&self) -> Vec<String> {
        self.shared.lock().tables.names.clone()
    }
}

impl<B> Drop for Client<B> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

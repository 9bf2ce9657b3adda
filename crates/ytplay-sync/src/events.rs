//! Typed notifications emitted by the engine to whatever renders it.

use std::fmt;
use std::sync::Arc;

use ytplay_core::pagination::{PageControls, PageView, RetryRequest};
use ytplay_core::snapshot::{CuratedQueue, Snapshot, SnapshotOrigin};

/// Health of the full-state poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    Online,
    Offline,
    /// Showing a persisted snapshot, no live poll has completed yet.
    Restored,
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Online => "daemon online",
            Self::Offline => "daemon offline",
            Self::Restored => "restored",
        })
    }
}

/// A status line and whether it reports a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
}

impl Status {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    Snapshot {
        snapshot: Arc<Snapshot>,
        origin: SnapshotOrigin,
    },
    /// Queue returned by a curation request, ahead of the follow-up poll.
    Curated(Arc<CuratedQueue>),
    Connection(Connection),
    RequestStatus(Status),
    LearningStatus(Status),
    Busy {
        active: bool,
    },
    BusyMessage {
        headline: Option<String>,
        history: Vec<String>,
    },
    TablesLoading,
    Tables(Vec<String>),
    TablesFailed {
        message: String,
    },
    PageLoading {
        resource: String,
        controls: PageControls,
    },
    Page(PageView),
    PageFailed {
        resource: String,
        message: String,
        controls: PageControls,
        retry: RetryRequest,
    },
}

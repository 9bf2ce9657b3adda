//! Client configuration: daemon address, timeouts, poll cadences.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ytplay_core::history::DEFAULT_HISTORY_CAP;
use ytplay_core::pagination::DEFAULT_PAGE_SIZE;
use ytplay_core::snapshot::SNAPSHOT_STORAGE_KEY;
use ytplay_core::view::DEFAULT_QUEUE_WINDOW;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:17845";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Control commands, votes, learning and table loads.
    pub control_timeout: Duration,
    pub state_timeout: Duration,
    pub progress_timeout: Duration,
    /// Curation can take minutes.
    pub play_timeout: Duration,
    pub state_poll_interval: Duration,
    pub progress_poll_interval: Duration,
    pub placeholder_interval: Duration,
    pub history_cap: usize,
    pub page_size: u64,
    pub queue_window: usize,
    /// Where the last snapshot is persisted. `None` keeps it in memory only.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            control_timeout: Duration::from_secs(10),
            state_timeout: Duration::from_secs(5),
            progress_timeout: Duration::from_secs(5),
            play_timeout: Duration::from_secs(120),
            state_poll_interval: Duration::from_secs(5),
            progress_poll_interval: Duration::from_millis(1200),
            placeholder_interval: Duration::from_millis(1400),
            history_cap: DEFAULT_HISTORY_CAP,
            page_size: DEFAULT_PAGE_SIZE,
            queue_window: DEFAULT_QUEUE_WINDOW,
            snapshot_path: None,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Persist the snapshot as `<dir>/ytplay_last_state.json`.
    pub fn with_state_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.snapshot_path = Some(snapshot_file(dir.as_ref()));
        self
    }
}

pub fn snapshot_file(dir: &Path) -> PathBuf {
    dir.join(format!("{SNAPSHOT_STORAGE_KEY}.json"))
}

/// `$XDG_STATE_HOME/ytplay`, else `$HOME/.local/state/ytplay`, else
/// `/tmp/ytplay-$USER`.
pub fn default_state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_STATE_HOME") {
        if !dir.is_empty() {
            return PathBuf::from(dir).join("ytplay");
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return PathBuf::from(home).join(".local/state/ytplay");
        }
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    PathBuf::from(format!("/tmp/ytplay-{user}"))
}

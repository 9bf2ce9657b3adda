//! Snapshot: the authoritative view of the daemon's playback state.
//!
//! A snapshot is replaced wholesale on every successful full-state poll and
//! never merged field by field.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lenient::{or_default, skip_malformed};

/// Fixed name of the persisted snapshot blob.
pub const SNAPSHOT_STORAGE_KEY: &str = "ytplay_last_state";

// ─── Tracks ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(rename = "videoId", default, deserialize_with = "or_default")]
    pub video_id: Option<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub artist: Option<String>,
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub thumbnail: Option<String>,
    /// Per-track curation source override.
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub curation: Option<String>,
}

impl Track {
    pub fn title_or_unknown(&self) -> &str {
        non_blank(self.title.as_deref()).unwrap_or("Unknown")
    }

    pub fn artist_or_unknown(&self) -> &str {
        non_blank(self.artist.as_deref()).unwrap_or("Unknown")
    }

    /// Identifier usable for votes and learning, if present and non-blank.
    pub fn id(&self) -> Option<&str> {
        non_blank(self.video_id.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ─── Curation source ──────────────────────────────────────────────

/// Which curator produced the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurationSource {
    OpenAi,
    Fallback,
}

impl CurationSource {
    /// Normalize a raw tag: only `"openai"` maps to [`CurationSource::OpenAi`].
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("openai") => Self::OpenAi,
            _ => Self::Fallback,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Fallback => "fallback",
        }
    }

    /// Short badge shown next to a queued track.
    pub fn badge(self) -> &'static str {
        match self {
            Self::OpenAi => "ai",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for CurationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Extras & learning ────────────────────────────────────────────

/// Parameters the daemon resolved for the last curation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extras {
    #[serde(default, deserialize_with = "or_default")]
    pub seed: Option<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub mood: Option<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub lang: Option<String>,
    #[serde(default, deserialize_with = "skip_malformed")]
    pub avoid: Vec<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub mix: Option<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub vibe: Option<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub max_tracks: Option<u64>,
    #[serde(default, deserialize_with = "or_default")]
    pub ttl_hours: Option<u64>,
}

/// Stored learning feedback for the current track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Learning {
    #[serde(default, deserialize_with = "or_default")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "or_default")]
    pub energy: Option<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub tempo: Option<String>,
}

// ─── Snapshot ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "or_default")]
    pub current: Option<Track>,
    #[serde(default, deserialize_with = "or_default")]
    pub paused: bool,
    #[serde(default, deserialize_with = "skip_malformed")]
    pub queue: Vec<Track>,
    #[serde(default, deserialize_with = "or_default")]
    pub current_index: i64,
    #[serde(default, deserialize_with = "or_default")]
    pub position: Option<f64>,
    #[serde(default, deserialize_with = "or_default")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "or_default")]
    pub prompt: Option<String>,
    /// Seed track resolved for the last prompt.
    #[serde(default, deserialize_with = "or_default")]
    pub seed: Option<Track>,
    #[serde(default, deserialize_with = "or_default")]
    pub debug: serde_json::Map<String, serde_json::Value>,
    #[serde(default, deserialize_with = "or_default")]
    pub debug_ui: bool,
    #[serde(default, deserialize_with = "or_default")]
    pub auth: bool,
    #[serde(default, deserialize_with = "or_default")]
    pub learning: Option<Learning>,
    #[serde(default, deserialize_with = "or_default")]
    pub extras: Extras,
}

impl Snapshot {
    /// Current queue index, negative values clamped to zero.
    pub fn current_index(&self) -> usize {
        usize::try_from(self.current_index).unwrap_or(0)
    }

    /// Queue-wide curation source derived from the debug payload.
    pub fn curation_source(&self) -> CurationSource {
        let llm = self
            .debug
            .get("curation_source")
            .and_then(|v| v.as_str())
            .is_some_and(|s| s.eq_ignore_ascii_case("llm"));
        if llm {
            CurationSource::OpenAi
        } else {
            CurationSource::Fallback
        }
    }

    /// Curation source for one queued track (per-track tag wins).
    pub fn track_source(&self, track: &Track) -> CurationSource {
        match track.curation.as_deref() {
            Some(tag) => CurationSource::from_tag(Some(tag)),
            None => self.curation_source(),
        }
    }

    pub fn current_track_id(&self) -> Option<&str> {
        self.current.as_ref().and_then(Track::id)
    }
}

// ─── Curation response ────────────────────────────────────────────

/// Immediate answer of a curation request, shown until the next full-state
/// poll replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CuratedQueue {
    #[serde(default, deserialize_with = "or_default")]
    pub count: Option<u64>,
    #[serde(default, deserialize_with = "skip_malformed")]
    pub queue: Vec<Track>,
    #[serde(default, deserialize_with = "or_default")]
    pub prompt: Option<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub seed: Option<Track>,
}

impl CuratedQueue {
    /// Reported track count, else the length of the returned queue.
    pub fn track_count(&self) -> u64 {
        self.count.unwrap_or(self.queue.len() as u64)
    }
}

/// Snapshot as persisted for offline restoration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    pub saved_at: DateTime<Utc>,
    pub data: Snapshot,
}

impl PersistedSnapshot {
    pub fn new(data: Snapshot, saved_at: DateTime<Utc>) -> Self {
        Self { saved_at, data }
    }
}

/// Where the snapshot currently shown came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOrigin {
    /// Fetched from the daemon.
    Live { received_at: DateTime<Utc> },
    /// Restored from the persisted copy at startup.
    Restored { saved_at: DateTime<Utc> },
}

impl SnapshotOrigin {
    pub fn is_restored(&self) -> bool {
        matches!(self, Self::Restored { .. })
    }

    /// Label and timestamp for the "last updated" line.
    pub fn label(&self) -> (&'static str, DateTime<Utc>) {
        match *self {
            Self::Live { received_at } => ("last updated", received_at),
            Self::Restored { saved_at } => ("restored", saved_at),
        }
    }
}

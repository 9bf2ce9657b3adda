//! Pure projections of a [`Snapshot`] used by renderers.

use std::collections::HashSet;

use crate::format::{format_time, format_track};
use crate::snapshot::{CurationSource, Snapshot, Track};

/// Number of queued tracks shown from the current index onward.
pub const DEFAULT_QUEUE_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueTag {
    Now,
    Next,
}

impl QueueTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Now => "now",
            Self::Next => "next",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueRow {
    /// Position in the full queue (zero based).
    pub index: usize,
    pub track: Track,
    pub tag: QueueTag,
    pub source: CurationSource,
    /// Not present in the previous snapshot's queue.
    pub is_new: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueView {
    pub rows: Vec<QueueRow>,
    pub total: usize,
}

impl QueueView {
    /// `"{shown} of {total}"`, or `"0 tracks"` for an empty queue.
    pub fn count_label(&self) -> String {
        if self.total == 0 {
            "0 tracks".to_string()
        } else {
            format!("{} of {}", self.rows.len(), self.total)
        }
    }
}

/// Window of `window` tracks starting at the current index.
pub fn queue_window(snapshot: &Snapshot, previous: Option<&Snapshot>, window: usize) -> QueueView {
    let start = snapshot.current_index();
    let prev_ids: HashSet<Option<&str>> = previous
        .map(|p| p.queue.iter().map(|t| t.video_id.as_deref()).collect())
        .unwrap_or_default();

    let rows = snapshot
        .queue
        .iter()
        .enumerate()
        .skip(start)
        .take(window)
        .map(|(index, track)| QueueRow {
            index,
            track: track.clone(),
            tag: if index == start { QueueTag::Now } else { QueueTag::Next },
            source: snapshot.track_source(track),
            is_new: !prev_ids.contains(&track.video_id.as_deref()),
        })
        .collect();

    QueueView {
        rows,
        total: snapshot.queue.len(),
    }
}

/// Playback progress bar state.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackProgress {
    pub enabled: bool,
    pub elapsed: u64,
    pub duration: u64,
    pub percent: f64,
}

impl PlaybackProgress {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let duration = snapshot
            .duration
            .filter(|d| d.is_finite() && *d > 0.0);
        let Some(duration) = duration else {
            return Self {
                enabled: false,
                elapsed: 0,
                duration: 0,
                percent: 0.0,
            };
        };
        let max = duration.floor() as u64;
        let position = snapshot
            .position
            .filter(|p| p.is_finite() && *p >= 0.0)
            .unwrap_or(0.0);
        let elapsed = (position.floor() as u64).min(max);
        let percent = if max > 0 {
            elapsed as f64 / max as f64 * 100.0
        } else {
            0.0
        };
        Self {
            enabled: true,
            elapsed,
            duration: max,
            percent,
        }
    }

    /// `"1:05 / 3:20"`.
    pub fn label(&self) -> String {
        format!(
            "{} / {}",
            format_time(self.elapsed as f64),
            format_time(self.duration as f64)
        )
    }
}

/// `"track N - playing|paused"`, or `"playlist idle"` with nothing loaded.
pub fn now_playing_line(snapshot: &Snapshot) -> String {
    match &snapshot.current {
        None if snapshot.paused => "paused".to_string(),
        None => "playlist idle".to_string(),
        Some(_) => {
            let status = if snapshot.paused { "paused" } else { "playing" };
            format!("track {} - {status}", snapshot.current_index() + 1)
        }
    }
}

pub fn prompt_line(snapshot: &Snapshot) -> String {
    let prompt = snapshot.prompt.as_deref().filter(|p| !p.is_empty());
    let Some(prompt) = prompt else {
        return "Prompt: -".to_string();
    };
    match &snapshot.seed {
        Some(seed) if seed.title.as_deref().is_some_and(|t| !t.is_empty()) => {
            format!("Prompt: {prompt} (seed: {})", format_track(Some(seed)))
        }
        _ => format!("Prompt: {prompt}"),
    }
}

/// Debug panel visibility: only live snapshots may enable it.
pub fn show_debug(snapshot: &Snapshot, restored: bool) -> bool {
    snapshot.debug_ui && !restored
}

//! Plain-text rendering of snapshots, events and table pages.

use chrono::{DateTime, Local, Utc};

use ytplay_core::format::format_track;
use ytplay_core::pagination::PageView;
use ytplay_core::snapshot::{CuratedQueue, Snapshot, SnapshotOrigin};
use ytplay_core::view::{PlaybackProgress, QueueView, now_playing_line, prompt_line, queue_window};
use ytplay_sync::events::{ClientEvent, Status};

fn timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

fn status_line(prefix: &str, status: &Status) -> String {
    if status.is_error {
        format!("{prefix}: error: {}", status.text)
    } else {
        format!("{prefix}: {}", status.text)
    }
}

/// Now playing, progress, prompt and the queue window.
pub fn snapshot_lines(
    snapshot: &Snapshot,
    previous: Option<&Snapshot>,
    origin: Option<SnapshotOrigin>,
    window: usize,
) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "{}  [{}]",
        format_track(snapshot.current.as_ref()),
        now_playing_line(snapshot)
    ));

    let progress = PlaybackProgress::from_snapshot(snapshot);
    if progress.enabled {
        lines.push(format!("  {} ({:.0}%)", progress.label(), progress.percent));
    }
    lines.push(format!("  {}", prompt_line(snapshot)));
    if let Some(origin) = origin {
        let (label, at) = origin.label();
        lines.push(format!("  {label} {}", timestamp(at)));
    }

    let queue = queue_window(snapshot, previous, window);
    lines.push(format!("Queue ({})", queue.count_label()));
    lines.extend(queue_lines(&queue));
    lines
}

fn queue_lines(queue: &QueueView) -> Vec<String> {
    queue
        .rows
        .iter()
        .map(|row| {
            let marker = if row.is_new { "+" } else { " " };
            format!(
                "{marker}{:>3}. {:<4} {} [{}]",
                row.index + 1,
                row.tag.as_str(),
                format_track(Some(&row.track)),
                row.source.badge()
            )
        })
        .collect()
}

/// One line per event; `None` for events the watch view shows elsewhere.
pub fn event_line(event: &ClientEvent, show_progress: bool) -> Option<String> {
    match event {
        ClientEvent::Snapshot { .. } => None,
        ClientEvent::Curated(curated) => Some(curated_line(curated)),
        ClientEvent::Connection(conn) => Some(format!("-- {conn}")),
        ClientEvent::RequestStatus(status) => Some(status_line("request", status)),
        ClientEvent::LearningStatus(status) => Some(status_line("learning", status)),
        ClientEvent::Busy { active } => Some(if *active { "-- busy" } else { "-- idle" }.to_string()),
        ClientEvent::BusyMessage { headline, .. } if show_progress => {
            headline.as_ref().map(|h| format!("   {h}"))
        }
        ClientEvent::BusyMessage { .. } => None,
        ClientEvent::TablesLoading => Some("tables: loading...".to_string()),
        ClientEvent::Tables(names) if names.is_empty() => Some("tables: empty".to_string()),
        ClientEvent::Tables(names) => Some(format!("tables: {}", names.join(", "))),
        ClientEvent::TablesFailed { message } => Some(format!("tables: error: {message}")),
        ClientEvent::PageLoading { resource, controls } => {
            Some(format!("{resource}: {}", controls.status))
        }
        ClientEvent::Page(view) => Some(format!("{}: {}", view.key.resource, view.controls.status)),
        ClientEvent::PageFailed {
            resource, message, ..
        } => Some(format!("{resource}: error: {message} (retry with --refresh)")),
    }
}

fn curated_line(curated: &CuratedQueue) -> String {
    let mut line = format!("curated: {} queued", curated.queue.len());
    if let Some(prompt) = curated.prompt.as_deref().filter(|p| !p.trim().is_empty()) {
        line.push_str(&format!(" for \"{prompt}\""));
    }
    if let Some(seed) = &curated.seed {
        line.push_str(&format!(", seed {}", format_track(Some(seed))));
    }
    line
}

/// Tab-separated header and rows, followed by the status line.
pub fn page_lines(view: &PageView) -> Vec<String> {
    let mut lines = Vec::with_capacity(view.page.rows.len() + 2);
    if view.is_empty() {
        lines.push("(no rows)".to_string());
    } else {
        lines.push(view.page.columns.join("\t"));
        for row in view.cells() {
            let cells: Vec<&str> = row.iter().map(|c| c.text.as_str()).collect();
            lines.push(cells.join("\t"));
        }
    }
    let mut status = view.controls.status.clone();
    if view.from_cache {
        status.push_str(" (cached)");
    }
    lines.push(status);
    lines
}

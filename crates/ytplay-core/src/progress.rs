//! Incremental progress log: wire types and the deduplicating cursor.

use serde::{Deserialize, Deserializer, Serialize};

use crate::lenient::{or_default, skip_malformed};

/// One entry of the daemon's progress log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressLine {
    pub id: u64,
    pub msg: String,
}

/// Payload of the incremental progress endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressBatch {
    /// Renderable lines only: entries without a numeric id or a non-empty
    /// message are dropped individually.
    #[serde(default, deserialize_with = "renderable_lines")]
    pub lines: Vec<ProgressLine>,
    #[serde(default, deserialize_with = "or_default")]
    pub latest_id: Option<u64>,
}

fn renderable_lines<'de, D>(deserializer: D) -> Result<Vec<ProgressLine>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut lines: Vec<ProgressLine> = skip_malformed(deserializer)?;
    lines.retain(|line| !line.msg.is_empty());
    Ok(lines)
}

impl ProgressBatch {
    /// Highest identifier the batch knows about (lines or `latest_id`).
    pub fn high_water(&self) -> Option<u64> {
        let from_lines = self.lines.iter().map(|l| l.id).max();
        match (from_lines, self.latest_id) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Highest progress identifier already rendered.
///
/// `None` means unknown: the next batch is adopted silently instead of being
/// replayed. The cursor never moves backwards while known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressCursor {
    last_id: Option<u64>,
}

impl ProgressCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_id(&self) -> Option<u64> {
        self.last_id
    }

    pub fn is_known(&self) -> bool {
        self.last_id.is_some()
    }

    /// Forget the position. The next batch resynchronizes without replay.
    pub fn reset(&mut self) {
        self.last_id = None;
    }

    /// Adopt the server's latest position without rendering anything.
    pub fn adopt(&mut self, batch: &ProgressBatch) {
        if let Some(high) = batch.high_water() {
            self.advance_to(high);
        }
    }

    /// Return the lines newer than the cursor, oldest first, and advance.
    ///
    /// An unknown cursor adopts the batch and returns nothing.
    pub fn take_fresh(&mut self, batch: &ProgressBatch) -> Vec<ProgressLine> {
        let Some(last) = self.last_id else {
            self.adopt(batch);
            return Vec::new();
        };

        let mut fresh: Vec<ProgressLine> = batch
            .lines
            .iter()
            .filter(|line| line.id > last)
            .cloned()
            .collect();
        fresh.sort_by_key(|line| line.id);
        fresh.dedup_by_key(|line| line.id);

        if let Some(newest) = fresh.last() {
            self.advance_to(newest.id);
        }
        if let Some(latest) = batch.latest_id {
            self.advance_to(latest);
        }
        fresh
    }

    fn advance_to(&mut self, id: u64) {
        self.last_id = Some(self.last_id.map_or(id, |cur| cur.max(id)));
    }
}

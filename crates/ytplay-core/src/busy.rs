//! Busy indicator state: reference count, placeholder rotation and the
//! progress cursor of the current busy period.
//!
//! The indicator is visible while at least one long operation is open.
//! Within one busy period the status line is fed by a rotating list of
//! filler messages until the first real progress event arrives; from then on
//! the progress stream is authoritative and the rotation stays suspended for
//! the rest of the period.

use crate::history::{DEFAULT_HISTORY_CAP, RecentHistory};
use crate::progress::{ProgressBatch, ProgressCursor};

/// Filler messages cycled while no real progress has been reported.
pub const PLACEHOLDER_MESSAGES: [&str; 6] = [
    "Warming up the curator...",
    "Scanning the stack...",
    "Picking the next track...",
    "Resolving stream URLs...",
    "Syncing the queue...",
    "Tuning the vibe...",
];

/// Effect of a `begin`/`end` call on visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyTransition {
    /// 0 → 1: show the indicator, start rotation and progress polling.
    Activated { epoch: u64 },
    /// 1 → 0: hide the indicator, stop everything, clear history.
    Deactivated,
    /// Count changed (or was already zero) without crossing the boundary.
    Unchanged,
}

/// Result of feeding a progress batch into the busy state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressApply {
    /// The batch belongs to a busy period that already ended.
    Stale,
    /// Nothing newer than the cursor.
    Nothing,
    /// `count` new lines were pushed into the history.
    Rendered { count: usize, suspended_placeholders: bool },
}

#[derive(Debug, Clone)]
pub struct BusyState {
    count: usize,
    /// Busy period number; bumps on every 0 → 1 transition.
    epoch: u64,
    history: RecentHistory,
    placeholder_index: usize,
    placeholders_running: bool,
    cursor: ProgressCursor,
}

impl BusyState {
    pub fn new(history_cap: usize) -> Self {
        Self {
            count: 0,
            epoch: 0,
            history: RecentHistory::new(history_cap),
            placeholder_index: 0,
            placeholders_running: false,
            cursor: ProgressCursor::new(),
        }
    }

    /// Open a long operation. An optional message is pushed immediately.
    pub fn begin(&mut self, message: Option<&str>) -> BusyTransition {
        let was_idle = self.count == 0;
        self.count += 1;
        if was_idle {
            self.epoch = self.epoch.saturating_add(1);
            self.placeholder_index = 0;
            self.placeholders_running = true;
            self.cursor.reset();
        }
        if let Some(msg) = message {
            self.history.push(msg);
        }
        if was_idle {
            BusyTransition::Activated { epoch: self.epoch }
        } else {
            BusyTransition::Unchanged
        }
    }

    /// Close a long operation. Extra calls are absorbed at zero.
    pub fn end(&mut self) -> BusyTransition {
        if self.count == 0 {
            return BusyTransition::Unchanged;
        }
        self.count -= 1;
        if self.count > 0 {
            return BusyTransition::Unchanged;
        }
        self.placeholders_running = false;
        self.placeholder_index = 0;
        self.history.clear();
        self.cursor.reset();
        BusyTransition::Deactivated
    }

    /// Advance the placeholder rotation by one step.
    ///
    /// Returns the pushed message, or `None` once the rotation is stopped.
    pub fn next_placeholder(&mut self) -> Option<&'static str> {
        if self.count == 0 || !self.placeholders_running {
            return None;
        }
        let msg = PLACEHOLDER_MESSAGES[self.placeholder_index % PLACEHOLDER_MESSAGES.len()];
        self.placeholder_index += 1;
        self.history.push(msg);
        Some(msg)
    }

    /// Adopt the server's latest progress id for `epoch` without rendering.
    pub fn resync_progress(&mut self, epoch: u64, batch: &ProgressBatch) -> bool {
        if !self.is_live(epoch) {
            return false;
        }
        self.cursor.adopt(batch);
        true
    }

    /// Render the lines of `batch` newer than the cursor.
    ///
    /// The first real line of a period suspends the placeholder rotation.
    pub fn apply_progress(&mut self, epoch: u64, batch: &ProgressBatch) -> ProgressApply {
        if !self.is_live(epoch) {
            return ProgressApply::Stale;
        }
        let fresh = self.cursor.take_fresh(batch);
        if fresh.is_empty() {
            return ProgressApply::Nothing;
        }
        let suspended_placeholders = self.placeholders_running;
        self.placeholders_running = false;
        for line in &fresh {
            self.history.push(&line.msg);
        }
        ProgressApply::Rendered {
            count: fresh.len(),
            suspended_placeholders,
        }
    }

    /// True while `epoch` is the current, still open busy period.
    pub fn is_live(&self, epoch: u64) -> bool {
        self.count > 0 && self.epoch == epoch
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_active(&self) -> bool {
        self.count > 0
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn placeholders_running(&self) -> bool {
        self.placeholders_running
    }

    pub fn headline(&self) -> Option<&str> {
        self.history.headline()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.entries()
    }

    pub fn cursor(&self) -> ProgressCursor {
        self.cursor
    }
}

impl Default for BusyState {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

//! Bounded, most-recent-first list of busy-status messages.

use std::collections::VecDeque;

/// Default number of messages kept.
pub const DEFAULT_HISTORY_CAP: usize = 4;

/// Recent status messages, newest first.
///
/// The newest entry is the headline shown as the primary status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentHistory {
    entries: VecDeque<String>,
    cap: usize,
}

impl RecentHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap),
            cap: cap.max(1),
        }
    }

    /// Push a message to the front.
    ///
    /// Blank messages and an immediate repeat of the current headline are
    /// ignored. Returns `true` if the history changed.
    pub fn push(&mut self, message: &str) -> bool {
        let msg = message.trim();
        if msg.is_empty() {
            return false;
        }
        if self.entries.front().is_some_and(|head| head == msg) {
            return false;
        }
        self.entries.push_front(msg.to_string());
        self.entries.truncate(self.cap);
        true
    }

    pub fn headline(&self) -> Option<&str> {
        self.entries.front().map(String::as_str)
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for RecentHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

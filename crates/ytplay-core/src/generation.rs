//! Generation counters: decide whether an in-flight response is still allowed
//! to apply.
//!
//! A response captures the generation current at issue time and is applied
//! only if that generation is still current when it arrives.

use std::collections::HashMap;

/// Single monotonic generation sequence.
///
/// Used for the control-action slot: every new action bumps the counter and
/// every older action becomes stale at that instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationCounter {
    current: u64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation and return it. All earlier generations are stale.
    pub fn advance(&mut self) -> u64 {
        self.current = self.current.saturating_add(1);
        self.current
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current == generation
    }
}

/// Independent generation sequences per key.
///
/// Stale detection is scoped to a single key: issuing for `"tracks"` never
/// invalidates an in-flight request for `"votes"`.
#[derive(Debug, Clone, Default)]
pub struct KeyedGenerations {
    map: HashMap<String, u64>,
}

impl KeyedGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next sequence number for `key`.
    pub fn issue(&mut self, key: &str) -> u64 {
        let entry = self.map.entry(key.to_string()).or_insert(0);
        *entry = entry.saturating_add(1);
        *entry
    }

    /// Latest sequence issued for `key`, if any.
    pub fn latest(&self, key: &str) -> Option<u64> {
        self.map.get(key).copied()
    }

    pub fn is_current(&self, key: &str, seq: u64) -> bool {
        self.latest(key) == Some(seq)
    }
}

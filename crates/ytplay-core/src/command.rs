//! User commands and the query parameters they send.
//!
//! Parameters are produced as ordered `(name, value)` pairs; blank values are
//! left in and dropped by the transport when the query string is built.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::snapshot::{Extras, Snapshot, Track};

pub type Params = Vec<(&'static str, String)>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("missing prompt")]
    MissingPrompt,
    #[error("no track to vote")]
    NoTrackToVote,
    #[error("no track")]
    NoTrack,
}

// ─── Control actions ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekTarget {
    /// Absolute position in seconds.
    Position(f64),
    /// Relative offset in seconds.
    Delta(f64),
}

/// Playback commands that go through the control slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlCommand {
    Next,
    Prev,
    Pause,
    Stop,
    /// Zero-based queue index.
    PlayIndex(usize),
    Seek(SeekTarget),
}

impl ControlCommand {
    /// Endpoint path segment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Prev => "prev",
            Self::Pause => "pause",
            Self::Stop => "stop",
            Self::PlayIndex(_) => "play_index",
            Self::Seek(_) => "seek",
        }
    }

    pub fn params(&self) -> Params {
        match *self {
            Self::PlayIndex(i) => vec![("i", i.to_string())],
            Self::Seek(SeekTarget::Position(pos)) => vec![("pos", pos.to_string())],
            Self::Seek(SeekTarget::Delta(delta)) => vec![("delta", delta.to_string())],
            _ => Vec::new(),
        }
    }

    /// Request-status text shown while the command is in flight.
    pub fn label(&self) -> String {
        match self {
            Self::Next => "skipping".to_string(),
            Self::Prev => "previous track".to_string(),
            Self::Pause => "toggling pause".to_string(),
            Self::Stop => "stopping".to_string(),
            Self::PlayIndex(i) => format!("playing #{}", i + 1),
            Self::Seek(_) => "seeking".to_string(),
        }
    }
}

// ─── Votes ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid vote direction: {0} (expected up or down)")]
pub struct ParseVoteError(String);

impl FromStr for VoteDirection {
    type Err = ParseVoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "like" | "+1" | "1" => Ok(Self::Up),
            "down" | "dislike" | "-1" => Ok(Self::Down),
            other => Err(ParseVoteError(other.to_string())),
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "up",
            Self::Down => "down",
        })
    }
}

impl VoteDirection {
    pub fn value(self) -> i8 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Up => "liked",
            Self::Down => "disliked",
        }
    }

    /// Vote parameters for the current track of `snapshot`.
    pub fn params(self, snapshot: Option<&Snapshot>) -> Result<Params, CommandError> {
        let track = current_with_id(snapshot).ok_or(CommandError::NoTrackToVote)?;
        let mut params = track_params(track);
        params.insert(1, ("v", self.value().to_string()));
        Ok(params)
    }
}

fn current_with_id(snapshot: Option<&Snapshot>) -> Option<&Track> {
    snapshot?.current.as_ref().filter(|t| t.id().is_some())
}

fn track_params(track: &Track) -> Params {
    vec![
        ("id", track.id().unwrap_or_default().to_string()),
        ("title", track.title.clone().unwrap_or_default()),
        ("artist", track.artist.clone().unwrap_or_default()),
    ]
}

// ─── Curation ─────────────────────────────────────────────────────

/// A curation request. With `recurate`, blank fields are filled from the
/// last snapshot's prompt and resolved extras.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayRequest {
    pub prompt: Option<String>,
    pub seed: Option<String>,
    pub mood: Option<String>,
    pub lang: Option<String>,
    pub avoid: Option<String>,
    pub mix: Option<String>,
    pub vibe: Option<String>,
    pub max_tracks: Option<u64>,
    pub ttl_hours: Option<u64>,
    pub recurate: bool,
}

impl PlayRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Self::default()
        }
    }

    pub fn recurate() -> Self {
        Self {
            recurate: true,
            ..Self::default()
        }
    }

    pub fn label(&self) -> &'static str {
        if self.recurate { "re-curating..." } else { "curating..." }
    }

    /// Resolve the `/play` parameters.
    pub fn params(&self, last: Option<&Snapshot>) -> Result<Params, CommandError> {
        let fallback = if self.recurate { last } else { None };
        let extras = fallback.map(|s| &s.extras);

        let prompt = pick(&self.prompt, || fallback.and_then(|s| s.prompt.clone()))
            .ok_or(CommandError::MissingPrompt)?;

        Ok(vec![
            ("q", prompt),
            ("seed", fill(&self.seed, extras, |e| e.seed.clone())),
            ("mood", fill(&self.mood, extras, |e| e.mood.clone())),
            ("lang", fill(&self.lang, extras, |e| e.lang.clone())),
            ("avoid", fill(&self.avoid, extras, |e| Some(e.avoid.join(",")))),
            ("mix", fill(&self.mix, extras, |e| e.mix.clone())),
            ("vibe", fill(&self.vibe, extras, |e| e.vibe.clone())),
            ("n", number(self.max_tracks.or(extras.and_then(|e| e.max_tracks)))),
            ("ttl", number(self.ttl_hours.or(extras.and_then(|e| e.ttl_hours)))),
        ])
    }
}

fn fill(
    own: &Option<String>,
    extras: Option<&Extras>,
    from: impl FnOnce(&Extras) -> Option<String>,
) -> String {
    pick(own, || extras.and_then(from)).unwrap_or_default()
}

fn number(value: Option<u64>) -> String {
    value.map(|n| n.to_string()).unwrap_or_default()
}

/// Own value if non-blank (trimmed), otherwise the fallback if non-blank.
fn pick(own: &Option<String>, fallback: impl FnOnce() -> Option<String>) -> Option<String> {
    let trimmed = own.as_deref().map(str::trim).filter(|s| !s.is_empty());
    match trimmed {
        Some(v) => Some(v.to_string()),
        None => fallback().filter(|s| !s.trim().is_empty()),
    }
}

// ─── Learning ─────────────────────────────────────────────────────

/// Feedback stored for the current track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LearningInput {
    pub score: Option<f64>,
    pub energy: Option<String>,
    pub tempo: Option<String>,
}

impl LearningInput {
    pub fn params(&self, snapshot: Option<&Snapshot>) -> Result<Params, CommandError> {
        let track = current_with_id(snapshot).ok_or(CommandError::NoTrack)?;
        let mut params = track_params(track);
        params.push((
            "score",
            self.score.filter(|s| s.is_finite()).map(|s| s.to_string()).unwrap_or_default(),
        ));
        params.push(("energy", self.energy.clone().unwrap_or_default()));
        params.push(("tempo", self.tempo.clone().unwrap_or_default()));
        Ok(params)
    }
}

//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use ytplay_core::command::{LearningInput, PlayRequest, SeekTarget, VoteDirection};
use ytplay_sync::config::{ClientConfig, DEFAULT_BASE_URL, default_state_dir};

#[derive(Parser, Debug)]
#[command(name = "ytplay", about = "Terminal client for the ytplay playback daemon")]
pub struct Cli {
    /// Daemon base URL
    #[arg(long, global = true, env = "YTPLAY_URL", default_value = DEFAULT_BASE_URL)]
    pub url: String,

    /// Directory holding the last-known snapshot (default: $XDG_STATE_HOME/ytplay)
    #[arg(long, global = true, env = "YTPLAY_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Follow playback, printing every change until Ctrl-C (default)
    Watch(WatchOpts),
    /// Skip to the next track
    Next,
    /// Go back one track
    Prev,
    /// Toggle pause
    Pause,
    /// Stop playback
    Stop,
    /// Seek to a position or by an offset
    Seek(SeekOpts),
    /// Jump to a queue position (zero based)
    PlayIndex { index: usize },
    /// Like or dislike the current track
    Vote { direction: VoteArg },
    /// Curate and start a new playlist
    Play(PlayOpts),
    /// Save learning data for the current track
    Learn(LearnOpts),
    /// Print the current playback state once
    State,
    /// List inspectable tables
    Tables,
    /// Print one page of a table
    Rows(RowsOpts),
}

#[derive(Args, Debug, Default)]
pub struct WatchOpts {
    /// Hide curation progress lines
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct SeekOpts {
    /// Absolute position in seconds
    #[arg(long)]
    pub pos: Option<f64>,
    /// Relative offset in seconds (negative to rewind)
    #[arg(long, allow_hyphen_values = true)]
    pub delta: Option<f64>,
}

impl SeekOpts {
    pub fn target(&self) -> Option<SeekTarget> {
        match (self.pos, self.delta) {
            (Some(pos), _) => Some(SeekTarget::Position(pos)),
            (None, Some(delta)) => Some(SeekTarget::Delta(delta)),
            (None, None) => None,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteArg {
    Up,
    Down,
}

impl From<VoteArg> for VoteDirection {
    fn from(arg: VoteArg) -> Self {
        match arg {
            VoteArg::Up => VoteDirection::Up,
            VoteArg::Down => VoteDirection::Down,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct PlayOpts {
    #[arg(long)]
    pub prompt: Option<String>,
    /// Seed track or artist
    #[arg(long)]
    pub seed: Option<String>,
    #[arg(long)]
    pub mood: Option<String>,
    #[arg(long)]
    pub lang: Option<String>,
    /// Comma-separated artists or genres to avoid
    #[arg(long)]
    pub avoid: Option<String>,
    #[arg(long)]
    pub mix: Option<String>,
    #[arg(long)]
    pub vibe: Option<String>,
    /// Maximum number of tracks
    #[arg(short = 'n', long = "max-tracks")]
    pub max_tracks: Option<u64>,
    /// Cache lifetime in hours
    #[arg(long = "ttl")]
    pub ttl_hours: Option<u64>,
    /// Fill blank fields from the last curation
    #[arg(long)]
    pub recurate: bool,
}

impl PlayOpts {
    pub fn request(&self) -> PlayRequest {
        PlayRequest {
            prompt: self.prompt.clone(),
            seed: self.seed.clone(),
            mood: self.mood.clone(),
            lang: self.lang.clone(),
            avoid: self.avoid.clone(),
            mix: self.mix.clone(),
            vibe: self.vibe.clone(),
            max_tracks: self.max_tracks,
            ttl_hours: self.ttl_hours,
            recurate: self.recurate,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct LearnOpts {
    #[arg(long)]
    pub score: Option<f64>,
    #[arg(long)]
    pub energy: Option<String>,
    #[arg(long)]
    pub tempo: Option<String>,
}

impl LearnOpts {
    pub fn input(&self) -> LearningInput {
        LearningInput {
            score: self.score,
            energy: self.energy.clone(),
            tempo: self.tempo.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct RowsOpts {
    pub table: String,
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: u64,
    /// Rows per page (defaults to the configured page size)
    #[arg(long)]
    pub limit: Option<u64>,
    /// Bypass the page cache
    #[arg(long)]
    pub refresh: bool,
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        let dir = self
            .state_dir
            .clone()
            .unwrap_or_else(default_state_dir);
        ClientConfig::default()
            .with_base_url(&self.url)
            .with_state_dir(dir)
    }
}

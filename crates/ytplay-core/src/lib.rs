//! ytplay-core: pure state machines and wire types for the ytplay client.
//!
//! Everything here is synchronous and I/O free. The async engine in
//! `ytplay-sync` owns one instance of each state machine and drives it from
//! network completions and timers.

pub mod busy;
pub mod command;
pub mod format;
pub mod generation;
pub mod history;
mod lenient;
pub mod pagination;
pub mod progress;
pub mod snapshot;
pub mod view;

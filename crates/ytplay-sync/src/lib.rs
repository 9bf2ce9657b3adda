//! ytplay-sync: async request coordination and state synchronization for the
//! ytplay client.
//!
//! All mutable client state lives in one [`state::ClientState`] behind a
//! single mutex. Components are cheap handles onto that state plus the shared
//! [`transport::Transport`]; they never hold the lock across an await.

pub mod busy;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod pages;
pub mod progress;
pub mod state;
pub mod store;
pub mod sync;
pub mod transport;

pub use client::Client;
pub use config::ClientConfig;
pub use error::RequestError;
pub use events::{ClientEvent, Connection, Status};

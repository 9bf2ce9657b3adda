//! Request coordinator: at most one logically current control action.
//!
//! Each action bumps the control generation and cancels the previous action's
//! token. An action only has effects while its generation is still current;
//! a superseded action returns without touching the status line.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use ytplay_core::command::{
    CommandError, ControlCommand, LearningInput, PlayRequest, SeekTarget, VoteDirection,
};
use ytplay_core::snapshot::CuratedQueue;

use crate::busy::BusyIndicator;
use crate::config::ClientConfig;
use crate::error::RequestError;
use crate::events::{ClientEvent, Status};
use crate::state::Shared;
use crate::sync::{PollOptions, StateSynchronizer};
use crate::transport::{Endpoint, HttpBackend, QueryParams, Transport};

/// Busy indicator message while the daemon curates.
pub const CURATING_MESSAGE: &str = "Curating...";

/// Handle of one control action.
#[derive(Debug, Clone)]
pub struct ControlTicket {
    pub cancel: CancellationToken,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    Applied,
    /// A newer action took over, or this one was cancelled.
    Superseded,
    Failed(RequestError),
    /// Rejected locally, no request was sent.
    Rejected(CommandError),
}

impl ControlOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Rejected(_))
    }
}

pub struct RequestCoordinator<B> {
    shared: Shared,
    transport: Transport<B>,
    sync: StateSynchronizer<B>,
    busy: BusyIndicator<B>,
    config: Arc<ClientConfig>,
}

impl<B> Clone for RequestCoordinator<B> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            transport: self.transport.clone(),
            sync: self.sync.clone(),
            busy: self.busy.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<B: HttpBackend> RequestCoordinator<B> {
    pub fn new(
        shared: Shared,
        transport: Transport<B>,
        sync: StateSynchronizer<B>,
        busy: BusyIndicator<B>,
        config: Arc<ClientConfig>,
    ) -> Self {
        Self {
            shared,
            transport,
            sync,
            busy,
            config,
        }
    }

    /// Cancel the current action and start a new generation.
    pub fn begin(&self) -> ControlTicket {
        let mut state = self.shared.lock();
        if let Some(previous) = state.control_cancel.take() {
            previous.cancel();
        }
        let cancel = CancellationToken::new();
        state.control_cancel = Some(cancel.clone());
        let generation = state.control.advance();
        ControlTicket { cancel, generation }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.shared.lock().control.is_current(generation)
    }

    /// Issue a control command, then a guarded state poll, then report idle.
    pub async fn run(&self, endpoint: Endpoint, params: QueryParams, label: &str) -> ControlOutcome {
        let ticket = self.begin();
        self.shared.set_request_status(Status::ok(label));

        let sent = self
            .transport
            .call(&endpoint, &params, self.config.control_timeout, Some(&ticket.cancel))
            .await;
        if let Err(e) = sent {
            return self.fail(&ticket, e);
        }
        if !self.is_current(ticket.generation) {
            return ControlOutcome::Superseded;
        }

        // Poll failures only affect the connection indicator.
        self.sync
            .poll(PollOptions {
                cancel: Some(ticket.cancel.clone()),
                guard: Some(ticket.generation),
            })
            .await;
        if !self.is_current(ticket.generation) {
            return ControlOutcome::Superseded;
        }

        self.shared.set_request_status(Status::ok("idle"));
        ControlOutcome::Applied
    }

    fn fail(&self, ticket: &ControlTicket, error: RequestError) -> ControlOutcome {
        if error.is_aborted() || !self.is_current(ticket.generation) {
            debug!(generation = ticket.generation, "control action superseded");
            return ControlOutcome::Superseded;
        }
        self.shared.set_request_status(Status::error(error.to_string()));
        ControlOutcome::Failed(error)
    }

    pub async fn control(&self, command: ControlCommand) -> ControlOutcome {
        self.run(
            Endpoint::Command(command.name()),
            command.params().into(),
            &command.label(),
        )
        .await
    }

    pub async fn next(&self) -> ControlOutcome {
        self.control(ControlCommand::Next).await
    }

    pub async fn prev(&self) -> ControlOutcome {
        self.control(ControlCommand::Prev).await
    }

    pub async fn pause(&self) -> ControlOutcome {
        self.control(ControlCommand::Pause).await
    }

    pub async fn stop(&self) -> ControlOutcome {
        self.control(ControlCommand::Stop).await
    }

    pub async fn seek(&self, target: SeekTarget) -> ControlOutcome {
        self.control(ControlCommand::Seek(target)).await
    }

    pub async fn play_index(&self, index: usize) -> ControlOutcome {
        self.control(ControlCommand::PlayIndex(index)).await
    }

    // ─── Uncoordinated actions ────────────────────────────────────
    // These never touch the control slot.

    /// Vote on the current track.
    pub async fn vote(&self, direction: VoteDirection) -> ControlOutcome {
        let params = {
            let state = self.shared.lock();
            direction.params(state.snapshot.as_deref())
        };
        let params = match params {
            Ok(p) => p,
            Err(e) => return self.reject(e),
        };
        self.shared.set_request_status(Status::ok(direction.label()));

        let sent = self
            .transport
            .call(
                &Endpoint::Command("vote"),
                &params.into(),
                self.config.control_timeout,
                None,
            )
            .await;
        match sent {
            Ok(_) => ControlOutcome::Applied,
            Err(e) => {
                self.shared.set_request_status(Status::error(e.to_string()));
                ControlOutcome::Failed(e)
            }
        }
    }

    /// Ask the daemon to curate a new queue, then refresh the state.
    ///
    /// The returned queue is announced as [`ClientEvent::Curated`] before the
    /// refresh; it never replaces the stored snapshot.
    pub async fn play(&self, request: PlayRequest) -> ControlOutcome {
        let params = {
            let state = self.shared.lock();
            request.params(state.snapshot.as_deref())
        };
        let params = match params {
            Ok(p) => p,
            Err(e) => return self.reject(e),
        };
        self.shared.set_request_status(Status::ok(request.label()));

        let _busy = self.busy.begin(Some(CURATING_MESSAGE));
        let sent = self
            .transport
            .call(
                &Endpoint::Command("play"),
                &params.into(),
                self.config.play_timeout,
                None,
            )
            .await;
        match sent {
            Ok(body) => {
                let curated = serde_json::from_value::<CuratedQueue>(body).unwrap_or_else(|e| {
                    debug!(error = %e, "curation reply not decodable");
                    CuratedQueue::default()
                });
                let count = curated.track_count();
                self.shared
                    .set_request_status(Status::ok(format!("playing {count} tracks")));
                self.shared.emit(ClientEvent::Curated(Arc::new(curated)));
                self.sync.poll(PollOptions::default()).await;
                ControlOutcome::Applied
            }
            Err(e) => {
                self.shared.set_request_status(Status::error(e.to_string()));
                ControlOutcome::Failed(e)
            }
        }
    }

    /// Store learning feedback for the current track.
    pub async fn save_learning(&self, input: LearningInput) -> ControlOutcome {
        let params = {
            let state = self.shared.lock();
            input.params(state.snapshot.as_deref())
        };
        let params = match params {
            Ok(p) => p,
            Err(e) => {
                self.shared.set_learning_status(Status::error(e.to_string()));
                return ControlOutcome::Rejected(e);
            }
        };
        self.shared.set_learning_status(Status::ok("saving..."));

        let sent = self
            .transport
            .call(
                &Endpoint::Command("learn"),
                &params.into(),
                self.config.control_timeout,
                None,
            )
            .await;
        match sent {
            Ok(_) => {
                self.shared.set_learning_status(Status::ok("saved"));
                ControlOutcome::Applied
            }
            Err(e) if e.is_aborted() => ControlOutcome::Superseded,
            Err(e) => {
                self.shared.set_learning_status(Status::error(e.to_string()));
                ControlOutcome::Failed(e)
            }
        }
    }

    fn reject(&self, error: CommandError) -> ControlOutcome {
        self.shared.set_request_status(Status::error(error.to_string()));
        ControlOutcome::Rejected(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_errors() {
        assert!(ControlOutcome::Rejected(CommandError::MissingPrompt).is_error());
        assert!(ControlOutcome::Failed(RequestError::Timeout).is_error());
        assert!(!ControlOutcome::Superseded.is_error());
        assert!(!ControlOutcome::Applied.is_error());
    }
}

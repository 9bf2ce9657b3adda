//! One-shot playback commands: controls, vote, play, learn, state.

use std::future::Future;

use tokio::sync::broadcast::error::RecvError;

use ytplay_core::command::ControlCommand;
use ytplay_sync::coordinator::ControlOutcome;
use ytplay_sync::sync::{PollOptions, PollOutcome};
use ytplay_sync::{Client, ClientConfig, ClientEvent, Status};

use crate::cli::{LearnOpts, PlayOpts, VoteArg};
use crate::render::{event_line, snapshot_lines};

/// What a one-shot command does once connected.
pub enum Action {
    Control(ControlCommand),
    Vote(VoteArg),
    Play(PlayOpts),
    Learn(LearnOpts),
}

impl Action {
    /// Whether the action reads the current snapshot before sending.
    fn needs_snapshot(&self) -> bool {
        match self {
            Self::Control(_) => false,
            Self::Vote(_) | Self::Learn(_) => true,
            Self::Play(opts) => opts.recurate,
        }
    }
}

/// Run `action` and print the resulting status. Returns the process exit code.
pub async fn cmd_action(config: ClientConfig, action: Action) -> anyhow::Result<i32> {
    let client = Client::connect(config)?;
    if action.needs_snapshot() {
        client.sync().restore();
        if let PollOutcome::Offline(err) = client.sync().poll(PollOptions::default()).await {
            tracing::debug!(%err, "state poll before command failed");
        }
    }

    let coordinator = client.coordinator();
    let outcome = match action {
        Action::Control(command) => coordinator.control(command).await,
        Action::Vote(direction) => coordinator.vote(direction.into()).await,
        Action::Play(opts) => with_progress(&client, coordinator.play(opts.request())).await,
        Action::Learn(opts) => {
            let outcome = coordinator.save_learning(opts.input()).await;
            print_status("learning", client.learning_status());
            return Ok(exit_code(&outcome));
        }
    };

    print_status("request", client.request_status());
    Ok(exit_code(&outcome))
}

/// `ytplay state`: one poll, falling back to the persisted snapshot.
pub async fn cmd_state(config: ClientConfig) -> anyhow::Result<i32> {
    let client = Client::connect(config)?;
    client.sync().restore();
    let outcome = client.sync().poll(PollOptions::default()).await;
    if let Some(conn) = client.connection() {
        println!("-- {conn}");
    }

    let Some(snapshot) = client.snapshot() else {
        if let PollOutcome::Offline(err) = outcome {
            eprintln!("Cannot reach daemon: {err}");
        }
        return Ok(1);
    };
    let previous = client.previous_snapshot();
    for line in snapshot_lines(
        &snapshot,
        previous.as_deref(),
        client.origin(),
        client.config().queue_window,
    ) {
        println!("{line}");
    }
    Ok(0)
}

/// Print busy headlines and the curated queue while `fut` runs.
async fn with_progress<F>(client: &Client, fut: F) -> ControlOutcome
where
    F: Future<Output = ControlOutcome>,
{
    let mut events = client.subscribe();
    tokio::pin!(fut);
    loop {
        tokio::select! {
            outcome = &mut fut => return outcome,
            event = events.recv() => match event {
                Ok(event @ (ClientEvent::BusyMessage { .. } | ClientEvent::Curated(_))) => {
                    if let Some(line) = event_line(&event, true) {
                        eprintln!("{line}");
                    }
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
        }
    }
    fut.await
}

fn print_status(prefix: &str, status: Option<Status>) {
    let Some(status) = status else {
        return;
    };
    let line = format!("{prefix}: {}", status.text);
    if status.is_error {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

fn exit_code(outcome: &ControlOutcome) -> i32 {
    if outcome.is_error() { 1 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ytplay_core::command::CommandError;
    use ytplay_sync::RequestError;

    #[test]
    fn snapshot_needed_only_for_track_actions() {
        assert!(!Action::Control(ControlCommand::Next).needs_snapshot());
        assert!(Action::Vote(VoteArg::Up).needs_snapshot());
        assert!(Action::Learn(LearnOpts::default()).needs_snapshot());
        assert!(!Action::Play(PlayOpts::default()).needs_snapshot());
        let recurate = PlayOpts {
            recurate: true,
            ..PlayOpts::default()
        };
        assert!(Action::Play(recurate).needs_snapshot());
    }

    #[test]
    fn errors_exit_non_zero() {
        assert_eq!(exit_code(&ControlOutcome::Applied), 0);
        assert_eq!(exit_code(&ControlOutcome::Failed(RequestError::Timeout)), 1);
        assert_eq!(
            exit_code(&ControlOutcome::Rejected(CommandError::MissingPrompt)),
            1
        );
    }
}

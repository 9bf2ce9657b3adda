//! `ytplay watch`: follow the daemon until Ctrl-C.

use tokio::sync::broadcast::error::RecvError;

use ytplay_sync::{Client, ClientConfig, ClientEvent};

use crate::render::{event_line, snapshot_lines};

/// Entry point for `ytplay watch`.
pub async fn cmd_watch(config: ClientConfig, show_progress: bool) -> anyhow::Result<()> {
    let client = Client::connect(config)?;
    let mut events = client.subscribe();
    let timer = client.start();

    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = tokio::signal::ctrl_c() => break,
        };
        match event {
            Ok(ClientEvent::Snapshot { snapshot, origin }) => {
                let previous = client.previous_snapshot();
                println!();
                for line in snapshot_lines(
                    &snapshot,
                    previous.as_deref(),
                    Some(origin),
                    client.config().queue_window,
                ) {
                    println!("{line}");
                }
            }
            Ok(event) => {
                if let Some(line) = event_line(&event, show_progress) {
                    println!("{line}");
                }
            }
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "event stream lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }

    client.shutdown();
    timer.await?;
    Ok(())
}

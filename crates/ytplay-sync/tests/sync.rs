mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;

use common::{ScriptedBackend, client, client_with_store, state_body, wait_until};
use ytplay_core::snapshot::{PersistedSnapshot, Snapshot, SnapshotOrigin};
use ytplay_sync::error::RequestError;
use ytplay_sync::events::{ClientEvent, Connection};
use ytplay_sync::store::{FileStore, MemoryStore, SnapshotStore};
use ytplay_sync::sync::{CONNECTING_MESSAGE, PollOptions, PollOutcome};

fn saved_at() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-02-14T21:30:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

fn persisted() -> PersistedSnapshot {
    let data: Snapshot = serde_json::from_value(state_body(33.0)).expect("snapshot");
    PersistedSnapshot::new(data, saved_at())
}

#[tokio::test]
async fn cold_start_offline_shows_restored_snapshot() {
    let backend = ScriptedBackend::new();
    backend.fail("/state", RequestError::Transport("connection refused".into()));
    let store = Arc::new(MemoryStore::with_snapshot(persisted()));
    let client = client_with_store(&backend, store);
    let mut events = client.subscribe();

    let origin = client.sync().restore();
    assert_eq!(origin, Some(SnapshotOrigin::Restored { saved_at: saved_at() }));
    assert_eq!(client.connection(), Some(Connection::Restored));

    let outcome = client.sync().poll(PollOptions::default()).await;
    assert!(matches!(outcome, PollOutcome::Offline(RequestError::Transport(_))));

    assert_eq!(client.snapshot().and_then(|s| s.position), Some(33.0));
    assert_eq!(
        client.origin(),
        Some(SnapshotOrigin::Restored { saved_at: saved_at() })
    );
    assert_eq!(client.connection(), Some(Connection::Offline));

    // A restored snapshot skips the connecting indicator.
    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(event, ClientEvent::Busy { active: true }),
            "busy indicator shown after restore"
        );
    }
}

#[tokio::test]
async fn live_poll_replaces_restored_snapshot() {
    let backend = ScriptedBackend::new();
    backend.reply("/state", state_body(90.0));
    let store = Arc::new(MemoryStore::with_snapshot(persisted()));
    let client = client_with_store(&backend, store.clone());

    client.sync().restore();
    assert_eq!(client.sync().poll(PollOptions::default()).await, PollOutcome::Applied);

    assert_eq!(client.snapshot().and_then(|s| s.position), Some(90.0));
    assert!(matches!(client.origin(), Some(SnapshotOrigin::Live { .. })));
    assert_eq!(client.connection(), Some(Connection::Online));
    // Restored data never counts as the previous live queue.
    assert!(client.previous_snapshot().is_none());
    assert_eq!(
        store.saved().and_then(|p| p.data.position),
        Some(90.0)
    );
}

#[tokio::test]
async fn null_state_fields_still_apply() {
    let backend = ScriptedBackend::new();
    backend.reply(
        "/state",
        json!({
            "ok": true,
            "debug": null,
            "paused": null,
            "current_index": null,
            "extras": null,
            "queue": [{"videoId": "abc", "title": null}]
        }),
    );
    let client = client(&backend);

    assert_eq!(client.sync().poll(PollOptions::default()).await, PollOutcome::Applied);
    assert_eq!(client.connection(), Some(Connection::Online));
    let snapshot = client.snapshot().expect("snapshot applied");
    assert!(snapshot.debug.is_empty());
    assert!(!snapshot.paused);
    assert_eq!(snapshot.queue.len(), 1);
    assert_eq!(snapshot.queue[0].title_or_unknown(), "Unknown");
}

#[tokio::test]
async fn restore_without_persisted_snapshot_is_noop() {
    let backend = ScriptedBackend::new();
    let client = client(&backend);
    assert_eq!(client.sync().restore(), None);
    assert!(client.snapshot().is_none());
    assert_eq!(client.connection(), None);
}

#[tokio::test]
async fn first_poll_shows_connecting() {
    let backend = ScriptedBackend::new();
    let gate = backend.gate("/state");
    let client = client(&backend);

    let sync = client.sync().clone();
    let poll = tokio::spawn(async move { sync.poll(PollOptions::default()).await });
    wait_until(|| backend.count("/state") == 1).await;

    let busy = client.busy_status();
    assert!(busy.active);
    assert_eq!(busy.headline.as_deref(), Some(CONNECTING_MESSAGE));

    gate.send(Ok(state_body(1.0))).expect("poll waiting");
    assert_eq!(poll.await.expect("join"), PollOutcome::Applied);
    assert!(!client.busy_status().active);

    // Only the very first poll shows it.
    backend.reply("/state", state_body(2.0));
    let mut events = client.subscribe();
    client.sync().poll(PollOptions::default()).await;
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, ClientEvent::Busy { .. }));
    }
}

#[tokio::test]
async fn failed_poll_keeps_last_good_snapshot() {
    let backend = ScriptedBackend::new();
    backend.reply("/state", state_body(10.0));
    backend.reply("/state", json!({"ok": false, "error": "player crashed"}));
    let client = client(&backend);

    client.sync().poll(PollOptions::default()).await;
    let outcome = client.sync().poll(PollOptions::default()).await;
    assert_eq!(
        outcome,
        PollOutcome::Offline(RequestError::Application("player crashed".into()))
    );
    assert_eq!(client.snapshot().and_then(|s| s.position), Some(10.0));
    assert_eq!(client.connection(), Some(Connection::Offline));
    // Background polls never write the request status.
    assert_eq!(client.request_status(), None);
}

#[tokio::test]
async fn aborted_poll_changes_nothing() {
    let backend = ScriptedBackend::new();
    backend.hang("/state");
    let client = client(&backend);

    let cancel = tokio_util::sync::CancellationToken::new();
    let sync = client.sync().clone();
    let token = cancel.clone();
    let poll = tokio::spawn(async move {
        sync.poll(PollOptions {
            cancel: Some(token),
            guard: None,
        })
        .await
    });
    wait_until(|| backend.count("/state") == 1).await;
    cancel.cancel();

    assert_eq!(poll.await.expect("join"), PollOutcome::Aborted);
    assert_eq!(client.connection(), None);
}

#[tokio::test]
async fn second_live_poll_keeps_previous_for_queue_marks() {
    let backend = ScriptedBackend::new();
    backend.reply("/state", state_body(1.0));
    backend.reply("/state", state_body(2.0));
    let client = client(&backend);

    client.sync().poll(PollOptions::default()).await;
    client.sync().poll(PollOptions::default()).await;
    assert_eq!(
        client.previous_snapshot().and_then(|s| s.position),
        Some(1.0)
    );
}

#[tokio::test]
async fn file_store_survives_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ytplay_last_state.json");

    let backend = ScriptedBackend::new();
    backend.reply("/state", state_body(61.0));
    let first = client_with_store(&backend, Arc::new(FileStore::new(&path)));
    first.sync().poll(PollOptions::default()).await;
    drop(first);

    let offline = ScriptedBackend::new();
    let second = client_with_store(&offline, Arc::new(FileStore::new(&path)));
    let origin = second.sync().restore();
    assert!(matches!(origin, Some(SnapshotOrigin::Restored { .. })));
    assert_eq!(second.snapshot().and_then(|s| s.position), Some(61.0));
}

#[tokio::test]
async fn persistence_failure_is_swallowed() {
    let dir = tempfile::tempdir().expect("tempdir");
    // A directory where the file should be makes every save fail.
    let path = dir.path().join("blocked");
    std::fs::create_dir_all(path.join("ytplay_last_state.json")).expect("mkdir");
    let store = FileStore::new(path.join("ytplay_last_state.json"));
    assert!(store.save(&persisted()).is_err());

    let backend = ScriptedBackend::new();
    backend.reply("/state", state_body(5.0));
    let client = client_with_store(&backend, Arc::new(store));
    assert_eq!(client.sync().poll(PollOptions::default()).await, PollOutcome::Applied);
    assert_eq!(client.connection(), Some(Connection::Online));
}

#[tokio::test(start_paused = true)]
async fn timer_polls_until_shutdown() {
    let backend = ScriptedBackend::new();
    backend.always("/state", state_body(0.0));
    backend.always("/progress", json!({"ok": true, "lines": [], "latest_id": 0}));
    let client = client(&backend);

    let timer = client.start();
    tokio::time::sleep(Duration::from_millis(10_500)).await;
    assert_eq!(backend.count("/state"), 3);

    client.shutdown();
    timer.await.expect("timer task");
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(backend.count("/state"), 3);
}

#[tokio::test(start_paused = true)]
async fn timer_survives_errors() {
    let backend = ScriptedBackend::new();
    let client = client(&backend);

    let _timer = client.start();
    tokio::time::sleep(Duration::from_millis(15_500)).await;
    assert_eq!(backend.count("/state"), 4);
    assert_eq!(client.connection(), Some(Connection::Offline));
}

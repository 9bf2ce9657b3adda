mod common;

use std::time::Duration;

use serde_json::json;

use common::{ScriptedBackend, client, ok, state_body, wait_until};
use ytplay_core::command::{CommandError, PlayRequest, SeekTarget, VoteDirection};
use ytplay_sync::Status;
use ytplay_sync::coordinator::ControlOutcome;
use ytplay_sync::error::RequestError;
use ytplay_sync::events::ClientEvent;
use ytplay_sync::sync::{PollOptions, PollOutcome};

#[tokio::test]
async fn second_seek_supersedes_first() {
    let backend = ScriptedBackend::new();
    let first_seek = backend.gate("/seek");
    backend.reply("/seek", ok());
    backend.reply("/state", state_body(58.0));
    let client = client(&backend);

    let coordinator = client.coordinator().clone();
    let first = tokio::spawn(async move { coordinator.seek(SeekTarget::Position(42.0)).await });
    wait_until(|| backend.count("/seek") == 1).await;

    let second = client.coordinator().seek(SeekTarget::Position(58.0)).await;
    assert_eq!(second, ControlOutcome::Applied);
    assert_eq!(first.await.expect("join"), ControlOutcome::Superseded);

    // The first request was aborted; a late reply has nowhere to go.
    let _ = first_seek.send(Ok(ok()));

    let seeks = backend.calls("/seek");
    assert_eq!(seeks[0].query.get("pos"), Some("42"));
    assert_eq!(seeks[1].query.get("pos"), Some("58"));
    assert_eq!(backend.count("/state"), 1);
    assert_eq!(client.snapshot().and_then(|s| s.position), Some(58.0));
    assert_eq!(client.request_status(), Some(Status::ok("idle")));
}

#[tokio::test]
async fn superseded_action_state_poll_is_dropped() {
    let backend = ScriptedBackend::new();
    backend.reply("/next", ok());
    let first_state = backend.gate("/state");
    backend.reply("/prev", ok());
    backend.reply("/state", state_body(7.0));
    let client = client(&backend);

    let coordinator = client.coordinator().clone();
    let first = tokio::spawn(async move { coordinator.next().await });
    wait_until(|| backend.count("/state") == 1).await;

    assert_eq!(client.coordinator().prev().await, ControlOutcome::Applied);
    assert_eq!(first.await.expect("join"), ControlOutcome::Superseded);
    let _ = first_state.send(Ok(state_body(999.0)));

    assert_eq!(client.snapshot().and_then(|s| s.position), Some(7.0));
}

#[tokio::test]
async fn generation_guard_drops_late_snapshot() {
    let backend = ScriptedBackend::new();
    let gate = backend.gate("/state");
    let client = client(&backend);

    let ticket = client.coordinator().begin();
    let sync = client.sync().clone();
    let poll = tokio::spawn(async move {
        sync.poll(PollOptions {
            cancel: None,
            guard: Some(ticket.generation),
        })
        .await
    });
    wait_until(|| backend.count("/state") == 1).await;

    let newer = client.coordinator().begin();
    assert!(newer.generation > ticket.generation);
    gate.send(Ok(state_body(12.0))).expect("poll still waiting");

    assert_eq!(poll.await.expect("join"), PollOutcome::Superseded);
    assert!(client.snapshot().is_none());
}

#[tokio::test]
async fn begin_cancels_previous_token() {
    let backend = ScriptedBackend::new();
    let client = client(&backend);
    let first = client.coordinator().begin();
    assert!(!first.cancel.is_cancelled());
    let second = client.coordinator().begin();
    assert!(first.cancel.is_cancelled());
    assert!(!second.cancel.is_cancelled());
    assert!(client.coordinator().is_current(second.generation));
    assert!(!client.coordinator().is_current(first.generation));
}

#[tokio::test]
async fn application_error_surfaces_message() {
    let backend = ScriptedBackend::new();
    backend.reply("/pause", json!({"ok": false, "error": "nothing playing"}));
    let client = client(&backend);

    let outcome = client.coordinator().pause().await;
    assert_eq!(
        outcome,
        ControlOutcome::Failed(RequestError::Application("nothing playing".into()))
    );
    assert_eq!(client.request_status(), Some(Status::error("nothing playing")));
    assert_eq!(backend.count("/state"), 0);
}

#[tokio::test(start_paused = true)]
async fn timeout_is_reported() {
    let backend = ScriptedBackend::new();
    backend.hang("/stop");
    let client = client(&backend);

    let outcome = client.coordinator().stop().await;
    assert_eq!(outcome, ControlOutcome::Failed(RequestError::Timeout));
    assert_eq!(client.request_status(), Some(Status::error("request timed out")));
}

#[tokio::test]
async fn offline_state_poll_still_reports_idle() {
    let backend = ScriptedBackend::new();
    backend.reply("/play_index", ok());
    let client = client(&backend);

    let outcome = client.coordinator().play_index(3).await;
    assert_eq!(outcome, ControlOutcome::Applied);
    assert_eq!(
        backend.calls("/play_index")[0].query.get("i"),
        Some("3")
    );
    assert_eq!(client.request_status(), Some(Status::ok("idle")));
    assert_eq!(client.connection(), Some(ytplay_sync::Connection::Offline));
}

#[tokio::test]
async fn vote_needs_a_current_track() {
    let backend = ScriptedBackend::new();
    let client = client(&backend);

    let outcome = client.coordinator().vote(VoteDirection::Up).await;
    assert_eq!(outcome, ControlOutcome::Rejected(CommandError::NoTrackToVote));
    assert_eq!(client.request_status(), Some(Status::error("no track to vote")));
    assert_eq!(backend.count("/vote"), 0);
}

#[tokio::test]
async fn vote_sends_track_and_does_not_touch_control_slot() {
    let backend = ScriptedBackend::new();
    backend.reply("/state", state_body(1.0));
    backend.reply("/vote", ok());
    let client = client(&backend);
    client.sync().poll(PollOptions::default()).await;

    let before = client.coordinator().begin();
    let outcome = client.coordinator().vote(VoteDirection::Down).await;
    assert_eq!(outcome, ControlOutcome::Applied);
    assert!(!before.cancel.is_cancelled());

    let vote = &backend.calls("/vote")[0];
    assert_eq!(vote.query.get("id"), Some("vid-a"));
    assert_eq!(vote.query.get("v"), Some("-1"));
    assert_eq!(vote.query.get("title"), Some("Alpha"));
    assert_eq!(client.request_status(), Some(Status::ok("disliked")));
}

#[tokio::test]
async fn play_without_prompt_is_rejected() {
    let backend = ScriptedBackend::new();
    let client = client(&backend);

    let outcome = client.coordinator().play(PlayRequest::default()).await;
    assert_eq!(outcome, ControlOutcome::Rejected(CommandError::MissingPrompt));
    assert_eq!(client.request_status(), Some(Status::error("missing prompt")));
    assert_eq!(backend.count("/play"), 0);
}

#[tokio::test]
async fn recurate_uses_last_snapshot_and_refreshes() {
    let backend = ScriptedBackend::new();
    backend.reply("/state", state_body(0.0));
    backend.reply("/play", json!({"ok": true, "count": 7}));
    backend.reply("/state", state_body(3.0));
    let client = client(&backend);
    client.sync().poll(PollOptions::default()).await;

    let outcome = client.coordinator().play(PlayRequest::recurate()).await;
    assert_eq!(outcome, ControlOutcome::Applied);

    let play = &backend.calls("/play")[0];
    assert_eq!(play.query.get("q"), Some("late night drive"));
    assert_eq!(play.query.get("mood"), Some("calm"));
    assert_eq!(play.query.get("avoid"), Some("metal"));
    assert_eq!(play.query.get("n"), Some("20"));
    assert_eq!(play.query.get("seed"), None);

    assert_eq!(client.request_status(), Some(Status::ok("playing 7 tracks")));
    assert_eq!(backend.count("/state"), 2);
    assert!(!client.busy_status().active);
}

#[tokio::test]
async fn curated_queue_is_announced_before_refresh() {
    let backend = ScriptedBackend::new();
    backend.reply(
        "/play",
        json!({
            "ok": true,
            "queue": [
                {"videoId": "q1", "title": "First", "artist": "Band"},
                {"videoId": "q2", "title": "Second", "artist": "Band"}
            ],
            "prompt": "rainy jazz",
            "seed": {"videoId": "s1", "title": "Seed", "artist": "Seeder"}
        }),
    );
    backend.reply("/state", state_body(0.0));
    let client = client(&backend);
    let mut events = client.subscribe();

    let outcome = client.coordinator().play(PlayRequest::new("rainy jazz")).await;
    assert_eq!(outcome, ControlOutcome::Applied);
    assert_eq!(client.request_status(), Some(Status::ok("playing 2 tracks")));

    let mut order = Vec::new();
    while let Ok(event) = events.try_recv() {
        match event {
            ClientEvent::Curated(curated) => {
                let ids: Vec<_> = curated.queue.iter().filter_map(|t| t.id()).collect();
                assert_eq!(ids, vec!["q1", "q2"]);
                assert_eq!(curated.prompt.as_deref(), Some("rainy jazz"));
                assert_eq!(curated.seed.as_ref().and_then(|s| s.id()), Some("s1"));
                order.push("curated");
            }
            ClientEvent::Snapshot { .. } => order.push("snapshot"),
            _ => {}
        }
    }
    assert_eq!(order, vec!["curated", "snapshot"]);

    // The stored snapshot only ever comes from the full-state poll.
    let snapshot = client.snapshot().expect("refreshed");
    assert_eq!(snapshot.current_track_id(), Some("vid-a"));
    assert!(client.previous_snapshot().is_none());
}

#[tokio::test]
async fn play_holds_busy_indicator_while_curating() {
    let backend = ScriptedBackend::new();
    let gate = backend.gate("/play");
    backend.always("/state", state_body(0.0));
    let client = client(&backend);

    let coordinator = client.coordinator().clone();
    let play = tokio::spawn(async move { coordinator.play(PlayRequest::new("rainy jazz")).await });
    wait_until(|| backend.count("/play") == 1).await;

    let busy = client.busy_status();
    assert!(busy.active);
    assert_eq!(busy.headline.as_deref(), Some("Curating..."));
    assert_eq!(client.request_status(), Some(Status::ok("curating...")));

    gate.send(Ok(json!({"ok": true, "count": 12}))).expect("play waiting");
    assert_eq!(play.await.expect("join"), ControlOutcome::Applied);
    wait_until(|| !client.busy_status().active).await;
}

#[tokio::test]
async fn learning_reports_through_its_own_status() {
    let backend = ScriptedBackend::new();
    backend.reply("/state", state_body(0.0));
    backend.reply("/learn", ok());
    let client = client(&backend);

    let input = ytplay_core::command::LearningInput {
        score: Some(0.8),
        energy: Some("high".into()),
        tempo: None,
    };
    let rejected = client.coordinator().save_learning(input.clone()).await;
    assert_eq!(rejected, ControlOutcome::Rejected(CommandError::NoTrack));
    assert_eq!(client.learning_status(), Some(Status::error("no track")));

    client.sync().poll(PollOptions::default()).await;
    let outcome = client.coordinator().save_learning(input).await;
    assert_eq!(outcome, ControlOutcome::Applied);
    assert_eq!(client.learning_status(), Some(Status::ok("saved")));
    let learn = &backend.calls("/learn")[0];
    assert_eq!(learn.query.get("score"), Some("0.8"));
    assert_eq!(learn.query.get("tempo"), None);
    // Request status belongs to control actions only.
    assert_eq!(client.request_status(), None);
}

#[tokio::test]
async fn rapid_actions_only_last_one_applies() {
    let backend = ScriptedBackend::new();
    let gates: Vec<_> = (0..3).map(|_| backend.gate("/next")).collect();
    backend.reply("/next", ok());
    backend.reply("/state", state_body(4.0));
    let client = client(&backend);

    let mut handles = Vec::new();
    for n in 1..=3 {
        let coordinator = client.coordinator().clone();
        handles.push(tokio::spawn(async move { coordinator.next().await }));
        wait_until(|| backend.count("/next") == n).await;
    }
    assert_eq!(client.coordinator().next().await, ControlOutcome::Applied);

    for gate in gates {
        let _ = gate.send(Ok(ok()));
    }
    for handle in handles {
        assert_eq!(handle.await.expect("join"), ControlOutcome::Superseded);
    }
    assert_eq!(backend.count("/state"), 1);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(client.request_status(), Some(Status::ok("idle")));
}

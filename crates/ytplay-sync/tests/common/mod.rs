#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::oneshot;

use ytplay_sync::Client;
use ytplay_sync::config::ClientConfig;
use ytplay_sync::error::RequestError;
use ytplay_sync::store::{MemoryStore, SnapshotStore};
use ytplay_sync::transport::{Endpoint, HttpBackend, QueryParams};

pub type Gate = oneshot::Sender<Result<Value, RequestError>>;

enum Reply {
    Now(Result<Value, RequestError>),
    Gated(oneshot::Receiver<Result<Value, RequestError>>),
    Hang,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub path: String,
    pub query: QueryParams,
}

#[derive(Default)]
struct Script {
    queued: HashMap<String, VecDeque<Reply>>,
    fallback: HashMap<String, Value>,
    calls: Vec<Call>,
}

/// In-memory daemon. Replies are queued per path and can be held back and
/// released in any order.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, path: &str, reply: Reply) {
        self.script
            .lock()
            .unwrap()
            .queued
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn reply(&self, path: &str, body: Value) {
        self.push(path, Reply::Now(Ok(body)));
    }

    pub fn fail(&self, path: &str, error: RequestError) {
        self.push(path, Reply::Now(Err(error)));
    }

    /// Queue a reply that is only delivered when the returned gate is used.
    pub fn gate(&self, path: &str) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.push(path, Reply::Gated(rx));
        tx
    }

    pub fn hang(&self, path: &str) {
        self.push(path, Reply::Hang);
    }

    /// Reply used whenever nothing is queued for `path`.
    pub fn always(&self, path: &str, body: Value) {
        self.script
            .lock()
            .unwrap()
            .fallback
            .insert(path.to_string(), body);
    }

    pub fn calls(&self, path: &str) -> Vec<Call> {
        self.script
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.path == path)
            .cloned()
            .collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.calls(path).len()
    }
}

impl HttpBackend for ScriptedBackend {
    async fn get(&self, endpoint: &Endpoint, query: &QueryParams) -> Result<Value, RequestError> {
        let path = endpoint.to_string();
        let reply = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(Call {
                path: path.clone(),
                query: query.clone(),
            });
            match script.queued.get_mut(&path).and_then(VecDeque::pop_front) {
                Some(reply) => reply,
                None => match script.fallback.get(&path) {
                    Some(body) => Reply::Now(Ok(body.clone())),
                    None => Reply::Now(Err(RequestError::Transport(format!(
                        "connection refused: {path}"
                    )))),
                },
            }
        };
        match reply {
            Reply::Now(result) => result,
            Reply::Gated(rx) => rx
                .await
                .unwrap_or_else(|_| Err(RequestError::Transport("gate dropped".into()))),
            Reply::Hang => std::future::pending().await,
        }
    }
}

pub fn client(backend: &ScriptedBackend) -> Client<ScriptedBackend> {
    client_with_store(backend, Arc::new(MemoryStore::new()))
}

pub fn client_with_store(
    backend: &ScriptedBackend,
    store: Arc<dyn SnapshotStore>,
) -> Client<ScriptedBackend> {
    Client::with_backend(ClientConfig::default(), backend.clone(), store)
}

pub fn state_body(position: f64) -> Value {
    json!({
        "ok": true,
        "current": {"videoId": "vid-a", "title": "Alpha", "artist": "Band"},
        "paused": false,
        "queue": [
            {"videoId": "vid-a", "title": "Alpha", "artist": "Band"},
            {"videoId": "vid-b", "title": "Beta", "artist": "Band"}
        ],
        "current_index": 0,
        "position": position,
        "duration": 240.0,
        "prompt": "late night drive",
        "extras": {"mood": "calm", "avoid": ["metal"], "max_tracks": 20}
    })
}

pub fn ok() -> Value {
    json!({"ok": true})
}

pub fn progress_body(ids: &[u64], latest: u64) -> Value {
    let lines: Vec<Value> = ids
        .iter()
        .map(|id| json!({"id": id, "msg": format!("step {id}")}))
        .collect();
    json!({"ok": true, "lines": lines, "latest_id": latest})
}

pub fn rows_body(ids: &[u64], total: Option<u64>) -> Value {
    let rows: Vec<Value> = ids.iter().map(|id| json!({"id": id, "title": format!("t{id}")})).collect();
    json!({"ok": true, "rows": rows, "columns": ["id", "title"], "total": total})
}

/// Poll `cond` until it holds; panics after about a second.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

//! Transport: one request primitive over the daemon's JSON envelope API.
//!
//! Every call races the backend fetch against its own timeout and an optional
//! caller cancellation token. Whichever fires first drops the in-flight
//! request. The two outcomes are reported as distinct errors.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use ytplay_core::command::Params;

use crate::error::RequestError;

// ─── Endpoints ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Full playback state.
    State,
    /// Incremental progress log.
    Progress,
    /// Fire-and-forget command such as `next` or `seek`.
    Command(&'static str),
    /// Table names of the inspection view.
    Tables,
    /// One page of rows of a table.
    TableRows(String),
}

impl Endpoint {
    /// Unencoded path segments.
    pub fn segments(&self) -> Vec<&str> {
        match self {
            Self::State => vec!["state"],
            Self::Progress => vec!["progress"],
            Self::Command(name) => vec![*name],
            Self::Tables => vec!["api", "db", "tables"],
            Self::TableRows(name) => vec!["api", "db", "table", name.as_str(), "rows"],
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for seg in self.segments() {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}

// ─── Query parameters ─────────────────────────────────────────────

/// Ordered query parameters. Blank values are never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: &str, value: impl fmt::Display) {
        let value = value.to_string();
        if value.trim().is_empty() {
            return;
        }
        self.pairs.push((key.to_string(), value));
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl From<Params> for QueryParams {
    fn from(params: Params) -> Self {
        let mut query = Self::new();
        for (key, value) in params {
            query.push(key, value);
        }
        query
    }
}

// ─── Backend ──────────────────────────────────────────────────────

/// Raw HTTP access: fetch `endpoint` and parse the JSON body.
///
/// Implementations report network failures as [`RequestError::Transport`] and
/// unparsable bodies as [`RequestError::Decode`]. Timeouts, cancellation and
/// the envelope check belong to [`Transport`].
pub trait HttpBackend: Send + Sync + 'static {
    fn get(
        &self,
        endpoint: &Endpoint,
        query: &QueryParams,
    ) -> impl Future<Output = Result<Value, RequestError>> + Send;
}

/// Production backend over one pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    client: reqwest::Client,
    base: Url,
}

impl ReqwestBackend {
    pub fn new(base_url: &str) -> Result<Self, RequestError> {
        let base = Url::parse(base_url)
            .map_err(|e| RequestError::Transport(format!("invalid daemon url {base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(RequestError::Transport(format!(
                "invalid daemon url {base_url}: not a base url"
            )));
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| RequestError::Transport(e.to_string()))?;
        Ok(Self { client, base })
    }

    /// Absolute URL for `endpoint`, path segments percent-encoded.
    pub fn url_for(&self, endpoint: &Endpoint, query: &QueryParams) -> Result<Url, RequestError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| RequestError::Transport("daemon url cannot carry a path".into()))?;
            segments.pop_if_empty();
            segments.extend(endpoint.segments());
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.pairs());
        }
        Ok(url)
    }
}

impl HttpBackend for ReqwestBackend {
    async fn get(&self, endpoint: &Endpoint, query: &QueryParams) -> Result<Value, RequestError> {
        let url = self.url_for(endpoint, query)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RequestError::Transport(e.to_string()))?;
        // The envelope decides success, not the HTTP status.
        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                RequestError::Decode(e.to_string())
            } else {
                RequestError::Transport(e.to_string())
            }
        })
    }
}

// ─── Transport ────────────────────────────────────────────────────

pub struct Transport<B> {
    backend: Arc<B>,
}

impl<B> Clone for Transport<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: HttpBackend> Transport<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Issue one request and return the ok envelope.
    ///
    /// Cancellation through `cancel` yields [`RequestError::Aborted`]; the
    /// deadline yields [`RequestError::Timeout`]. No retries.
    pub async fn call(
        &self,
        endpoint: &Endpoint,
        params: &QueryParams,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<Value, RequestError> {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(RequestError::Aborted);
        }

        let fetch = tokio::time::timeout(timeout, self.backend.get(endpoint, params));
        let outcome = match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(%endpoint, "request aborted");
                        return Err(RequestError::Aborted);
                    }
                    res = fetch => res,
                }
            }
            None => fetch.await,
        };

        let body = match outcome {
            Ok(res) => res?,
            Err(_elapsed) => {
                debug!(%endpoint, ?timeout, "request timed out");
                return Err(RequestError::Timeout);
            }
        };
        check_envelope(body)
    }

    /// [`call`](Self::call) and decode the envelope into `T`.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint,
        params: &QueryParams,
        timeout: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<T, RequestError> {
        let body = self.call(endpoint, params, timeout, cancel).await?;
        serde_json::from_value(body).map_err(|e| RequestError::Decode(e.to_string()))
    }
}

/// Accept an envelope whose `ok` is truthy, else surface its `error`.
pub fn check_envelope(body: Value) -> Result<Value, RequestError> {
    if body.get("ok").is_some_and(truthy) {
        return Ok(body);
    }
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or("request failed");
    Err(RequestError::Application(message.to_string()))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

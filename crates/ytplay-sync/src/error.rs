use thiserror::Error;

/// Failure of a single daemon request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Deadline exceeded before a response arrived.
    #[error("request timed out")]
    Timeout,
    /// Cancelled by the caller, usually because a newer request superseded it.
    #[error("request aborted")]
    Aborted,
    /// The envelope reported `ok: false`.
    #[error("{0}")]
    Application(String),
    #[error("{0}")]
    Transport(String),
    /// The envelope was ok but the payload had an unexpected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl RequestError {
    /// Aborted requests are never shown to the user.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

use std::fmt;

use http::StatusCode;
use thiserror::Error;

use crate::core::persistence::record::record_entity::RecordKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rejected by store: {0}")]
    Rejected(String),
}

impl StoreError {
    /// Only transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Transport(_))
    }

    /// Classify a non-success HTTP response from the store backend.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let msg = format!("{} {}", status.as_u16(), body.trim());

        if status == StatusCode::CONFLICT
            || (status.is_client_error() && rpc_status(body).as_deref() == Some("ABORTED"))
        {
            return StoreError::Conflict(msg);
        }

        match status {
            StatusCode::NOT_FOUND => StoreError::NotFound(msg),
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => StoreError::Transport(msg),
            s if s.is_server_error() => StoreError::Transport(msg),
            _ => StoreError::Rejected(msg),
        }
    }
}

/// `error.status` of a Google API error body, e.g. `{"error":{"status":"ABORTED"}}`.
fn rpc_status(body: &str) -> Option<String> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    v.get("error")?.get("status")?.as_str().map(str::to_string)
}

/// Helper for mapping any I/O-ish failure into a transport error
pub fn transport_error<E: ToString>(err: E) -> StoreError {
    StoreError::Transport(err.to_string())
}

/// Helper for mapping a failed handle acquisition into a connection error
pub fn connection_error<E: ToString>(err: E) -> StoreError {
    StoreError::Connection(err.to_string())
}

/// Step of a read-modify-write cycle, used to say where a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStep {
    Connect,
    Fetch,
    Persist,
    Close,
}

impl fmt::Display for UpdateStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpdateStep::Connect => "connect",
            UpdateStep::Fetch => "fetch",
            UpdateStep::Persist => "persist",
            UpdateStep::Close => "close",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
#[error("{step} failed for key {key}")]
pub struct RecordUpdateError {
    pub step: UpdateStep,
    pub key: RecordKey,
    #[source]
    pub source: StoreError,
}

impl RecordUpdateError {
    pub fn new(step: UpdateStep, key: &RecordKey, source: StoreError) -> Self {
        Self {
            step,
            key: key.clone(),
            source,
        }
    }
}

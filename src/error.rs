//! Error types for the fieldhouse pipeline.
//!
//! Errors surface at component boundaries only: record-level problems are
//! counted and dropped inside the component that saw them, league-level
//! failures are reported to the orchestrator without aborting the run.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FieldhouseError>;

#[derive(Error, Debug)]
pub enum FieldhouseError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("persist failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("skipping malformed league file {path}: {reason}")]
    Aggregate { path: PathBuf, reason: String },

    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error("configuration error: {message}")]
    Config { message: String },
}

impl FieldhouseError {
    pub fn config(message: impl Into<String>) -> Self {
        FieldhouseError::Config {
            message: message.into(),
        }
    }
}

/// Outbound request failures. `RateLimited` and `TimedOut` are only
/// reported after the retry budget is exhausted.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    TimedOut { url: String },

    #[error("rate limited by {provider} after {attempts} attempts")]
    RateLimited { provider: String, attempts: u32 },

    #[error("provider rejected request: HTTP {status}")]
    ProviderRejected { status: u16 },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response from {provider}: {reason}")]
    MalformedResponse { provider: String, reason: String },
}

/// Record-level normalization failure. Logged and counted by the
/// agent; never aborts the batch and never reaches the orchestrator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("record {record_index} dropped: {reason}")]
pub struct NormalizeError {
    pub record_index: usize,
    pub reason: NormalizeReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeReason {
    MissingRequired,
    BadEncoding,
    UnknownSport,
}

impl std::fmt::Display for NormalizeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NormalizeReason::MissingRequired => "missing_required",
            NormalizeReason::BadEncoding => "bad_encoding",
            NormalizeReason::UnknownSport => "unknown_sport",
        };
        write!(f, "{}", s)
    }
}

/// Vision path failures. Per-frame decode and inference problems
/// are recovered inside the worker by returning an empty detection set;
/// these variants cover the pool-level conditions.
#[derive(Error, Debug)]
pub enum VisionError {
    #[error("no primary detector available: {reason}")]
    ModelUnavailable { reason: String },

    #[error("frame decode failed: {reason}")]
    FrameDecode { reason: String },

    #[error("all worker queues full")]
    Backpressure,

    #[error("worker {worker_id} disconnected")]
    WorkerGone { worker_id: usize },

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("protocol error: {reason}")]
    Protocol { reason: String },
}

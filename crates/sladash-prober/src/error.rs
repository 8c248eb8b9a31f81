use sladash_core::{CheckKind, UnitLoadError};
use thiserror::Error;

/// Failure of a single outbound probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid API base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

/// Failure that aborts a whole check invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load work units: {0}")]
    UnitLoad(#[from] UnitLoadError),

    #[error("a {kind} check is already running")]
    AlreadyRunning { kind: CheckKind },

    #[error("invalid check request: {0}")]
    InvalidRequest(String),
}

//! Error types for icsync.

use thiserror::Error;

/// Errors that can occur while mirroring a calendar pair.
///
/// Fetch and parse errors are structural: they abort the pair they occur in
/// (and only that pair). Write errors are scoped to a single event and are
/// recorded as a failed outcome rather than propagated.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Fetching {url} returned HTTP {status}")]
    RemoteFetch {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Could not parse calendar from {context}: {message}")]
    Parse { context: String, message: String },

    #[error("Writing {url} returned HTTP {status}")]
    RemoteWrite {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// Result type alias for icsync operations.
pub type SyncResult<T> = Result<T, SyncError>;

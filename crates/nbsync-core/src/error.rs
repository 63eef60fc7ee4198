// ── Core error types ──
//
// Two tiers. `CoreError` ends a run: bad configuration, an unreachable
// instance, a source directory that does not exist. `RowError` fails a
// single row and the run moves on. The `From<nbsync_api::Error>` impl
// translates transport-layer errors into the run-level tier.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::schema::Collection;

/// Run-level error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to NetBox at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Filesystem errors ────────────────────────────────────────────
    #[error("Source directory not found: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed tabular file {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<nbsync_api::Error> for CoreError {
    fn from(err: nbsync_api::Error) -> Self {
        match err {
            nbsync_api::Error::Authentication { message }
            | nbsync_api::Error::Forbidden { message } => {
                CoreError::AuthenticationFailed { message }
            }
            nbsync_api::Error::InvalidToken(reason) => CoreError::Config {
                message: format!("Invalid API token: {reason}"),
            },
            nbsync_api::Error::Transport(ref e) if e.is_connect() || e.is_timeout() => {
                CoreError::ConnectionFailed {
                    url: e
                        .url()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| "<unknown>".into()),
                    reason: e.to_string(),
                }
            }
            nbsync_api::Error::Transport(e) => CoreError::Api {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            nbsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            nbsync_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            nbsync_api::Error::NotFound { path } => CoreError::Api {
                message: format!("Not found: {path}"),
                status: Some(404),
            },
            nbsync_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            nbsync_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Deserialization error: {message}"),
                status: None,
            },
        }
    }
}

// ── Row-level errors ─────────────────────────────────────────────────

/// Why a single input row could not be applied.
///
/// Recorded against the row's line number; the import continues with the
/// next row.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowError {
    #[error("{field}: no {collection} object matches {value:?}")]
    ReferenceNotFound {
        field: String,
        value: String,
        collection: Collection,
    },

    #[error("{field}: {count} {collection} objects match {value:?}")]
    ReferenceAmbiguous {
        field: String,
        value: String,
        collection: Collection,
        count: usize,
    },

    #[error("{field}: cannot read {value:?} as {expected}")]
    TypeCoercionFailed {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("{count} existing {collection} objects match {key}")]
    UpsertAmbiguous {
        collection: Collection,
        key: String,
        count: usize,
    },

    #[error("missing required field {field}")]
    MissingField { field: String },

    #[error("{field}: unsupported termination type {value:?}")]
    UnsupportedTermination { field: String, value: String },

    #[error("rejected: {message}")]
    RemoteRejected { message: String },

    /// The record itself could not be decoded.
    #[error("unreadable record: {reason}")]
    Malformed { reason: String },

    /// Credentials rejected or instance unreachable while on this row.
    #[error("NetBox unavailable: {message}")]
    RemoteUnavailable { message: String },
}

/// Failure while processing one row.
///
/// `Fatal` carries remote errors that will keep failing for every later
/// row (bad credentials, unreachable host). The importer decides whether
/// to abort on them.
#[derive(Debug, Error)]
pub enum RowFailure {
    #[error(transparent)]
    Row(#[from] RowError),

    #[error(transparent)]
    Fatal(nbsync_api::Error),
}

impl RowFailure {
    /// Classify a remote error raised while processing a row.
    pub fn from_remote(err: nbsync_api::Error) -> Self {
        if err.is_fatal() {
            Self::Fatal(err)
        } else {
            Self::Row(RowError::RemoteRejected {
                message: err.to_string(),
            })
        }
    }
}

//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use nbsync_config::ConfigError;
use nbsync_core::{Abort, AbortKind, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to NetBox at {url}")]
    #[diagnostic(
        code(nbsync::connection_failed),
        help(
            "Check that the instance is reachable.\n\
             Reason: {reason}\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(nbsync::auth_failed),
        help("Verify the API token (NETBOX_TOKEN) and that it may write to NetBox.")
    )]
    AuthFailed { message: String },

    #[error("No NetBox URL configured")]
    #[diagnostic(
        code(nbsync::missing_url),
        help("Pass --url, set NETBOX_URL (a .env file works), or add `url` to nbsync.toml.")
    )]
    MissingUrl,

    #[error("No NetBox API token configured")]
    #[diagnostic(
        code(nbsync::missing_token),
        help("Pass --token, set NETBOX_TOKEN (a .env file works), or add `token` to nbsync.toml.")
    )]
    MissingToken,

    // ── Run outcome ──────────────────────────────────────────────────

    #[error("Import aborted at {file}:{line}: {reason}")]
    #[diagnostic(
        code(nbsync::import_aborted),
        help("Rows before this point were applied. Fix the cause and re-run; the import is idempotent.")
    )]
    ImportAborted {
        kind: AbortKind,
        file: String,
        line: u64,
        reason: String,
    },

    #[error("{errored} row(s) failed, {unreadable} file(s) could not be read")]
    #[diagnostic(
        code(nbsync::rows_failed),
        help("See the summary above for each failed row. Re-run with -v for details.")
    )]
    RowsFailed { errored: usize, unreadable: usize },

    // ── Input ────────────────────────────────────────────────────────

    #[error("Source directory not found: {path}")]
    #[diagnostic(code(nbsync::source_not_found))]
    SourceNotFound { path: String },

    #[error("Cannot read {path}: {reason}")]
    #[diagnostic(code(nbsync::file_access))]
    FileAccess { path: String, reason: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(nbsync::api_error))]
    Api { status: Option<u16>, message: String },

    // ── Validation / configuration ───────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(nbsync::validation))]
    Validation { field: String, reason: String },

    #[error("Cannot load {path}: {reason}")]
    #[diagnostic(code(nbsync::dotenv))]
    Dotenv { path: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(nbsync::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Cannot render JSON: {0}")]
    #[diagnostic(code(nbsync::json))]
    Json(#[from] serde_json::Error),

    #[error("Cannot render YAML: {0}")]
    #[diagnostic(code(nbsync::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. }
            | Self::ImportAborted {
                kind: AbortKind::Connectivity,
                ..
            } => exit_code::CONNECTION,
            Self::AuthFailed { .. }
            | Self::MissingUrl
            | Self::MissingToken
            | Self::ImportAborted {
                kind: AbortKind::Authentication,
                ..
            } => exit_code::AUTH,
            Self::SourceNotFound { .. } | Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl From<Abort> for CliError {
    fn from(abort: Abort) -> Self {
        Self::ImportAborted {
            kind: abort.kind,
            file: abort.file,
            line: abort.line,
            reason: abort.reason,
        }
    }
}

// ── ConfigError → CliError mapping ──────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingUrl => Self::MissingUrl,
            ConfigError::MissingToken => Self::MissingToken,
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Dotenv { path, source } => Self::Dotenv {
                path: path.display().to_string(),
                reason: source.to_string(),
            },
            ConfigError::Figment(err) => Self::Config(err),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::SourceNotFound { path } => Self::SourceNotFound {
                path: path.display().to_string(),
            },
            CoreError::Io { path, source } => Self::FileAccess {
                path: path.display().to_string(),
                reason: source.to_string(),
            },
            CoreError::Csv { path, source } => Self::FileAccess {
                path: path.display().to_string(),
                reason: source.to_string(),
            },
            CoreError::Api { message, status } => Self::Api { status, message },
            CoreError::Config { message } => Self::Validation {
                field: "connection".into(),
                reason: message,
            },
        }
    }
}

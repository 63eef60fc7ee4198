use thiserror::Error;

/// Top-level error type for the `nbsync-api` crate.
///
/// Covers every failure mode of the REST client: authentication,
/// transport, and structured API rejections. `nbsync-core` decides which
/// of these abort a run and which only fail a single row.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token missing, expired, or unknown to the server (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Token is valid but lacks the required permission (HTTP 403).
    #[error("Permission denied: {message}")]
    Forbidden { message: String },

    /// The token cannot be encoded as an HTTP header value.
    #[error("Invalid API token: {0}")]
    InvalidToken(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Endpoint or object does not exist (HTTP 404).
    #[error("Not found: {path}")]
    NotFound { path: String },

    /// Any other non-success response. Field validation bodies are
    /// flattened into `field: message; field: message`.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

/// Validation message fragments NetBox emits when a create collides with an
/// existing object.
const UNIQUENESS_TOKENS: &[&str] = &[
    "already exists",
    "must be unique",
    "must make a unique set",
    "duplicate ip address",
    "unique constraint",
    "violates unique",
    "is violated",
    "tenant_unique_name",
    "tenant_unique_slug",
    "already has a cable",
];

impl Error {
    /// Returns `true` if the server rejected the credentials.
    ///
    /// Retrying cannot succeed until the token is fixed.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::Forbidden { .. } | Self::InvalidToken(_)
        )
    }

    /// Returns `true` if the request never produced an HTTP response.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::Tls(_) => true,
            _ => false,
        }
    }

    /// Returns `true` for failures that make every later request fail too.
    pub fn is_fatal(&self) -> bool {
        self.is_auth() || self.is_connectivity() || matches!(self, Self::InvalidUrl(_))
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// Returns `true` if a create was rejected because an equivalent object
    /// already exists.
    pub fn is_uniqueness_conflict(&self) -> bool {
        match self {
            Self::Api {
                status: 400 | 409,
                message,
            } => {
                let lower = message.to_lowercase();
                UNIQUENESS_TOKENS.iter().any(|tok| lower.contains(tok))
            }
            _ => false,
        }
    }

    /// HTTP status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

//! Settings for the nbsync CLI.
//!
//! Layered with figment: built-in defaults, then a TOML settings file,
//! then `NETBOX_*` environment variables (optionally seeded from `.env`
//! files). The result validates into `nbsync_core::ConnectionConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use nbsync_core::{ConnectionConfig, TlsVerification};

/// Prefix of every environment variable read into [`Settings`].
pub const ENV_PREFIX: &str = "NETBOX_";

/// Settings file looked up in the working directory.
pub const LOCAL_SETTINGS_FILE: &str = "nbsync.toml";

/// Dotenv files loaded before anything else, in order.
pub const DOTENV_FILES: &[&str] = &[".env", "netbox/.env"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no NetBox URL configured")]
    MissingUrl,

    #[error("no NetBox API token configured")]
    MissingToken,

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("cannot load {}: {source}", .path.display())]
    Dotenv {
        path: PathBuf,
        source: dotenvy::Error,
    },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Settings ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Instance URL (e.g., "https://netbox.example.com").
    pub url: Option<String>,

    /// API token (prefer `NETBOX_TOKEN` over the settings file).
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Request timeout in seconds.
    pub timeout: u64,

    /// Skip TLS certificate verification.
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,

    /// Objects requested per list page.
    pub page_size: u32,

    /// Consecutive connection failures tolerated during an import.
    pub max_failures: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout: 30,
            insecure: false,
            ca_cert: None,
            page_size: 250,
            max_failures: 1,
        }
    }
}

impl Settings {
    /// Validate into a connection description.
    pub fn into_connection(self) -> Result<ConnectionConfig, ConfigError> {
        let raw_url = self
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::MissingUrl)?;
        let url: Url = raw_url.trim().parse().map_err(|e| ConfigError::Validation {
            field: "url".into(),
            reason: format!("{e}: {raw_url}"),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "url".into(),
                reason: format!("expected an http or https URL, got '{}'", url.scheme()),
            });
        }

        let token = self
            .token
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .map(SecretString::from)
            .ok_or(ConfigError::MissingToken)?;

        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least one second".into(),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::Validation {
                field: "page_size".into(),
                reason: "must be positive".into(),
            });
        }

        let tls = if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ca) = self.ca_cert {
            TlsVerification::CustomCa(ca)
        } else {
            TlsVerification::SystemDefaults
        };

        let mut connection = ConnectionConfig::new(url, token);
        connection.tls = tls;
        connection.timeout = Duration::from_secs(self.timeout);
        connection.page_size = self.page_size;
        Ok(connection)
    }
}

// ── Paths ───────────────────────────────────────────────────────────

/// Platform settings file (e.g. `~/.config/nbsync/config.toml`).
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "nbsync").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("nbsync");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// The settings file in effect: `explicit`, else `./nbsync.toml` when it
/// exists, else [`config_path`].
pub fn settings_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let local = PathBuf::from(LOCAL_SETTINGS_FILE);
    if local.is_file() {
        return local;
    }
    config_path()
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load [`DOTENV_FILES`] into the process environment. Variables already
/// set are left alone. Returns the files that were found.
pub fn load_dotenv() -> Result<Vec<PathBuf>, ConfigError> {
    let mut loaded = Vec::new();
    for file in DOTENV_FILES {
        let path = PathBuf::from(file);
        match dotenvy::from_path(&path) {
            Ok(()) => loaded.push(path),
            Err(err) if err.not_found() => {}
            Err(source) => return Err(ConfigError::Dotenv { path, source }),
        }
    }
    Ok(loaded)
}

/// Defaults, then the TOML file at `path`, then `NETBOX_*` variables.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
}

/// Load settings from the file chosen by [`settings_path`] plus the
/// environment.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    let settings: Settings = figment(&settings_path(explicit)).extract()?;
    Ok(settings)
}

// ── Runtime connection configuration ──
//
// Describes *how* to reach a NetBox instance. Carries the token and
// connection tuning but never touches disk: `nbsync-config` builds a
// `ConnectionConfig` and the CLI hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use nbsync_api::{NetboxClient, TlsMode, TransportConfig};

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (lab instances with self-signed certs).
    DangerAcceptInvalid,
}

/// Everything needed to talk to one NetBox instance.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Instance URL (e.g., `https://netbox.example.com`).
    pub url: Url,
    /// API token, v1 (`Token`) or v2 (`nbt_...`, `Bearer`).
    pub token: SecretString,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Objects requested per list page.
    pub page_size: u32,
}

impl ConnectionConfig {
    pub fn new(url: Url, token: SecretString) -> Self {
        Self {
            url,
            token,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            page_size: nbsync_api::client::DEFAULT_PAGE_SIZE,
        }
    }

    /// Build an authenticated client for this instance.
    pub fn connect(&self) -> Result<NetboxClient, CoreError> {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        let transport = TransportConfig {
            tls,
            timeout: self.timeout,
        };

        let client = NetboxClient::new(self.url.as_str(), &self.token, &transport)?;
        Ok(client.with_page_size(self.page_size))
    }

    /// Host part of the URL, made safe for a directory name.
    pub fn host_label(&self) -> String {
        host_label(&self.url)
    }
}

/// Dots (and anything else unsafe in a path) become dashes; `netbox`
/// when the URL has no host.
pub fn host_label(url: &Url) -> String {
    let Some(host) = url.host_str() else {
        return "netbox".to_owned();
    };
    let label: String = host
        .trim_matches(|c| c == '[' || c == ']')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    if label.is_empty() {
        "netbox".to_owned()
    } else {
        label
    }
}

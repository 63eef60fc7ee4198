//! Settings resolution for the CLI: `nbsync-config` layers, then flags.
//!
//! Core never sees these types -- it receives a pre-built
//! `ConnectionConfig`.

use std::path::PathBuf;

use serde::Serialize;

use nbsync_config::Settings;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Settings file in effect for this invocation.
pub fn settings_path(global: &GlobalOpts) -> PathBuf {
    nbsync_config::settings_path(global.config.as_deref())
}

/// Load settings and apply command-line overrides on top.
pub fn load(global: &GlobalOpts) -> Result<Settings, CliError> {
    let mut settings = nbsync_config::load_settings(global.config.as_deref())?;

    if let Some(ref url) = global.url {
        settings.url = Some(url.clone());
    }
    if let Some(ref token) = global.token {
        settings.token = Some(token.clone());
    }
    if global.insecure {
        settings.insecure = true;
    }
    if let Some(timeout) = global.timeout {
        settings.timeout = timeout;
    }

    Ok(settings)
}

// ── Display view ────────────────────────────────────────────────────

/// What `config show` prints. The token is never echoed.
#[derive(Debug, Serialize)]
pub struct SettingsView {
    pub settings_file: String,
    pub url: Option<String>,
    pub token: &'static str,
    pub timeout: u64,
    pub insecure: bool,
    pub ca_cert: Option<String>,
    pub page_size: u32,
    pub max_failures: u32,
}

impl SettingsView {
    pub fn new(settings: &Settings, path: &std::path::Path) -> Self {
        let file = if path.is_file() {
            path.display().to_string()
        } else {
            format!("{} (not found)", path.display())
        };
        Self {
            settings_file: file,
            url: settings.url.clone(),
            token: match settings.token.as_deref() {
                Some(t) if !t.trim().is_empty() => "********",
                _ => "(not set)",
            },
            timeout: settings.timeout,
            insecure: settings.insecure,
            ca_cert: settings.ca_cert.as_ref().map(|p| p.display().to_string()),
            page_size: settings.page_size,
            max_failures: settings.max_failures,
        }
    }

    /// `(key, value)` pairs in display order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("settings_file", self.settings_file.clone()),
            ("url", self.url.clone().unwrap_or_else(|| "(not set)".into())),
            ("token", self.token.to_owned()),
            ("timeout", format!("{}s", self.timeout)),
            ("insecure", self.insecure.to_string()),
            ("ca_cert", self.ca_cert.clone().unwrap_or_default()),
            ("page_size", self.page_size.to_string()),
            ("max_failures", self.max_failures.to_string()),
        ]
    }
}

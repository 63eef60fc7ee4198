//! Command handlers: bridge CLI args -> core engine -> output formatting.

pub mod config_cmd;
pub mod export;
pub mod import;

use nbsync_config::Settings;
use nbsync_core::ConnectionConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a NetBox-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    settings: Settings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Import(args) => import::handle(args, settings, global).await,
        Command::Export(args) => export::handle(args, settings, global).await,
        // Handled before settings are loaded
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}

/// Validated connection parameters, with the URL echoed at debug level.
fn connection(settings: Settings) -> Result<ConnectionConfig, CliError> {
    let connection = settings.into_connection()?;
    tracing::debug!(url = %connection.url, tls = ?connection.tls, "connecting");
    Ok(connection)
}

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, SettingsView};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::settings_path(global);
    match args.command {
        ConfigCommand::Show => {
            let settings = config::load(global)?;
            let view = SettingsView::new(&settings, &path);
            let rendered = output::render_settings(&global.output, &view)?;
            output::print_output(&rendered, global.quiet);
        }
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
        }
    }
    Ok(())
}

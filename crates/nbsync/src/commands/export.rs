use nbsync_config::Settings;
use nbsync_core::Exporter;

use crate::cli::{ExportArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    args: ExportArgs,
    settings: Settings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let connection = super::connection(settings)?;
    let client = connection.connect()?;

    let now = chrono::Local::now().naive_local();
    let report = Exporter::new(&client, connection.host_label())
        .run(&args.base_dir, now)
        .await?;

    let color = output::should_color(&global.color);
    let rendered = output::render_export_report(&global.output, &report, color)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

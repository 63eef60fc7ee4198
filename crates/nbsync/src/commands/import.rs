use nbsync_config::Settings;
use nbsync_core::{ImportOptions, Importer};

use crate::cli::{GlobalOpts, ImportArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    args: ImportArgs,
    settings: Settings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let options = ImportOptions {
        ip_upsert: args.ip_upsert,
        with_cables: args.with_cables,
        max_consecutive_failures: args.max_failures.unwrap_or(settings.max_failures).max(1),
    };

    let connection = super::connection(settings)?;
    if !args.dir.is_dir() {
        return Err(CliError::SourceNotFound {
            path: args.dir.display().to_string(),
        });
    }
    let client = connection.connect()?;

    tracing::info!(dir = %args.dir.display(), ?options, "starting import");
    let report = Importer::new(&client, options).run(&args.dir).await?;

    let color = output::should_color(&global.color);
    let rendered = output::render_run_report(&global.output, &report, color)?;
    output::print_output(&rendered, global.quiet);

    if let Some(abort) = report.aborted {
        return Err(abort.into());
    }
    if report.has_failures() {
        return Err(CliError::RowsFailed {
            errored: report.totals().errored,
            unreadable: report
                .files
                .iter()
                .filter(|f| f.read_error.is_some())
                .count(),
        });
    }
    Ok(())
}

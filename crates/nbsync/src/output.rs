//! Output formatting: table, JSON, YAML.
//!
//! Renders run summaries in the format selected by `--output`. Table uses
//! `tabled`, structured formats serialize the core report types as-is.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use nbsync_core::{ExportReport, FileReport, RunReport, Tally};

use crate::cli::{ColorMode, OutputFormat};
use crate::config::SettingsView;
use crate::error::CliError;

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Import summary ──────────────────────────────────────────────────

#[derive(Tabled)]
struct FileRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Collection")]
    collection: String,
    #[tabled(rename = "Created")]
    created: usize,
    #[tabled(rename = "Updated")]
    updated: usize,
    #[tabled(rename = "Skipped")]
    skipped: usize,
    #[tabled(rename = "Errored")]
    errored: usize,
}

impl FileRow {
    fn new(file: String, collection: String, tally: Tally) -> Self {
        Self {
            file,
            collection,
            created: tally.created,
            updated: tally.updated,
            skipped: tally.skipped,
            errored: tally.errored,
        }
    }
}

impl From<&FileReport> for FileRow {
    fn from(report: &FileReport) -> Self {
        Self::new(
            report.file.clone(),
            report.collection.to_string(),
            report.tally,
        )
    }
}

pub fn render_run_report(
    format: &OutputFormat,
    report: &RunReport,
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(run_report_table(report, color)),
        OutputFormat::Json => render_json(report),
        OutputFormat::Yaml => render_yaml(report),
    }
}

fn run_report_table(report: &RunReport, color: bool) -> String {
    let mut rows: Vec<FileRow> = report.files.iter().map(FileRow::from).collect();
    rows.push(FileRow::new("TOTAL".into(), String::new(), report.totals()));

    let mut out = render_table(&rows);

    for file in &report.files {
        if let Some(ref reason) = file.read_error {
            out.push('\n');
            out.push_str(&paint(&format!("{}: unreadable: {reason}", file.file), color, Tone::Error));
        }
        for failure in &file.failures {
            out.push('\n');
            out.push_str(&paint(
                &format!("{}:{}: {}", file.file, failure.line, failure.error),
                color,
                Tone::Error,
            ));
        }
    }
    for skipped in &report.skipped_files {
        out.push('\n');
        out.push_str(&paint(
            &format!("skipped {}: {}", skipped.file, skipped.reason),
            color,
            Tone::Warn,
        ));
    }
    if let Some(ref abort) = report.aborted {
        out.push('\n');
        out.push_str(&paint(
            &format!("aborted at {}:{}: {}", abort.file, abort.line, abort.reason),
            color,
            Tone::Error,
        ));
    } else if !report.has_failures() {
        out.push('\n');
        out.push_str(&paint("import complete", color, Tone::Ok));
    }
    out
}

// ── Export summary ──────────────────────────────────────────────────

#[derive(Tabled)]
struct ExportRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Collection")]
    collection: String,
    #[tabled(rename = "Rows")]
    rows: usize,
    #[tabled(rename = "Note")]
    note: String,
}

pub fn render_export_report(
    format: &OutputFormat,
    report: &ExportReport,
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<ExportRow> = report
                .files
                .iter()
                .map(|f| ExportRow {
                    file: f.file.clone(),
                    collection: f.collection.to_string(),
                    rows: f.rows,
                    note: if f.available {
                        String::new()
                    } else {
                        "endpoint unavailable".into()
                    },
                })
                .collect();
            let mut out = render_table(&rows);
            out.push('\n');
            out.push_str(&paint(
                &format!(
                    "{} rows written to {}",
                    report.total_rows(),
                    report.directory.display()
                ),
                color,
                Tone::Ok,
            ));
            Ok(out)
        }
        OutputFormat::Json => render_json(report),
        OutputFormat::Yaml => render_yaml(report),
    }
}

// ── Settings ────────────────────────────────────────────────────────

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Setting")]
    key: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

pub fn render_settings(format: &OutputFormat, view: &SettingsView) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<SettingRow> = view
                .pairs()
                .into_iter()
                .map(|(key, value)| SettingRow { key, value })
                .collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(view),
        OutputFormat::Yaml => render_yaml(view),
    }
}

// ── Format-specific renderers ────────────────────────────────────────

#[derive(Clone, Copy)]
enum Tone {
    Ok,
    Warn,
    Error,
}

fn paint(text: &str, color: bool, tone: Tone) -> String {
    if !color {
        return text.to_owned();
    }
    match tone {
        Tone::Ok => text.green().to_string(),
        Tone::Warn => text.yellow().to_string(),
        Tone::Error => text.red().to_string(),
    }
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(data)?)
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}

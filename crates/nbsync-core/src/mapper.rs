// ── File and header mapping ──
//
// Turns `3_device-types.csv` into (priority 3, dcim.device_types) and
// `" Device Role "` into `device_role`. Both mappings are pure; only
// `collect_files` touches the filesystem.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::CoreError;
use crate::schema::{Collection, collection_for_stem};

/// Priority of files without a numeric prefix.
pub const DEFAULT_PRIORITY: u32 = 9999;

/// File extensions the importer reads.
const EXTENSIONS: &[&str] = &["csv", "tsv"];

/// Stem fragment skipped unless cable import is enabled.
const CABLES_PATTERN: &str = "cables";

#[derive(Debug, Clone, Copy, Default)]
pub struct RouteOptions {
    pub with_cables: bool,
}

/// Where a file name leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Import {
        priority: u32,
        collection: Collection,
    },
    Ignored {
        stem: String,
        pattern: &'static str,
    },
    Unknown {
        stem: String,
    },
}

/// Split a file name into its priority prefix and normalized stem.
///
/// `"07_IP-Addresses.csv"` becomes `(7, "ip_addresses")`.
pub fn split_file_name(file_name: &str) -> (u32, String) {
    let lower = file_name.to_lowercase();
    let base = match lower.rsplit_once('.') {
        Some((base, _ext)) if !base.is_empty() => base,
        _ => lower.as_str(),
    };

    let digits = base.len() - base.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let (prefix, rest) = base.split_at(digits);
    let (priority, rest) = match rest.strip_prefix('_') {
        Some(stem) if !prefix.is_empty() => (prefix.parse().unwrap_or(DEFAULT_PRIORITY), stem),
        _ => (DEFAULT_PRIORITY, base),
    };

    (priority, rest.replace('-', "_"))
}

pub fn route(file_name: &str, options: RouteOptions) -> Route {
    let (priority, stem) = split_file_name(file_name);

    if stem.contains(CABLES_PATTERN) && !options.with_cables {
        return Route::Ignored {
            stem,
            pattern: CABLES_PATTERN,
        };
    }

    match collection_for_stem(&stem) {
        Some(collection) => Route::Import {
            priority,
            collection,
        },
        None => Route::Unknown { stem },
    }
}

/// Canonical form of a column header.
///
/// Drops byte-order marks, trims, turns runs of whitespace and hyphens into
/// a single `_` and lowercases. Applying it twice changes nothing.
pub fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_separator = false;

    for ch in raw.chars() {
        if ch == '\u{feff}' {
            continue;
        }
        if ch.is_whitespace() || ch == '-' {
            pending_separator = !out.is_empty();
            continue;
        }
        if pending_separator {
            out.push('_');
            pending_separator = false;
        }
        out.extend(ch.to_lowercase());
    }

    out
}

// ── Directory walk ───────────────────────────────────────────────────

/// A file that will be imported.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the import root, `/`-separated.
    pub relative: String,
    pub priority: u32,
    pub collection: Collection,
}

/// A file that was seen but not imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

/// Walk `dir` for tabular files and put them in import order.
///
/// Order is ascending priority, then relative path.
pub fn collect_files(
    dir: &Path,
    options: RouteOptions,
) -> Result<(Vec<SourceFile>, Vec<SkippedFile>), CoreError> {
    if !dir.is_dir() {
        return Err(CoreError::SourceNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    let mut skipped = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            CoreError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() || !has_tabular_extension(entry.path()) {
            continue;
        }

        let relative = relative_path(dir, entry.path());
        let file_name = entry.file_name().to_string_lossy();

        match route(&file_name, options) {
            Route::Import {
                priority,
                collection,
            } => files.push(SourceFile {
                path: entry.path().to_path_buf(),
                relative,
                priority,
                collection,
            }),
            Route::Ignored { stem, pattern } => {
                info!(file = %relative, stem = %stem, pattern, "skipping file");
                skipped.push(SkippedFile {
                    file: relative,
                    reason: format!("matches ignore pattern '{pattern}'"),
                });
            }
            Route::Unknown { stem } => {
                warn!(file = %relative, stem = %stem, "no collection for file, skipping");
                skipped.push(SkippedFile {
                    file: relative,
                    reason: format!("unknown collection '{stem}'"),
                });
            }
        }
    }

    files.sort_by(|a, b| (a.priority, &a.relative).cmp(&(b.priority, &b.relative)));
    Ok((files, skipped))
}

fn has_tabular_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

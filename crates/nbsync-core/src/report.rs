// ── Run reports ──
//
// Plain values handed back to the caller. The importer owns the counters
// while it runs; the CLI only renders what comes back.

use std::ops::AddAssign;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::RowError;
use crate::mapper::{SkippedFile, SourceFile};
use crate::schema::Collection;

/// What happened to a row that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOutcome {
    Created,
    Updated,
    /// An equivalent object already existed.
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Created => self.created += 1,
            RowOutcome::Updated => self.updated += 1,
            RowOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.skipped + self.errored
    }
}

impl AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        self.created += other.created;
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.errored += other.errored;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRow {
    pub line: u64,
    pub error: RowError,
}

/// Outcome of one imported file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    pub collection: Collection,
    pub priority: u32,
    pub tally: Tally,
    pub failures: Vec<FailedRow>,
    /// Set when the file could not be parsed at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_error: Option<String>,
}

impl FileReport {
    pub fn new(source: &SourceFile) -> Self {
        Self {
            file: source.relative.clone(),
            collection: source.collection,
            priority: source.priority,
            tally: Tally::default(),
            failures: Vec::new(),
            read_error: None,
        }
    }

    pub fn record_failure(&mut self, line: u64, error: RowError) {
        self.tally.errored += 1;
        self.failures.push(FailedRow { line, error });
    }

    pub fn has_failures(&self) -> bool {
        self.tally.errored > 0 || self.read_error.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortKind {
    Authentication,
    Connectivity,
}

/// Why a run stopped before the last file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Abort {
    pub kind: AbortKind,
    pub file: String,
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub files: Vec<FileReport>,
    pub skipped_files: Vec<SkippedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<Abort>,
}

impl RunReport {
    pub fn totals(&self) -> Tally {
        let mut totals = Tally::default();
        for file in &self.files {
            totals += file.tally;
        }
        totals
    }

    /// Tally for one collection, summed over every file that fed it.
    pub fn collection_totals(&self, collection: Collection) -> Tally {
        let mut totals = Tally::default();
        for file in self.files.iter().filter(|f| f.collection == collection) {
            totals += file.tally;
        }
        totals
    }

    pub fn has_failures(&self) -> bool {
        self.aborted.is_some() || self.files.iter().any(FileReport::has_failures)
    }
}

// ── Export ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub file: String,
    pub collection: Collection,
    pub rows: usize,
    /// `false` when the endpoint answered 404 and only headers were
    /// written.
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub directory: PathBuf,
    pub files: Vec<ExportedFile>,
}

impl ExportReport {
    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.rows).sum()
    }
}

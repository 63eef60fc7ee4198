// ── Exporter ──
//
// Reads every planned collection and writes one CSV per collection into a
// fresh, timestamped snapshot directory. Never writes to NetBox.

mod cables;
mod table;

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use futures_util::TryStreamExt;
use tracing::{debug, info, warn};

use nbsync_api::Object;

use crate::error::CoreError;
use crate::remote::Remote;
use crate::report::{ExportReport, ExportedFile};
use crate::schema::Collection;
use crate::tabular::write_rows;

pub use table::{PLAN, Table, render};

/// Leading component of every snapshot directory name.
pub const SNAPSHOT_PREFIX: &str = "netbox_export";

/// Suffixes tried when a snapshot name is taken within the same second.
const MAX_NAME_ATTEMPTS: u32 = 100;

pub struct Exporter<'a, R> {
    remote: &'a R,
    host: String,
}

impl<'a, R: Remote> Exporter<'a, R> {
    /// `host` labels the snapshot directory (see
    /// [`host_label`](crate::config::host_label)).
    pub fn new(remote: &'a R, host: impl Into<String>) -> Self {
        Self {
            remote,
            host: host.into(),
        }
    }

    /// Write a snapshot under `base` and return what went into it.
    pub async fn run(&self, base: &Path, now: NaiveDateTime) -> Result<ExportReport, CoreError> {
        self.remote.verify().await?;

        let directory = create_snapshot_dir(base, &self.host, now)?;
        info!(directory = %directory.display(), "writing snapshot");

        let mut report = ExportReport {
            directory: directory.clone(),
            files: Vec::with_capacity(PLAN.len() + 1),
        };
        let mut fetched: HashMap<Collection, Vec<Object>> = HashMap::new();

        for table in PLAN {
            let objects = self.fetch(table.collection).await?;
            let available = objects.is_some();
            let objects = objects.unwrap_or_default();

            let rows: Vec<Vec<String>> = objects.iter().map(|o| table.render_row(o)).collect();
            write_rows(&directory.join(table.file_name), &table.headers(), &rows)?;
            info!(file = table.file_name, rows = rows.len(), "exported");

            report.files.push(ExportedFile {
                file: table.file_name.to_owned(),
                collection: table.collection,
                rows: rows.len(),
                available,
            });
            fetched.insert(table.collection, objects);
        }

        let cable_objects = self.fetch(Collection::Cables).await?;
        let available = cable_objects.is_some();
        let rows = cables::derive_rows(
            fetched
                .get(&Collection::Interfaces)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            fetched
                .get(&Collection::CircuitTerminations)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            cable_objects.as_deref().unwrap_or_default(),
        );
        write_rows(&directory.join(cables::FILE_NAME), cables::HEADERS, &rows)?;
        info!(file = cables::FILE_NAME, rows = rows.len(), "exported");

        report.files.push(ExportedFile {
            file: cables::FILE_NAME.to_owned(),
            collection: Collection::Cables,
            rows: rows.len(),
            available,
        });

        Ok(report)
    }

    /// All objects of a collection, or `None` when the endpoint does not
    /// exist on this instance.
    async fn fetch(&self, collection: Collection) -> Result<Option<Vec<Object>>, CoreError> {
        match self.remote.iterate_all(collection).try_collect::<Vec<_>>().await {
            Ok(objects) => {
                debug!(%collection, count = objects.len(), "fetched");
                Ok(Some(objects))
            }
            Err(err) if err.is_not_found() => {
                warn!(%collection, "endpoint not available, writing headers only");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Create `<base>/netbox_export-<host>-<YYYYmmdd_HHMMSS>`, adding `-2`,
/// `-3`, ... when that name already exists.
pub fn create_snapshot_dir(
    base: &Path,
    host: &str,
    now: NaiveDateTime,
) -> Result<PathBuf, CoreError> {
    fs::create_dir_all(base).map_err(|e| CoreError::io(base, e))?;

    let stem = format!("{SNAPSHOT_PREFIX}-{host}-{}", now.format("%Y%m%d_%H%M%S"));
    for attempt in 1..=MAX_NAME_ATTEMPTS {
        let candidate = if attempt == 1 {
            base.join(&stem)
        } else {
            base.join(format!("{stem}-{attempt}"))
        };
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(CoreError::io(candidate, e)),
        }
    }

    Err(CoreError::io(
        base.join(stem),
        std::io::Error::new(ErrorKind::AlreadyExists, "no free snapshot directory name"),
    ))
}

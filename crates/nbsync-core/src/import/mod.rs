// ── Importer ──
//
// Walks an input directory in priority order and pushes every row to
// NetBox. A row either creates an object, updates the one it matches,
// is skipped as a duplicate, or fails on its own. Only errors that would
// fail every later request too (bad token, unreachable host) stop the run.

mod cables;

use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use nbsync_api::{Object, object_id};

use crate::coerce::coerce;
use crate::error::{CoreError, RowError, RowFailure};
use crate::mapper::{RouteOptions, SourceFile, collect_files};
use crate::remote::Remote;
use crate::report::{Abort, AbortKind, FileReport, RowOutcome, RunReport};
use crate::resolve::Resolver;
use crate::schema::{Collection, CollectionSchema, FieldKind, MatchGate};
use crate::tabular::{BadRecord, Row, read_rows};

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    /// Match IP addresses on (address, vrf) and update instead of
    /// creating.
    pub ip_upsert: bool,
    /// Import `*cables*` files instead of ignoring them.
    pub with_cables: bool,
    /// Consecutive connectivity failures tolerated before the run aborts.
    /// `1` aborts on the first.
    pub max_consecutive_failures: u32,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            ip_upsert: false,
            with_cables: false,
            max_consecutive_failures: 1,
        }
    }
}

pub struct Importer<'a, R> {
    remote: &'a R,
    options: ImportOptions,
    resolver: Resolver<'a, R>,
    consecutive_failures: u32,
}

impl<'a, R: Remote> Importer<'a, R> {
    pub fn new(remote: &'a R, options: ImportOptions) -> Self {
        Self {
            remote,
            options,
            resolver: Resolver::new(remote),
            consecutive_failures: 0,
        }
    }

    /// Import every recognised file under `dir`.
    ///
    /// Connectivity is verified before any file is read. A run cut short
    /// by a fatal remote error still returns its report, with `aborted`
    /// set.
    pub async fn run(&mut self, dir: &Path) -> Result<RunReport, CoreError> {
        self.remote.verify().await?;

        let route_options = RouteOptions {
            with_cables: self.options.with_cables,
        };
        let (files, skipped_files) = collect_files(dir, route_options)?;
        info!(files = files.len(), skipped = skipped_files.len(), "import plan ready");

        let mut report = RunReport {
            skipped_files,
            ..RunReport::default()
        };

        for source in &files {
            let (file_report, abort) = self.import_file(source).await;
            report.files.push(file_report);
            if abort.is_some() {
                report.aborted = abort;
                break;
            }
        }

        Ok(report)
    }

    async fn import_file(&mut self, source: &SourceFile) -> (FileReport, Option<Abort>) {
        let mut report = FileReport::new(source);
        info!(
            file = %source.relative,
            collection = %source.collection,
            priority = source.priority,
            "importing file"
        );

        let rows = match read_rows(&source.path) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(file = %source.relative, error = %err, "cannot read file");
                report.read_error = Some(err.to_string());
                return (report, None);
            }
        };

        for row in rows {
            let Row { line, fields } = match row {
                Ok(row) => row,
                Err(BadRecord { line, reason }) => {
                    warn!(file = %source.relative, line, %reason, "unreadable record");
                    report.record_failure(line, RowError::Malformed { reason });
                    continue;
                }
            };
            match self.import_row(source.collection, fields).await {
                Ok(outcome) => {
                    self.consecutive_failures = 0;
                    debug!(file = %source.relative, line, ?outcome, "row applied");
                    report.tally.record(outcome);
                }
                Err(RowFailure::Row(error)) => {
                    self.consecutive_failures = 0;
                    warn!(file = %source.relative, line, %error, "row failed");
                    report.record_failure(line, error);
                }
                Err(RowFailure::Fatal(err)) => {
                    report.record_failure(
                        line,
                        RowError::RemoteUnavailable {
                            message: err.to_string(),
                        },
                    );
                    if let Some(kind) = self.should_abort(&err) {
                        warn!(file = %source.relative, line, error = %err, "aborting import");
                        let abort = Abort {
                            kind,
                            file: source.relative.clone(),
                            line,
                            reason: err.to_string(),
                        };
                        return (report, Some(abort));
                    }
                }
            }
        }

        info!(
            file = %source.relative,
            created = report.tally.created,
            updated = report.tally.updated,
            skipped = report.tally.skipped,
            errored = report.tally.errored,
            "file done"
        );
        (report, None)
    }

    /// Auth failures abort at once; connectivity failures once the
    /// consecutive threshold is reached.
    fn should_abort(&mut self, err: &nbsync_api::Error) -> Option<AbortKind> {
        if err.is_auth() {
            return Some(AbortKind::Authentication);
        }
        self.consecutive_failures += 1;
        (self.consecutive_failures >= self.options.max_consecutive_failures.max(1))
            .then_some(AbortKind::Connectivity)
    }

    async fn import_row(
        &mut self,
        collection: Collection,
        fields: IndexMap<String, String>,
    ) -> Result<RowOutcome, RowFailure> {
        let schema = collection.schema();
        let mut fields = schema.apply_aliases(fields);
        let mut payload = Object::new();

        if collection == Collection::Cables {
            cables::resolve_terminations(&mut self.resolver, &mut fields, &mut payload).await?;
        }
        self.build_payload(schema, &fields, &mut payload).await?;

        self.submit(collection, &payload).await
    }

    /// Resolve references and coerce scalars into the request body.
    async fn build_payload(
        &mut self,
        schema: &CollectionSchema,
        fields: &IndexMap<String, String>,
        payload: &mut Object,
    ) -> Result<(), RowFailure> {
        for (field, raw) in fields {
            let value = match schema.field_kind(field) {
                FieldKind::Scalar(kind) => coerce(field, kind, raw)?,
                FieldKind::Reference { target, scope } => Some(Value::from(
                    self.resolver
                        .resolve(field, target, scope, raw, fields)
                        .await?,
                )),
                FieldKind::ReferenceList { target } => {
                    let ids = self.resolver.resolve_list(field, target, raw).await?;
                    (!ids.is_empty()).then(|| Value::from(ids))
                }
                FieldKind::ScopeOnly => None,
            };
            if let Some(value) = value {
                payload.insert(field.clone(), value);
            }
        }
        Ok(())
    }

    /// Create, or update the single object the match rule finds.
    async fn submit(
        &self,
        collection: Collection,
        payload: &Object,
    ) -> Result<RowOutcome, RowFailure> {
        let rule = collection
            .schema()
            .match_rule
            .filter(|rule| rule.gate == MatchGate::Always || self.options.ip_upsert);

        if let Some((rule, filters)) = rule.and_then(|r| r.filters(payload).map(|f| (r, f))) {
            let existing = self
                .remote
                .list_by_filter(collection, &filters)
                .await
                .map_err(RowFailure::from_remote)?;

            match existing.as_slice() {
                [] => {}
                [only] => {
                    let id = object_id(only).ok_or_else(|| RowError::RemoteRejected {
                        message: format!("{collection} object without an id"),
                    })?;
                    let body = rule.merge_body(payload);
                    return match self.remote.update(collection, id, &body).await {
                        Ok(_) => Ok(RowOutcome::Updated),
                        Err(err) if err.is_uniqueness_conflict() => Ok(RowOutcome::Skipped),
                        Err(err) => Err(RowFailure::from_remote(err)),
                    };
                }
                many => {
                    return Err(RowError::UpsertAmbiguous {
                        collection,
                        key: describe_filters(&filters),
                        count: many.len(),
                    }
                    .into());
                }
            }
        }

        match self.remote.create(collection, payload).await {
            Ok(_) => Ok(RowOutcome::Created),
            Err(err) if err.is_uniqueness_conflict() => Ok(RowOutcome::Skipped),
            Err(err) => Err(RowFailure::from_remote(err)),
        }
    }
}

fn describe_filters(filters: &[(String, String)]) -> String {
    filters
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

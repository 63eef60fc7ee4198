//! CSV import/export engine for NetBox inventory.
//!
//! This crate owns everything between the files on disk and the REST
//! client in `nbsync-api`:
//!
//! - **[`schema`]** — Static table of collections: endpoint paths, lookup
//!   keys, reference fields, header aliases and upsert match rules.
//!
//! - **[`mapper`]** — File name → (priority, collection) routing, header
//!   normalization, and the ordered directory walk.
//!
//! - **[`Resolver`]** — Turns names in reference columns into object ids,
//!   with scoped lookups, slug fallback and a per-run cache.
//!
//! - **[`Importer`]** — Applies a directory of files row by row: create,
//!   update on match, skip on duplicate, or record a row error. Returns a
//!   [`RunReport`].
//!
//! - **[`Exporter`]** — Writes a timestamped snapshot directory that the
//!   importer can read back.
//!
//! - **[`Remote`]** — The five NetBox operations the engine needs,
//!   implemented for [`nbsync_api::NetboxClient`].

pub mod coerce;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod mapper;
pub mod remote;
pub mod report;
pub mod resolve;
pub mod schema;
pub mod tabular;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ConnectionConfig, TlsVerification};
pub use error::{CoreError, RowError, RowFailure};
pub use export::Exporter;
pub use import::{ImportOptions, Importer};
pub use remote::Remote;
pub use report::{
    Abort, AbortKind, ExportReport, ExportedFile, FailedRow, FileReport, RowOutcome, RunReport,
    Tally,
};
pub use resolve::Resolver;
pub use schema::Collection;

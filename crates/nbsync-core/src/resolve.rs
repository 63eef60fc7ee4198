// ── Reference resolution ──
//
// Turns the human name in a reference column (`site = PoP-CE`) into the
// numeric id NetBox wants. Exactly one match is required; zero or several
// fail the row. Successful lookups are memoized for the lifetime of the
// resolver, failures are always retried.
//
// Devices, manufacturers, providers and circuit types also match loosely:
// accents, case, spaces and dashes are ignored when nothing matches
// exactly.

use std::collections::HashMap;

use futures_util::TryStreamExt;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use nbsync_api::{Object, object_id};

use crate::error::{RowError, RowFailure};
use crate::remote::Remote;
use crate::schema::{Collection, Scope};

type Filters = Vec<(String, String)>;

/// Loose key -> ids of every object carrying it.
type LooseIndex = HashMap<String, Vec<i64>>;

pub struct Resolver<'a, R> {
    remote: &'a R,
    cache: HashMap<(Collection, Filters), i64>,
    loose: HashMap<Collection, LooseIndex>,
}

impl<'a, R: Remote> Resolver<'a, R> {
    pub fn new(remote: &'a R) -> Self {
        Self {
            remote,
            cache: HashMap::new(),
            loose: HashMap::new(),
        }
    }

    /// Resolve one reference cell to an id.
    ///
    /// When the field declares a scope and the row carries the scope
    /// field, the lookup is narrowed by it first and widened again if the
    /// narrowed lookup finds nothing.
    pub async fn resolve(
        &mut self,
        field: &str,
        target: Collection,
        scope: Option<Scope>,
        raw: &str,
        row: &IndexMap<String, String>,
    ) -> Result<i64, RowFailure> {
        let scope_filter = match scope {
            Some(scope) => self.scope_filter(scope, row).await?,
            None => None,
        };
        self.resolve_scoped(field, target, raw, scope_filter).await
    }

    /// Resolve a comma-separated list of references.
    pub async fn resolve_list(
        &mut self,
        field: &str,
        target: Collection,
        raw: &str,
    ) -> Result<Vec<i64>, RowFailure> {
        let mut ids = Vec::new();
        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            ids.push(self.resolve_scoped(field, target, item, None).await?);
        }
        Ok(ids)
    }

    /// Resolve a value with an optional, already-resolved scope filter.
    pub async fn resolve_scoped(
        &mut self,
        field: &str,
        target: Collection,
        raw: &str,
        scope_filter: Option<(String, String)>,
    ) -> Result<i64, RowFailure> {
        let value = raw.trim();
        if let Some(id) = direct_id(value) {
            return Ok(id);
        }

        let by_key = vec![(target.lookup_key().to_owned(), value.to_owned())];

        if let Some(scope_filter) = scope_filter {
            let mut scoped = by_key.clone();
            scoped.push(scope_filter);
            if let Some(id) = self.lookup(field, target, value, scoped).await? {
                return Ok(id);
            }
            debug!(field, value, %target, "scoped lookup empty, retrying unscoped");
        }

        if let Some(id) = self.lookup(field, target, value, by_key).await? {
            return Ok(id);
        }

        if target.has_slug() {
            let slug = slugify(value);
            if !slug.is_empty() {
                let by_slug = vec![("slug".to_owned(), slug)];
                if let Some(id) = self.lookup(field, target, value, by_slug).await? {
                    return Ok(id);
                }
            }
        }

        if matches_loosely(target) {
            if let Some(id) = self.lookup_loose(field, target, value).await? {
                return Ok(id);
            }
        }

        Err(not_found(field, target, value))
    }

    /// Resolve by an explicit filter set, requiring exactly one match.
    ///
    /// `value` only labels the error.
    pub async fn resolve_exact(
        &mut self,
        field: &str,
        target: Collection,
        value: &str,
        filters: Filters,
    ) -> Result<i64, RowFailure> {
        self.lookup(field, target, value, filters)
            .await?
            .ok_or_else(|| not_found(field, target, value))
    }

    /// The scope field's value, resolved to `filter=<id>`.
    ///
    /// A scope that cannot be resolved just leaves the lookup unscoped.
    async fn scope_filter(
        &mut self,
        scope: Scope,
        row: &IndexMap<String, String>,
    ) -> Result<Option<(String, String)>, RowFailure> {
        let Some(raw) = row.get(scope.field) else {
            return Ok(None);
        };
        match self.resolve_scoped(scope.field, scope.target, raw, None).await {
            Ok(id) => Ok(Some((scope.filter.to_owned(), id.to_string()))),
            Err(RowFailure::Row(err)) => {
                debug!(field = scope.field, error = %err, "scope unresolved, ignoring");
                Ok(None)
            }
            Err(fatal) => Err(fatal),
        }
    }

    /// `Ok(None)` on zero matches, an error on more than one.
    async fn lookup(
        &mut self,
        field: &str,
        target: Collection,
        value: &str,
        filters: Filters,
    ) -> Result<Option<i64>, RowFailure> {
        let key = (target, filters);
        if let Some(id) = self.cache.get(&key) {
            return Ok(Some(*id));
        }

        let matches = self
            .remote
            .list_by_filter(target, &key.1)
            .await
            .map_err(RowFailure::from_remote)?;

        match matches.as_slice() {
            [] => Ok(None),
            [only] => {
                let id = object_id(only).ok_or_else(|| RowError::RemoteRejected {
                    message: format!("{target} object without an id"),
                })?;
                self.cache.insert(key, id);
                Ok(Some(id))
            }
            many => Err(RowError::ReferenceAmbiguous {
                field: field.to_owned(),
                value: value.to_owned(),
                collection: target,
                count: many.len(),
            }
            .into()),
        }
    }

    /// Match `value` against every object of `target` by [`loose_key`].
    ///
    /// The index is built on first use and dropped again after a miss, so
    /// objects created later in the run are found.
    async fn lookup_loose(
        &mut self,
        field: &str,
        target: Collection,
        value: &str,
    ) -> Result<Option<i64>, RowFailure> {
        let wanted = loose_key(value);
        if wanted.is_empty() {
            return Ok(None);
        }
        if !self.loose.contains_key(&target) {
            let index = self.loose_index(target).await?;
            self.loose.insert(target, index);
        }

        let ids = self
            .loose
            .get(&target)
            .and_then(|index| index.get(&wanted))
            .cloned()
            .unwrap_or_default();
        match ids.as_slice() {
            [] => {
                self.loose.remove(&target);
                Ok(None)
            }
            [only] => {
                debug!(field, value, %target, id = *only, "matched loosely");
                Ok(Some(*only))
            }
            many => Err(RowError::ReferenceAmbiguous {
                field: field.to_owned(),
                value: value.to_owned(),
                collection: target,
                count: many.len(),
            }
            .into()),
        }
    }

    async fn loose_index(&self, target: Collection) -> Result<LooseIndex, RowFailure> {
        let objects: Vec<Object> = self
            .remote
            .iterate_all(target)
            .try_collect()
            .await
            .map_err(RowFailure::from_remote)?;

        let mut index = LooseIndex::new();
        for object in &objects {
            let name = object.get(target.lookup_key()).and_then(Value::as_str);
            if let (Some(name), Some(id)) = (name, object_id(object)) {
                index.entry(loose_key(name)).or_default().push(id);
            }
        }
        Ok(index)
    }
}

fn matches_loosely(target: Collection) -> bool {
    matches!(
        target,
        Collection::Devices
            | Collection::Manufacturers
            | Collection::Providers
            | Collection::CircuitTypes
    )
}

/// Accents stripped, lowercased, with whitespace, dashes and underscores
/// removed: `"São-Paulo RTR 01"` -> `"saopaulortr01"`.
pub fn loose_key(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '_' | '\u{2013}' | '\u{2014}'))
        .collect()
}

fn not_found(field: &str, target: Collection, value: &str) -> RowFailure {
    RowError::ReferenceNotFound {
        field: field.to_owned(),
        value: value.to_owned(),
        collection: target,
    }
    .into()
}

/// An all-digits cell is taken as an object id.
fn direct_id(value: &str) -> Option<i64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Lowercase, keep `[a-z0-9_]`, collapse everything else into single
/// dashes.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for ch in value.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

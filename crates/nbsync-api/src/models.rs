// Wire shapes shared by every NetBox endpoint.

use serde::Deserialize;
use serde_json::Value;

/// A NetBox object as returned by the API.
///
/// Kept untyped: the set of fields differs per collection and per NetBox
/// release, and callers only ever look up a handful of keys.
pub type Object = serde_json::Map<String, Value>;

/// Paginated list envelope: `{count, next, previous, results}`.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Numeric primary key of an object, if present.
pub fn object_id(obj: &Object) -> Option<i64> {
    obj.get("id").and_then(Value::as_i64)
}

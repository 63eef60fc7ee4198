// ── Scalar coercion ──
//
// Raw cell text to the JSON value NetBox expects. Reference fields never
// come through here; the resolver turns those into ids.

use serde_json::{Number, Value};

use crate::error::RowError;
use crate::schema::ScalarKind;

const TRUE_WORDS: &[&str] = &["true", "yes", "y", "1", "on"];
const FALSE_WORDS: &[&str] = &["false", "no", "n", "0", "off"];

/// Cell values treated as absent.
pub fn is_blank(value: &str) -> bool {
    matches!(value.trim(), "" | "null" | "None")
}

/// Convert one cell. `Ok(None)` means the field is left out of the
/// submission.
pub fn coerce(field: &str, kind: ScalarKind, raw: &str) -> Result<Option<Value>, RowError> {
    let value = raw.trim();
    if is_blank(value) {
        return Ok(None);
    }

    let converted = match kind {
        ScalarKind::Text => Some(Value::String(value.to_owned())),
        ScalarKind::Upper => Some(Value::String(value.to_uppercase())),
        ScalarKind::Integer => value.parse::<i64>().ok().map(Value::from),
        ScalarKind::Decimal => parse_decimal(value),
        ScalarKind::Boolean => parse_bool(value).map(Value::Bool),
    };

    converted.map(Some).ok_or_else(|| RowError::TypeCoercionFailed {
        field: field.to_owned(),
        value: value.to_owned(),
        expected: kind.describe(),
    })
}

fn parse_decimal(value: &str) -> Option<Value> {
    if let Ok(n) = value.parse::<i64>() {
        return Some(Value::from(n));
    }
    value
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn parse_bool(value: &str) -> Option<bool> {
    let lower = value.to_ascii_lowercase();
    if TRUE_WORDS.contains(&lower.as_str()) {
        Some(true)
    } else if FALSE_WORDS.contains(&lower.as_str()) {
        Some(false)
    } else {
        None
    }
}

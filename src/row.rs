//! Row representation and value helpers shared by sorting, filtering and rendering.

use std::cmp::Ordering;

use serde_json::Value;

/// One record: field name to value, in key insertion order.
pub type Row = serde_json::Map<String, Value>;

/// Text form of a value as shown in a cell and as indexed for filtering.
///
/// Strings are used verbatim, null renders empty, and composite values fall
/// back to compact JSON.
pub fn value_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Text of `field` in `row`, empty when the field is missing.
pub fn field_text(row: &Row, field: &str) -> String {
    row.get(field).map(value_text).unwrap_or_default()
}

fn kind_rank(v: Option<&Value>) -> u8 {
    match v {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) | Some(Value::Object(_)) => 4,
    }
}

/// Ascending order of two (possibly missing) values.
///
/// Same-kind values compare naturally; mixed kinds order by kind so the
/// comparator stays total.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x @ (Value::Array(_) | Value::Object(_))), Some(y @ (Value::Array(_) | Value::Object(_)))) => {
            x.to_string().cmp(&y.to_string())
        }
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

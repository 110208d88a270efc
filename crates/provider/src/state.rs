//! Desired-state merge and comparison
//!
//! A `present` reconciliation shallow-merges the caller's data over the
//! fetched resource and compares the result with the original. The
//! comparison follows the OneView module rules: absent keys count as null,
//! any two "empty" values are equal, lists are order-insensitive and scalars
//! are compared by their string form.

use serde_json::{Map, Value};
use std::cmp::Ordering;

use oneview_common::ManagedSan;

/// Overlay the top-level keys of `data` onto `resource`.
///
/// Nested values are replaced wholesale, never merged. Keys absent from
/// `data` keep their current value and position.
pub fn shallow_merge(resource: &ManagedSan, data: &Map<String, Value>) -> ManagedSan {
    let mut merged = resource.attributes().clone();
    for (key, value) in data {
        merged.insert(key.clone(), value.clone());
    }
    ManagedSan::new(merged)
}

/// Whether applying `data` to `resource` would leave it unchanged.
pub fn is_compliant(resource: &ManagedSan, data: &Map<String, Value>) -> bool {
    let merged = shallow_merge(resource, data);
    compare(resource.attributes(), merged.attributes())
}

/// Recursive equivalence of two resource mappings.
pub fn compare(first: &Map<String, Value>, second: &Map<String, Value>) -> bool {
    if !first.is_empty() && second.is_empty() {
        return false;
    }

    for (key, left) in first {
        let Some(right) = second.get(key) else {
            if !left.is_null() {
                return false;
            }
            continue;
        };

        if is_empty(left) && is_empty(right) {
            continue;
        }

        if !compare_values(left, right) {
            return false;
        }
    }

    second
        .iter()
        .all(|(key, right)| first.contains_key(key) || right.is_null())
}

/// Order-insensitive list equivalence.
pub fn compare_list(first: &[Value], second: &Value) -> bool {
    let second = match second {
        Value::Array(items) if !items.is_empty() => items,
        _ => return false,
    };
    if first.len() != second.len() {
        return false;
    }

    let mut left: Vec<&Value> = first.iter().collect();
    let mut right: Vec<&Value> = second.iter().collect();
    left.sort_by(|a, b| sort_order(a, b));
    right.sort_by(|a, b| sort_order(a, b));

    left.iter().zip(right.iter()).all(|(l, r)| {
        // any two empty elements are equal, e.g. [] and {}
        (is_empty(l) && is_empty(r)) || compare_values(l, r)
    })
}

fn compare_values(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => compare(l, r),
        (Value::Object(_), _) => false,
        (Value::Array(l), r) => compare_list(l, r),
        (l, r) => standardize(l) == standardize(r),
    }
}

/// Values treated as "not set": null, false, zero, and empty strings or
/// collections.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// String form used for scalar comparison. Integral floats lose their
/// fractional part so `1` and `1.0` compare equal.
pub fn standardize(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) if f.is_finite() && f.fract() == 0.0 => format!("{:.0}", f),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        other => canonical(other).to_string(),
    }
}

fn sort_key(value: &Value) -> String {
    match value {
        Value::Object(_) | Value::Array(_) => canonical(value).to_string(),
        scalar => standardize(scalar),
    }
}

fn sort_order(a: &Value, b: &Value) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

/// Copy of `value` with every object's keys in sorted order.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonical(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        scalar => scalar.clone(),
    }
}

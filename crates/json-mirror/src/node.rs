//! Node classification for JSON-shaped trees.
//!
//! Every tree node is a mapping, a sequence, or a leaf. The kind is decided
//! once per node and dispatched via pattern matching; no repeated shape
//! probing at every access.

use std::cmp::Ordering;

use serde_json::Value;

/// The three node kinds JSON-shaped data decomposes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// String-keyed object; insertion order preserved for serialization.
    Mapping,
    /// Integer-indexed array; order-significant, dense.
    Sequence,
    /// String, number, boolean, or null.
    Leaf,
}

impl NodeKind {
    /// Classifies a value.
    pub fn of(value: &Value) -> NodeKind {
        match value {
            Value::Object(_) => NodeKind::Mapping,
            Value::Array(_) => NodeKind::Sequence,
            _ => NodeKind::Leaf,
        }
    }

    /// Returns true for mappings and sequences.
    pub fn is_composite(self) -> bool {
        !matches!(self, NodeKind::Leaf)
    }
}

/// Returns the JSON type name of a value, for diagnostics.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Total canonical ordering over JSON values.
///
/// Ranks by type (null < boolean < number < string < array < object), then
/// within a type: booleans false-first, numbers by numeric value, strings
/// lexicographically, arrays element-wise then by length, objects by their
/// serialized form. Used by the sequence views' default `sort`.
pub fn json_cmp(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            // JSON numbers are never NaN
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (xv, yv) in x.iter().zip(y.iter()) {
                let ord = json_cmp(xv, yv);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(_), Value::Object(_)) => {
            let x = serde_json::to_string(a).unwrap_or_default();
            let y = serde_json::to_string(b).unwrap_or_default();
            x.cmp(&y)
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

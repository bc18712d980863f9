//! Dotted-path addressing for JSON trees.
//!
//! Paths identify the location of a node from the document root as a dotted
//! sequence of key/index segments (`"user.roles.0"`). The root itself has no
//! path (`None`); its direct children are addressed by a bare top-level name.
//!
//! # Example
//!
//! ```
//! use json_mirror_path::{join, join_index, split, get};
//!
//! // Combine a parent path with a child segment
//! assert_eq!(join(None, "user"), "user");
//! assert_eq!(join(Some("user"), "name"), "user.name");
//! assert_eq!(join_index(Some("user.roles"), 0), "user.roles.0");
//!
//! // Navigate a document by dotted path
//! let doc = serde_json::json!({"user": {"roles": ["admin"]}});
//! assert_eq!(get(&doc, "user.roles.0"), Some(&serde_json::json!("admin")));
//! ```

use serde_json::Value;

/// Combines a parent path with a child segment.
///
/// Child path = `parent + "." + segment` when the parent path is non-`None`,
/// else the bare segment. The root path is `None` and never appears in the
/// combined string.
pub fn join(parent: Option<&str>, segment: &str) -> String {
    match parent {
        Some(p) => {
            let mut out = String::with_capacity(p.len() + 1 + segment.len());
            out.push_str(p);
            out.push('.');
            out.push_str(segment);
            out
        }
        None => segment.to_string(),
    }
}

/// Combines a parent path with a sequence index.
///
/// ```
/// use json_mirror_path::join_index;
///
/// assert_eq!(join_index(None, 3), "3");
/// assert_eq!(join_index(Some("items"), 3), "items.3");
/// ```
pub fn join_index(parent: Option<&str>, index: usize) -> String {
    join(parent, &index.to_string())
}

/// Iterates the segments of a dotted path.
pub fn split(path: &str) -> impl DoubleEndedIterator<Item = &str> {
    path.split('.')
}

/// Returns the final segment of a dotted path.
///
/// ```
/// use json_mirror_path::last_segment;
///
/// assert_eq!(last_segment("user.roles.0"), "0");
/// assert_eq!(last_segment("user"), "user");
/// ```
pub fn last_segment(path: &str) -> &str {
    split(path).next_back().unwrap_or(path)
}

/// Navigates to the value at a dotted path.
///
/// Segments address object keys; on arrays a segment must parse as a decimal
/// index. Returns `None` when any step is missing or mistyped.
pub fn get<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = doc;
    for segment in split(path) {
        node = match node {
            Value::Object(map) => map.get(segment)?,
            Value::Array(seq) => {
                let index: usize = segment.parse().ok()?;
                seq.get(index)?
            }
            _ => return None,
        };
    }
    Some(node)
}

/// Mutable variant of [`get`].
pub fn get_mut<'a>(doc: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    let mut node = doc;
    for segment in split(path) {
        node = match node {
            Value::Object(map) => map.get_mut(segment)?,
            Value::Array(seq) => {
                let index: usize = segment.parse().ok()?;
                seq.get_mut(index)?
            }
            _ => return None,
        };
    }
    Some(node)
}

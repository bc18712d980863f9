//! json-mirror — a live, mutation-observable in-memory mirror of a JSON
//! document.
//!
//! Reads and writes on arbitrarily nested mappings and sequences go through
//! typed live views; every mutation is detected and reported as structured
//! `Change`/`PropChange` events, and the backing tree can be reconciled
//! in place against an externally-supplied snapshot (e.g. a reloaded file)
//! without discarding unrelated in-memory state.
//!
//! The crate performs no I/O: file watching, debouncing, and text
//! persistence are collaborators that consume the events and the
//! [`Document::parse`]/[`Document::set`] boundary.
//!
//! # Example
//!
//! ```
//! use json_mirror::Document;
//! use serde_json::json;
//!
//! let mut doc = Document::new(json!({"user": {"name": "ada"}, "tags": ["x"]})).unwrap();
//! doc.on_prop_change(|event| {
//!     println!("{:?} -> {:?}", event.fullname, event.value);
//! });
//!
//! // Local mutation through the live view tree.
//! let mut root = doc.root_view();
//! let mut user = root.get("user").unwrap().as_mapping().unwrap();
//! user.set("name", json!("grace"));
//!
//! // External reconciliation: the candidate wins per field.
//! let candidate = Document::parse(r#"{"user": {"name": "grace"}, "tags": ["x", "y"]}"#).unwrap();
//! let changed = doc.set(candidate, true).unwrap();
//! assert!(changed);
//! assert_eq!(doc.to_json_string().unwrap(), r#"{"user":{"name":"grace"},"tags":["x","y"]}"#);
//! ```

pub mod document;
pub mod error;
pub mod event;
pub mod merge;
pub mod node;
pub mod view;

pub use document::Document;
pub use error::DocumentError;
pub use event::{Event, EventKind, Notification, NotificationKind, Observers, Sink};
pub use merge::{merge, merge_mapping};
pub use node::{json_cmp, value_type_name, NodeKind};
pub use view::{MapViewMut, NodeMut, SeqViewMut};

// Re-export serde_json::Value for convenience.
pub use serde_json::Value;

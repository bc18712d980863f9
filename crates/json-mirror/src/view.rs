//! Live mutable views over a backing JSON tree.
//!
//! A view is a façade over a backing node, not a copy: mutating the view
//! mutates the backing data and synchronously reports the mutation to a
//! [`Sink`]. Nested views are constructed lazily on read and are not cached;
//! wrapper identity is irrelevant, backing-node identity is what matters.
//!
//! Writes always notify the sink, including writes that store an unchanged
//! value; equality filtering for public events happens in the notification
//! translation layer. Mutating sequence operations are diffed before/after
//! so each element change is classified as added, removed, or modified.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::event::{Notification, NotificationKind, Sink};
use crate::node::json_cmp;
use json_mirror_path as path;

// ── Lazy wrapper factory ──────────────────────────────────────────────────

/// A lazily constructed view of one tree node.
pub enum NodeMut<'a> {
    Mapping(MapViewMut<'a>),
    Sequence(SeqViewMut<'a>),
    Leaf(&'a Value),
}

impl<'a> NodeMut<'a> {
    /// Wraps a backing node in the view matching its kind.
    pub(crate) fn wrap(
        node: &'a mut Value,
        path: Option<String>,
        sink: &'a mut dyn Sink,
    ) -> NodeMut<'a> {
        match node {
            Value::Object(map) => NodeMut::Mapping(MapViewMut { map, path, sink }),
            Value::Array(seq) => NodeMut::Sequence(SeqViewMut { seq, path, sink }),
            leaf => NodeMut::Leaf(&*leaf),
        }
    }

    pub fn as_mapping(self) -> Option<MapViewMut<'a>> {
        match self {
            NodeMut::Mapping(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_sequence(self) -> Option<SeqViewMut<'a>> {
        match self {
            NodeMut::Sequence(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_leaf(self) -> Option<&'a Value> {
        match self {
            NodeMut::Leaf(value) => Some(value),
            _ => None,
        }
    }
}

// ── Mapping view ──────────────────────────────────────────────────────────

/// Live view of a mapping node.
pub struct MapViewMut<'a> {
    map: &'a mut Map<String, Value>,
    path: Option<String>,
    sink: &'a mut dyn Sink,
}

impl<'a> MapViewMut<'a> {
    pub(crate) fn new(
        map: &'a mut Map<String, Value>,
        path: Option<String>,
        sink: &'a mut dyn Sink,
    ) -> MapViewMut<'a> {
        MapViewMut { map, path, sink }
    }

    /// Dotted path of this node from the root; `None` at the root.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.map.keys()
    }

    /// Reads a key, lazily wrapping composite children.
    pub fn get(&mut self, name: &str) -> Option<NodeMut<'_>> {
        let child_path = path::join(self.path.as_deref(), name);
        let node = self.map.get_mut(name)?;
        Some(NodeMut::wrap(node, Some(child_path), &mut *self.sink))
    }

    /// Assigns a key and notifies the sink before returning.
    ///
    /// Composite values are stored raw, never view-wrapped at write time;
    /// wrapping happens lazily on the next read. Writing a missing key is an
    /// addition, not an error.
    pub fn set(&mut self, name: &str, value: Value) {
        let old_value = self.map.get(name).cloned();
        self.map.insert(name.to_string(), value.clone());
        self.sink.notify(Notification {
            kind: NotificationKind::Value,
            path: Some(path::join(self.path.as_deref(), name)),
            name: name.to_string(),
            old_value,
            value: Some(value),
            index: None,
            added: false,
            removed: false,
        });
    }

    /// Removes a key; a write whose new side is absent.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let old_value = self.map.shift_remove(name)?;
        self.sink.notify(Notification {
            kind: NotificationKind::Value,
            path: Some(path::join(self.path.as_deref(), name)),
            name: name.to_string(),
            old_value: Some(old_value.clone()),
            value: None,
            index: None,
            added: false,
            removed: false,
        });
        Some(old_value)
    }

    /// JSON-serialized form of the backing node.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(&*self.map).unwrap_or_default()
    }
}

// ── Sequence view ─────────────────────────────────────────────────────────

/// Live view of a sequence node.
///
/// Every mutating operation snapshots the elements first, applies the real
/// operation, then compares before/after index-by-index up to
/// `max(old_len, new_len)`: one `ArrayValue` notification per differing
/// index, plus exactly one consolidated `Array` notification when anything
/// differed. An operation that changes nothing notifies nothing. The
/// operation's native return value is returned regardless.
pub struct SeqViewMut<'a> {
    seq: &'a mut Vec<Value>,
    path: Option<String>,
    sink: &'a mut dyn Sink,
}

impl<'a> SeqViewMut<'a> {
    /// Dotted path of this node from the root; `None` at the root.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// Reads an index, lazily wrapping composite children.
    pub fn get(&mut self, index: usize) -> Option<NodeMut<'_>> {
        let child_path = path::join_index(self.path.as_deref(), index);
        let node = self.seq.get_mut(index)?;
        Some(NodeMut::wrap(node, Some(child_path), &mut *self.sink))
    }

    /// Assigns an index and notifies the sink before returning.
    ///
    /// The sequence stays dense: an index at or past the end appends.
    pub fn set(&mut self, index: usize, value: Value) {
        let index = index.min(self.seq.len());
        let old_value = self.seq.get(index).cloned();
        if index == self.seq.len() {
            self.seq.push(value.clone());
        } else {
            self.seq[index] = value.clone();
        }
        self.sink.notify(Notification {
            kind: NotificationKind::Value,
            path: Some(path::join_index(self.path.as_deref(), index)),
            name: index.to_string(),
            old_value,
            value: Some(value),
            index: Some(index),
            added: false,
            removed: false,
        });
    }

    pub fn push(&mut self, value: Value) {
        self.mutate(move |seq| seq.push(value))
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.mutate(|seq| seq.pop())
    }

    /// Inserts at an index, clamped to the end of the sequence.
    pub fn insert(&mut self, index: usize, value: Value) {
        self.mutate(move |seq| {
            let index = index.min(seq.len());
            seq.insert(index, value);
        })
    }

    /// Removes the element at an index, if it exists.
    pub fn remove(&mut self, index: usize) -> Option<Value> {
        self.mutate(move |seq| {
            if index < seq.len() {
                Some(seq.remove(index))
            } else {
                None
            }
        })
    }

    /// Removes `delete_count` elements starting at `start` (both clamped to
    /// the sequence bounds) and inserts `items` in their place. Returns the
    /// removed elements.
    pub fn splice(&mut self, start: usize, delete_count: usize, items: Vec<Value>) -> Vec<Value> {
        self.mutate(move |seq| {
            let start = start.min(seq.len());
            let end = (start + delete_count).min(seq.len());
            seq.splice(start..end, items).collect()
        })
    }

    /// Sorts by the canonical JSON ordering.
    pub fn sort(&mut self) {
        self.mutate(|seq| seq.sort_by(json_cmp))
    }

    pub fn sort_by(&mut self, compare: impl FnMut(&Value, &Value) -> Ordering) {
        self.mutate(move |seq| seq.sort_by(compare))
    }

    pub fn reverse(&mut self) {
        self.mutate(|seq| seq.reverse())
    }

    pub fn clear(&mut self) {
        self.mutate(|seq| seq.clear())
    }

    /// JSON-serialized form of the backing node.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(&*self.seq).unwrap_or_default()
    }

    fn mutate<R>(&mut self, op: impl FnOnce(&mut Vec<Value>) -> R) -> R {
        let before = self.seq.clone();
        let out = op(self.seq);
        self.report(before);
        out
    }

    fn report(&mut self, before: Vec<Value>) {
        let mut any = false;
        let top = before.len().max(self.seq.len());
        for index in 0..top {
            let old_value = before.get(index);
            let value = self.seq.get(index);
            if old_value == value {
                continue;
            }
            any = true;
            self.sink.notify(Notification {
                kind: NotificationKind::ArrayValue,
                path: Some(path::join_index(self.path.as_deref(), index)),
                name: index.to_string(),
                old_value: old_value.cloned(),
                value: value.cloned(),
                index: Some(index),
                added: old_value.is_none(),
                removed: value.is_none(),
            });
        }
        if any {
            let name = match self.path.as_deref() {
                Some(p) => path::last_segment(p).to_string(),
                None => String::new(),
            };
            self.sink.notify(Notification {
                kind: NotificationKind::Array,
                path: self.path.clone(),
                name,
                old_value: Some(Value::Array(before)),
                value: Some(Value::Array(self.seq.clone())),
                index: None,
                added: false,
                removed: false,
            });
        }
    }
}

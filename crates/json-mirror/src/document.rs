//! The owning document.
//!
//! A [`Document`] exclusively owns the backing root mapping and the observer
//! registry. It hands out short-lived live views for local mutation, runs the
//! diff-merge engine for external reconciliation, and re-emits both flows as
//! the same public `Change`/`PropChange` event shapes; callers cannot tell a
//! local mutation from a reconciled external one except via the `external`
//! flag.
//!
//! The document performs no I/O. Persistence collaborators serialize the
//! root on `Change` events; reload collaborators parse fresh text with
//! [`Document::parse`] and hand the candidate tree to [`Document::set`] with
//! `external = true`.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::DocumentError;
use crate::event::{Event, Observers};
use crate::merge::merge_mapping;
use crate::view::MapViewMut;

pub struct Document {
    root: Map<String, Value>,
    observers: Observers,
}

impl Document {
    /// Creates a document over an initial tree, which must be a mapping.
    pub fn new(initial: Value) -> Result<Document, DocumentError> {
        match initial {
            Value::Object(root) => Ok(Document {
                root,
                observers: Observers::new(),
            }),
            _ => Err(DocumentError::NotAMapping),
        }
    }

    /// Creates a document over an initial tree, reconciled with an
    /// already-parsed external candidate (e.g. a pre-existing resource).
    ///
    /// The reconciliation runs before any observer can be registered, so it
    /// emits nothing.
    pub fn with_candidate(initial: Value, candidate: Value) -> Result<Document, DocumentError> {
        let mut doc = Document::new(initial)?;
        let Value::Object(candidate) = candidate else {
            return Err(DocumentError::NotAMapping);
        };
        merge_mapping(&mut doc.root, &candidate, None, true, &mut |_: &Event| {});
        Ok(doc)
    }

    /// Parses candidate JSON text for a reload collaborator.
    ///
    /// Malformed input is surfaced here, never from within the merge itself.
    pub fn parse(text: &str) -> Result<Value, DocumentError> {
        serde_json::from_str(text).map_err(DocumentError::Parse)
    }

    /// Read access to the backing root mapping.
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// The root live view. Mutations through it notify observers
    /// synchronously with `external = false`.
    pub fn root_view(&mut self) -> MapViewMut<'_> {
        let Document { root, observers } = self;
        MapViewMut::new(root, None, observers)
    }

    /// Reconciles the backing root with a candidate tree.
    ///
    /// Runs the diff-merge engine, emitting one `PropChange` per differing
    /// slot tagged with `external`, then one consolidated `Change` carrying
    /// the pre-merge root as `old_value` and the candidate as `value`.
    /// Returns whether anything changed.
    pub fn set(&mut self, incoming: Value, external: bool) -> Result<bool, DocumentError> {
        let Value::Object(incoming) = incoming else {
            return Err(DocumentError::NotAMapping);
        };
        let snapshot = self.root.clone();
        let Document { root, observers } = self;
        let changed = merge_mapping(root, &incoming, None, external, &mut |event| {
            observers.emit(event)
        });
        debug!(changed, external, "document reconciled");
        if changed {
            self.observers.emit(&Event::change(
                None,
                "",
                Some(Value::Object(snapshot)),
                Some(Value::Object(incoming)),
                external,
            ));
        }
        Ok(changed)
    }

    /// Registers an observer for `Change` events, dispatched synchronously
    /// in registration order.
    pub fn on_change(&mut self, observer: impl FnMut(&Event) + 'static) {
        self.observers.on_change(observer);
    }

    /// Registers an observer for `PropChange` events.
    pub fn on_prop_change(&mut self, observer: impl FnMut(&Event) + 'static) {
        self.observers.on_prop_change(observer);
    }

    /// Serializes the backing root; field order is insertion order.
    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        serde_json::to_string(&self.root).map_err(DocumentError::Serialize)
    }

    /// Pretty-printed variant of [`Document::to_json_string`].
    pub fn to_json_string_pretty(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(&self.root).map_err(DocumentError::Serialize)
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root)
            .field("observers", &self.observers)
            .finish()
    }
}

//! Mutation notifications and public change events.
//!
//! The view tree and the merge engine report mutations at two levels:
//!
//! - [`Notification`] — an internal, low-level record of one observed
//!   mutation, pre-classification;
//! - [`Event`] — the externally visible `Change`/`PropChange` record derived
//!   from one or more notifications, identical in shape whether the mutation
//!   was local or an external reconciliation.

use serde_json::Value;

// ── Internal notifications ────────────────────────────────────────────────

/// Classification of a low-level mutation notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// A single assignment on a mapping key or sequence index.
    Value,
    /// A consolidated whole-sequence change, emitted once per mutating
    /// sequence operation that altered anything.
    Array,
    /// A single element change within a sequence operation.
    ArrayValue,
}

/// One observed mutation, as reported by a live view.
///
/// `old_value`/`value` are `None` on the absent side of an addition or
/// removal.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    /// Full dotted path of the touched slot; for [`NotificationKind::Array`]
    /// the path of the sequence itself. `None` at the root.
    pub path: Option<String>,
    /// The key or index segment that was touched.
    pub name: String,
    pub old_value: Option<Value>,
    pub value: Option<Value>,
    pub index: Option<usize>,
    pub added: bool,
    pub removed: bool,
}

/// Receiver of low-level notifications from a live view.
pub trait Sink {
    fn notify(&mut self, notification: Notification);
}

// ── Public events ─────────────────────────────────────────────────────────

/// Discriminant of a public event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Any net effective change, root or nested. Persistence collaborators
    /// typically serialize on this.
    Change,
    /// One per distinct field/element touched; always paired with a
    /// `Change`, never emitted for a no-op.
    PropChange,
}

/// A public change record, dispatched synchronously to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    /// Full dotted path of the changed slot; `None` for a root-level
    /// consolidated change.
    pub fullname: Option<String>,
    /// The changed key or index segment; empty for a root-level change.
    pub name: String,
    pub old_value: Option<Value>,
    pub value: Option<Value>,
    /// True when the change came from an external reconciliation.
    pub external: bool,
    pub index: Option<usize>,
    pub added: bool,
    pub removed: bool,
}

impl Event {
    /// A per-slot `PropChange` event.
    pub fn prop_change(
        fullname: Option<String>,
        name: impl Into<String>,
        old_value: Option<Value>,
        value: Option<Value>,
        external: bool,
    ) -> Event {
        Event {
            kind: EventKind::PropChange,
            fullname,
            name: name.into(),
            old_value,
            value,
            external,
            index: None,
            added: false,
            removed: false,
        }
    }

    /// A `Change` event.
    pub fn change(
        fullname: Option<String>,
        name: impl Into<String>,
        old_value: Option<Value>,
        value: Option<Value>,
        external: bool,
    ) -> Event {
        Event {
            kind: EventKind::Change,
            ..Event::prop_change(fullname, name, old_value, value, external)
        }
    }

    /// Tags a sequence-slot event with its index and add/remove
    /// classification.
    pub fn at_index(mut self, index: usize, added: bool, removed: bool) -> Event {
        self.index = Some(index);
        self.added = added;
        self.removed = removed;
        self
    }
}

// ── Observer registry ─────────────────────────────────────────────────────

type Callback = Box<dyn FnMut(&Event)>;

/// Registered observers, dispatched synchronously in registration order.
///
/// `Change` and `PropChange` have distinct registration points; each list is
/// invoked only for its own event kind.
#[derive(Default)]
pub struct Observers {
    change: Vec<Callback>,
    prop_change: Vec<Callback>,
}

impl Observers {
    pub fn new() -> Observers {
        Observers::default()
    }

    /// Registers an observer for `Change` events.
    pub fn on_change(&mut self, observer: impl FnMut(&Event) + 'static) {
        self.change.push(Box::new(observer));
    }

    /// Registers an observer for `PropChange` events.
    pub fn on_prop_change(&mut self, observer: impl FnMut(&Event) + 'static) {
        self.prop_change.push(Box::new(observer));
    }

    /// Dispatches one event to the observers registered for its kind.
    pub fn emit(&mut self, event: &Event) {
        let observers = match event.kind {
            EventKind::Change => &mut self.change,
            EventKind::PropChange => &mut self.prop_change,
        };
        for observer in observers.iter_mut() {
            observer(event);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("change", &self.change.len())
            .field("prop_change", &self.prop_change.len())
            .finish()
    }
}

/// Translation of local-view notifications into public events.
///
/// A `Value` notification becomes a `PropChange` paired with a `Change`
/// (dropped entirely when the write was a no-op); an `ArrayValue` becomes a
/// `PropChange`; an `Array` becomes the consolidated `Change` for the
/// operation. Local mutations are never `external`.
impl Sink for Observers {
    fn notify(&mut self, n: Notification) {
        match n.kind {
            NotificationKind::Value => {
                if n.old_value == n.value {
                    return;
                }
                self.emit(&Event::prop_change(
                    n.path.clone(),
                    n.name.clone(),
                    n.old_value.clone(),
                    n.value.clone(),
                    false,
                ));
                self.emit(&Event::change(n.path, n.name, n.old_value, n.value, false));
            }
            NotificationKind::ArrayValue => {
                let (index, added, removed) = (n.index.unwrap_or(0), n.added, n.removed);
                self.emit(
                    &Event::prop_change(n.path, n.name, n.old_value, n.value, false)
                        .at_index(index, added, removed),
                );
            }
            NotificationKind::Array => {
                self.emit(&Event::change(n.path, n.name, n.old_value, n.value, false));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<Event>>>, impl FnMut(&Event)) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, move |e: &Event| sink.borrow_mut().push(e.clone()))
    }

    #[test]
    fn dispatch_respects_kind() {
        let mut observers = Observers::new();
        let (changes, on_change) = recorder();
        let (props, on_prop) = recorder();
        observers.on_change(on_change);
        observers.on_prop_change(on_prop);

        observers.emit(&Event::change(None, "", None, Some(json!(1)), false));
        assert_eq!(changes.borrow().len(), 1);
        assert_eq!(props.borrow().len(), 0);

        observers.emit(&Event::prop_change(Some("a".into()), "a", None, Some(json!(1)), false));
        assert_eq!(changes.borrow().len(), 1);
        assert_eq!(props.borrow().len(), 1);
    }

    #[test]
    fn dispatch_in_registration_order() {
        let mut observers = Observers::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Rc::clone(&order);
            observers.on_change(move |_| order.borrow_mut().push(tag));
        }
        observers.emit(&Event::change(None, "", None, None, false));
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn value_notification_pairs_prop_change_with_change() {
        let mut observers = Observers::new();
        let (changes, on_change) = recorder();
        let (props, on_prop) = recorder();
        observers.on_change(on_change);
        observers.on_prop_change(on_prop);

        observers.notify(Notification {
            kind: NotificationKind::Value,
            path: Some("a.b".into()),
            name: "b".into(),
            old_value: Some(json!(1)),
            value: Some(json!(2)),
            index: None,
            added: false,
            removed: false,
        });

        assert_eq!(props.borrow().len(), 1);
        assert_eq!(changes.borrow().len(), 1);
        assert_eq!(props.borrow()[0].fullname.as_deref(), Some("a.b"));
        assert_eq!(changes.borrow()[0].old_value, Some(json!(1)));
    }

    #[test]
    fn noop_value_notification_is_dropped() {
        let mut observers = Observers::new();
        let (changes, on_change) = recorder();
        let (props, on_prop) = recorder();
        observers.on_change(on_change);
        observers.on_prop_change(on_prop);

        observers.notify(Notification {
            kind: NotificationKind::Value,
            path: Some("a".into()),
            name: "a".into(),
            old_value: Some(json!(5)),
            value: Some(json!(5)),
            index: None,
            added: false,
            removed: false,
        });

        assert!(changes.borrow().is_empty());
        assert!(props.borrow().is_empty());
    }

    #[test]
    fn array_value_notification_keeps_classification() {
        let mut observers = Observers::new();
        let (props, on_prop) = recorder();
        observers.on_prop_change(on_prop);

        observers.notify(Notification {
            kind: NotificationKind::ArrayValue,
            path: Some("xs.2".into()),
            name: "2".into(),
            old_value: None,
            value: Some(json!(3)),
            index: Some(2),
            added: true,
            removed: false,
        });

        let props = props.borrow();
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].index, Some(2));
        assert!(props[0].added);
        assert!(!props[0].removed);
    }
}

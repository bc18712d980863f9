//! Recursive diff-merge reconciliation.
//!
//! Reconciles a live tree with a freshly-loaded candidate tree by mutating
//! the live tree in place, emitting one `PropChange` event per differing
//! slot. In-place reconciliation (rather than wholesale replacement)
//! preserves identity of untouched subtrees and yields field-level deltas.
//!
//! Kind mismatches encountered during the merge are not errors; they are
//! valid deltas applied as overwrites. The merge is total over JSON-shaped
//! values and never fails.

use indexmap::IndexSet;
use serde_json::{Map, Value};
use tracing::trace;

use crate::event::Event;
use crate::node::NodeKind;
use json_mirror_path as path;

/// Reconciles `current` with `incoming` in place.
///
/// Emits one `PropChange` per differing slot, tagged with the caller's
/// `external` flag, and returns whether anything changed at or below this
/// node. Leaves compare by value equality; composites of the same kind are
/// always recursed, never equality-compared. The top-level caller is
/// responsible for the consolidated `Change` event.
pub fn merge(
    current: &mut Value,
    incoming: &Value,
    parent_path: Option<&str>,
    external: bool,
    emit: &mut dyn FnMut(&Event),
) -> bool {
    match (current, incoming) {
        (Value::Object(cur), Value::Object(inc)) => {
            merge_mapping(cur, inc, parent_path, external, emit)
        }
        (Value::Array(cur), Value::Array(inc)) => {
            merge_sequence(cur, inc, parent_path, external, emit)
        }
        (cur, inc) => {
            // Leaf pair, or a kind mismatch: overwrite wholesale.
            if *cur == *inc {
                return false;
            }
            let old = std::mem::replace(cur, inc.clone());
            let name = parent_path.map(path::last_segment).unwrap_or_default();
            changed_slot(
                emit,
                Event::prop_change(
                    parent_path.map(String::from),
                    name,
                    Some(old),
                    Some(inc.clone()),
                    external,
                ),
            );
            true
        }
    }
}

/// Mapping branch: key-set union (first-seen order, duplicates removed),
/// then per-key slot reconciliation.
pub fn merge_mapping(
    current: &mut Map<String, Value>,
    incoming: &Map<String, Value>,
    parent_path: Option<&str>,
    external: bool,
    emit: &mut dyn FnMut(&Event),
) -> bool {
    let keys: IndexSet<String> = current.keys().chain(incoming.keys()).cloned().collect();
    let mut changed = false;
    for key in &keys {
        let child_path = path::join(parent_path, key);
        match incoming.get(key) {
            // Key absent on the incoming side: delete the slot.
            None => {
                if let Some(old) = current.shift_remove(key) {
                    changed_slot(
                        emit,
                        Event::prop_change(Some(child_path), key, Some(old), None, external),
                    );
                    changed = true;
                }
            }
            Some(inc_val) => match current.get_mut(key) {
                // Key absent on the current side: addition.
                None => {
                    current.insert(key.clone(), inc_val.clone());
                    changed_slot(
                        emit,
                        Event::prop_change(
                            Some(child_path),
                            key,
                            None,
                            Some(inc_val.clone()),
                            external,
                        ),
                    );
                    changed = true;
                }
                Some(cur_val) => {
                    changed |= merge_slot(cur_val, inc_val, &child_path, key, external, emit);
                }
            },
        }
    }
    changed
}

/// Sequence branch: positional comparison over `0..current.len()`, trailing
/// removals, then appends for `current.len()..incoming.len()`. The sequence
/// is compacted after removals so indices stay dense.
fn merge_sequence(
    current: &mut Vec<Value>,
    incoming: &[Value],
    parent_path: Option<&str>,
    external: bool,
    emit: &mut dyn FnMut(&Event),
) -> bool {
    let mut changed = false;
    let shared = current.len().min(incoming.len());
    for index in 0..shared {
        let child_path = path::join_index(parent_path, index);
        changed |= merge_seq_slot(
            &mut current[index],
            &incoming[index],
            &child_path,
            index,
            external,
            emit,
        );
    }
    // Trailing slots absent on the incoming side: remove and compact.
    if current.len() > incoming.len() {
        for index in incoming.len()..current.len() {
            let child_path = path::join_index(parent_path, index);
            changed_slot(
                emit,
                Event::prop_change(
                    Some(child_path),
                    index.to_string(),
                    Some(current[index].clone()),
                    None,
                    external,
                )
                .at_index(index, false, true),
            );
        }
        current.truncate(incoming.len());
        changed = true;
    }
    // Trailing slots absent on the current side: append.
    for index in current.len()..incoming.len() {
        current.push(incoming[index].clone());
        let child_path = path::join_index(parent_path, index);
        changed_slot(
            emit,
            Event::prop_change(
                Some(child_path),
                index.to_string(),
                None,
                Some(incoming[index].clone()),
                external,
            )
            .at_index(index, true, false),
        );
        changed = true;
    }
    changed
}

/// Mapping-slot reconciliation where both sides are present: recurse when
/// both are composite of the same kind, otherwise overwrite on difference.
fn merge_slot(
    cur_val: &mut Value,
    inc_val: &Value,
    child_path: &str,
    key: &str,
    external: bool,
    emit: &mut dyn FnMut(&Event),
) -> bool {
    let cur_kind = NodeKind::of(cur_val);
    if cur_kind.is_composite() && cur_kind == NodeKind::of(inc_val) {
        return merge(cur_val, inc_val, Some(child_path), external, emit);
    }
    if *cur_val == *inc_val {
        return false;
    }
    let old = std::mem::replace(cur_val, inc_val.clone());
    changed_slot(
        emit,
        Event::prop_change(
            Some(child_path.to_string()),
            key,
            Some(old),
            Some(inc_val.clone()),
            external,
        ),
    );
    true
}

/// Sequence-slot variant of [`merge_slot`]; overwrites carry the index tag.
fn merge_seq_slot(
    cur_val: &mut Value,
    inc_val: &Value,
    child_path: &str,
    index: usize,
    external: bool,
    emit: &mut dyn FnMut(&Event),
) -> bool {
    let cur_kind = NodeKind::of(cur_val);
    if cur_kind.is_composite() && cur_kind == NodeKind::of(inc_val) {
        return merge(cur_val, inc_val, Some(child_path), external, emit);
    }
    if *cur_val == *inc_val {
        return false;
    }
    let old = std::mem::replace(cur_val, inc_val.clone());
    changed_slot(
        emit,
        Event::prop_change(
            Some(child_path.to_string()),
            index.to_string(),
            Some(old),
            Some(inc_val.clone()),
            external,
        )
        .at_index(index, false, false),
    );
    true
}

fn changed_slot(emit: &mut dyn FnMut(&Event), event: Event) {
    trace!(
        path = event.fullname.as_deref().unwrap_or(""),
        added = event.added,
        removed = event.removed,
        "merge slot changed"
    );
    emit(&event);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn run(current: &mut Value, incoming: Value) -> (bool, Vec<Event>) {
        let mut events = Vec::new();
        let changed = merge(current, &incoming, None, true, &mut |e| events.push(e.clone()));
        (changed, events)
    }

    #[test]
    fn equal_trees_emit_nothing() {
        let mut current = json!({"a": 1, "b": [1, 2]});
        let (changed, events) = run(&mut current, json!({"a": 1, "b": [1, 2]}));
        assert!(!changed);
        assert!(events.is_empty());
    }

    #[test]
    fn leaf_difference_overwrites() {
        let mut current = json!({"a": 1});
        let (changed, events) = run(&mut current, json!({"a": 2}));
        assert!(changed);
        assert_eq!(current, json!({"a": 2}));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fullname.as_deref(), Some("a"));
        assert_eq!(events[0].old_value, Some(json!(1)));
        assert_eq!(events[0].value, Some(json!(2)));
        assert!(events[0].external);
    }

    #[test]
    fn removed_key_emits_absent_new_side() {
        let mut current = json!({"a": 1, "b": 2});
        let (_, events) = run(&mut current, json!({"b": 2}));
        assert_eq!(current, json!({"b": 2}));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fullname.as_deref(), Some("a"));
        assert_eq!(events[0].value, None);
    }

    #[test]
    fn added_key_emits_absent_old_side() {
        let mut current = json!({"a": 1});
        let (_, events) = run(&mut current, json!({"a": 1, "b": 2}));
        assert_eq!(current, json!({"a": 1, "b": 2}));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fullname.as_deref(), Some("b"));
        assert_eq!(events[0].old_value, None);
        assert_eq!(events[0].value, Some(json!(2)));
    }

    #[test]
    fn key_union_first_seen_order() {
        let mut current = json!({"a": 1, "b": 2});
        let (_, events) = run(&mut current, json!({"b": 2, "c": 3}));
        // Union order a, b, c: removal of a first, then addition of c.
        assert_eq!(events[0].fullname.as_deref(), Some("a"));
        assert_eq!(events[1].fullname.as_deref(), Some("c"));
    }

    #[test]
    fn kind_mismatch_is_an_overwrite_not_an_error() {
        let mut current = json!({"a": {"x": 1}});
        let (_, events) = run(&mut current, json!({"a": 5}));
        assert_eq!(current, json!({"a": 5}));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].old_value, Some(json!({"x": 1})));
        assert_eq!(events[0].value, Some(json!(5)));
    }

    #[test]
    fn array_vs_mapping_is_an_overwrite() {
        let mut current = json!({"a": [1]});
        let (_, events) = run(&mut current, json!({"a": {"0": 1}}));
        assert_eq!(current, json!({"a": {"0": 1}}));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn nested_recursion_addresses_the_leaf() {
        let mut current = json!({"a": {"b": {"c": 1}}});
        let (_, events) = run(&mut current, json!({"a": {"b": {"c": 2}}}));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fullname.as_deref(), Some("a.b.c"));
    }

    #[test]
    fn sequence_shrink_emits_removed_and_compacts() {
        let mut current = json!({"xs": [1, 2, 3]});
        let (_, events) = run(&mut current, json!({"xs": [1, 2]}));
        assert_eq!(current, json!({"xs": [1, 2]}));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fullname.as_deref(), Some("xs.2"));
        assert_eq!(events[0].index, Some(2));
        assert!(events[0].removed);
        assert_eq!(events[0].old_value, Some(json!(3)));
        assert_eq!(current["xs"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn sequence_grow_emits_added() {
        let mut current = json!({"xs": [1, 2]});
        let (_, events) = run(&mut current, json!({"xs": [1, 2, 3]}));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fullname.as_deref(), Some("xs.2"));
        assert!(events[0].added);
        assert_eq!(events[0].value, Some(json!(3)));
    }

    #[test]
    fn sequence_element_overwrite_carries_index() {
        let mut current = json!({"xs": [1, 2, 3]});
        let (_, events) = run(&mut current, json!({"xs": [1, 9, 3]}));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].index, Some(1));
        assert!(!events[0].added);
        assert!(!events[0].removed);
    }

    #[test]
    fn sequence_of_mappings_recurses_per_element() {
        let mut current = json!({"xs": [{"id": 1}, {"id": 2}]});
        let (_, events) = run(&mut current, json!({"xs": [{"id": 1}, {"id": 3}]}));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fullname.as_deref(), Some("xs.1.id"));
    }

    #[test]
    fn top_level_leaf_pair_overwrites() {
        let mut current = json!(1);
        let (changed, events) = run(&mut current, json!(2));
        assert!(changed);
        assert_eq!(current, json!(2));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fullname, None);
    }

    #[test]
    fn merge_is_idempotent_at_fixed_point() {
        let mut current = json!({"a": 1, "b": [1, 2], "c": {"d": null}});
        let incoming = json!({"a": 2, "b": [1], "c": {"e": true}});
        let (changed, _) = run(&mut current, incoming.clone());
        assert!(changed);
        assert_eq!(current, incoming);
        let (changed, events) = run(&mut current, incoming);
        assert!(!changed);
        assert!(events.is_empty());
    }

    // ── Property tests ────────────────────────────────────────────────────

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(Value::from),
            "[a-z]{0,6}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                proptest::collection::vec(("[a-z]{1,4}", inner), 0..4).prop_map(|entries| {
                    let mut map = serde_json::Map::new();
                    for (key, value) in entries {
                        map.insert(key, value);
                    }
                    Value::Object(map)
                }),
            ]
        })
    }

    proptest! {
        #[test]
        fn merge_converges_and_second_pass_is_silent(
            a in arb_json(),
            b in arb_json(),
        ) {
            let mut current = a;
            merge(&mut current, &b, None, true, &mut |_: &Event| {});
            prop_assert_eq!(&current, &b);

            let mut events = 0usize;
            let changed = merge(&mut current, &b, None, true, &mut |_| events += 1);
            prop_assert!(!changed);
            prop_assert_eq!(events, 0);
        }

        #[test]
        fn merged_sequences_stay_dense(a in arb_json(), b in arb_json()) {
            let mut current = a;
            merge(&mut current, &b, None, true, &mut |_: &Event| {});
            // Convergence implies density: incoming arrays are dense Vecs.
            prop_assert_eq!(current, b);
        }
    }
}

//! State tree and the deep-merge overlay.
//!
//! The tree is the accumulated view of server-reported state. It only ever
//! grows or has values overwritten; a key that an update omits keeps its
//! last known value.
//!
//! Merge rules, applied per key present in the update:
//! - both sides are objects: merge recursively
//! - anything else (scalar, array, null, type mismatch): the update wins

use serde_json::map::Entry;
use serde_json::{Map, Value};

use crate::error::MalformedUpdate;

/// Accumulated server state: string keys to arbitrarily nested JSON values.
pub type StateTree = Map<String, Value>;

/// Decode one inbound payload into a partial update.
///
/// The top level must be a JSON object; partial updates have the same shape
/// as a tree fragment.
pub fn parse_update(raw: &str) -> Result<StateTree, MalformedUpdate> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        other => Err(MalformedUpdate::NotAnObject(json_kind(&other))),
    }
}

/// Overlay `update` onto `target` in place.
///
/// Returns `true` if any value in `target` changed.
pub fn merge_into(target: &mut StateTree, update: StateTree) -> bool {
    let mut changed = false;
    for (key, incoming) in update {
        match target.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(incoming);
                changed = true;
            }
            Entry::Occupied(mut slot) => match (slot.get_mut(), incoming) {
                (Value::Object(existing), Value::Object(nested)) => {
                    changed |= merge_into(existing, nested);
                }
                (existing, incoming) => {
                    if *existing != incoming {
                        *existing = incoming;
                        changed = true;
                    }
                }
            },
        }
    }
    changed
}

/// Pure form of [`merge_into`]: `merge(base, update)` overlays `update` onto a
/// copy of `base`.
pub fn merge(base: &StateTree, update: &StateTree) -> StateTree {
    let mut out = base.clone();
    merge_into(&mut out, update.clone());
    out
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(value: Value) -> StateTree {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    // -----------------------------------------------------------------------
    // merge
    // -----------------------------------------------------------------------

    #[test]
    fn nested_keys_accumulate_then_scalar_replaces_object() {
        let mut state = StateTree::new();

        merge_into(&mut state, tree(json!({"a": {"x": 1}})));
        assert_eq!(Value::Object(state.clone()), json!({"a": {"x": 1}}));

        merge_into(&mut state, tree(json!({"a": {"y": 2}})));
        assert_eq!(Value::Object(state.clone()), json!({"a": {"x": 1, "y": 2}}));

        merge_into(&mut state, tree(json!({"a": 5})));
        assert_eq!(Value::Object(state), json!({"a": 5}));
    }

    #[test]
    fn absent_keys_are_untouched() {
        let mut state = tree(json!({"cpu": 0.4, "modules": {"scraper": "up"}}));
        merge_into(&mut state, tree(json!({"cpu": 0.9})));
        assert_eq!(
            Value::Object(state),
            json!({"cpu": 0.9, "modules": {"scraper": "up"}})
        );
    }

    #[test]
    fn arrays_are_replaced_not_merged() {
        let mut state = tree(json!({"peers": [1, 2, 3]}));
        merge_into(&mut state, tree(json!({"peers": [9]})));
        assert_eq!(Value::Object(state), json!({"peers": [9]}));
    }

    #[test]
    fn object_replaces_scalar() {
        let mut state = tree(json!({"a": "ready"}));
        merge_into(&mut state, tree(json!({"a": {"phase": 2}})));
        assert_eq!(Value::Object(state), json!({"a": {"phase": 2}}));
    }

    #[test]
    fn null_overwrites_existing_value() {
        let mut state = tree(json!({"a": {"x": 1}}));
        merge_into(&mut state, tree(json!({"a": null})));
        assert_eq!(Value::Object(state), json!({"a": null}));
    }

    #[test]
    fn deeply_nested_branches_are_preserved() {
        let mut state = tree(json!({"a": {"b": {"c": 1, "d": 2}, "e": true}}));
        merge_into(&mut state, tree(json!({"a": {"b": {"d": 3}}})));
        assert_eq!(
            Value::Object(state),
            json!({"a": {"b": {"c": 1, "d": 3}, "e": true}})
        );
    }

    #[test]
    fn empty_update_changes_nothing() {
        let mut state = tree(json!({"a": 1}));
        assert!(!merge_into(&mut state, StateTree::new()));
        assert_eq!(Value::Object(state), json!({"a": 1}));
    }

    #[test]
    fn reapplying_same_update_is_idempotent() {
        let update = tree(json!({"a": {"x": 1}, "b": [1, 2]}));
        let mut state = StateTree::new();

        assert!(merge_into(&mut state, update.clone()));
        let once = state.clone();
        assert!(!merge_into(&mut state, update), "second apply should be a no-op");
        assert_eq!(state, once);
    }

    #[test]
    fn sequential_merge_equals_nested_pure_merge() {
        let u1 = tree(json!({"a": {"x": 1}, "k": "v"}));
        let u2 = tree(json!({"a": {"y": 2}, "k": {"n": 0}}));

        let mut state = StateTree::new();
        merge_into(&mut state, u1.clone());
        merge_into(&mut state, u2.clone());

        assert_eq!(state, merge(&merge(&StateTree::new(), &u1), &u2));
    }

    #[test]
    fn pure_merge_leaves_base_untouched() {
        let base = tree(json!({"a": 1}));
        let merged = merge(&base, &tree(json!({"b": 2})));
        assert_eq!(Value::Object(base), json!({"a": 1}));
        assert_eq!(Value::Object(merged), json!({"a": 1, "b": 2}));
    }

    // -----------------------------------------------------------------------
    // parse_update
    // -----------------------------------------------------------------------

    #[test]
    fn parse_object_payload() {
        let update = parse_update(r#"{"status": {"online": true}}"#).unwrap();
        assert_eq!(Value::Object(update), json!({"status": {"online": true}}));
    }

    #[test]
    fn parse_invalid_json_is_malformed() {
        let err = parse_update("this is not valid json {{{").unwrap_err();
        assert!(matches!(err, MalformedUpdate::Parse(_)), "got {err:?}");
    }

    #[test]
    fn parse_non_object_is_malformed() {
        let cases = [
            ("5", "number"),
            ("[1,2]", "array"),
            ("null", "null"),
            (r#""s""#, "string"),
        ];
        for (raw, kind) in cases {
            match parse_update(raw) {
                Err(MalformedUpdate::NotAnObject(got)) => assert_eq!(got, kind, "payload {raw}"),
                other => panic!("payload {raw}: expected NotAnObject, got {other:?}"),
            }
        }
    }
}

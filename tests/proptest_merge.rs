//! Property-based tests with proptest.
//!
//! Generate random paths and values, render them as expressions, and
//! check the merge rules hold whatever the shape.

mod common;

use proptest::prelude::*;
use serde_json::{Value as Json, json};
use yo_rs::context::merge_values;

/// Bare identifier that is not a keyword.
fn ident() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}".prop_filter("keyword", |s| {
        !matches!(s.as_str(), "true" | "false" | "null" | "nil")
    })
}

fn path() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(ident(), 1..=5)
}

fn nested_literal(path: &[String], value: i64) -> String {
    match path {
        [] => value.to_string(),
        [last] => format!("{last}={value}"),
        [head, rest @ ..] => format!("{head}={{{}}}", nested_literal(rest, value)),
    }
}

fn nested_json(path: &[String], value: Json) -> Json {
    path.iter()
        .rev()
        .fold(value, |inner, key| json!({ key.as_str(): inner }))
}

/// Small JSON trees: objects of objects with integer leaves.
fn tree() -> impl Strategy<Value = Json> {
    let leaf = (-100_i64..100).prop_map(Json::from);
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop::collection::btree_map(ident(), inner, 0..4)
            .prop_map(|map| Json::Object(map.into_iter().collect()))
    })
}

/// Every leaf of `overlay` appears unchanged in `merged`.
fn covers(merged: &Json, overlay: &Json) -> bool {
    match (merged, overlay) {
        (Json::Object(m), Json::Object(o)) => o
            .iter()
            .all(|(k, v)| m.get(k).is_some_and(|mv| covers(mv, v))),
        (m, o) => m == o,
    }
}

proptest! {
    #[test]
    fn dotted_path_matches_nested_literal(path in path(), value in -1000_i64..1000) {
        let dotted = format!("{}={value}", path.join("."));
        let expected = nested_json(&path, json!(value));
        prop_assert_eq!(common::document(&dotted), expected.clone());
        prop_assert_eq!(common::document(&nested_literal(&path, value)), expected);
    }

    #[test]
    fn last_scalar_wins(path in path(), first in -1000_i64..1000, second in -1000_i64..1000) {
        let key = path.join(".");
        let doc = common::document(&format!("{key}={first} {key}={second}"));
        prop_assert_eq!(doc, nested_json(&path, json!(second)));
    }

    #[test]
    fn sibling_paths_merge(
        prefix in path(),
        (left, right) in (ident(), ident()).prop_filter("distinct", |(l, r)| l != r),
    ) {
        let prefix = prefix.join(".");
        let doc = common::document(&format!("{prefix}.{left}=1 {prefix}.{right}=2"));
        let mut cursor = &doc;
        for segment in prefix.split('.') {
            cursor = &cursor[segment];
        }
        prop_assert_eq!(&cursor[left.as_str()], &json!(1));
        prop_assert_eq!(&cursor[right.as_str()], &json!(2));
    }

    #[test]
    fn context_merge_is_idempotent(value in tree()) {
        prop_assert_eq!(merge_values(value.clone(), value.clone()), value);
    }

    #[test]
    fn context_merge_keeps_overlay_leaves(base in tree(), overlay in tree()) {
        let merged = merge_values(base, overlay.clone());
        prop_assert!(covers(&merged, &overlay));
    }
}

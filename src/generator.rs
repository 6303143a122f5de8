//! Generator trees: the parse result before materialization.
//!
//! Repeated assignments to the same field are combined with
//! [`Generator::merge`]: objects merge key by key, everything else is
//! replaced by the incoming value.

use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::value::{Scalar, Value};

/// A node of a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub enum Generator {
    /// Leaf value.
    Scalar(Scalar),
    /// Named fields.
    Object(Object),
    /// Ordered items.
    Array(Vec<Self>),
}

/// Field map of an object generator. Keys are unique.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    fields: BTreeMap<String, Generator>,
}

impl Generator {
    /// Combine `self` with a later value for the same field.
    ///
    /// Two objects merge recursively; in every other case the incoming
    /// generator wins.
    #[must_use]
    pub fn merge(self, incoming: Self) -> Self {
        match (self, incoming) {
            (Self::Object(existing), Self::Object(incoming)) => {
                Self::Object(existing.merged(incoming))
            }
            (_, incoming) => incoming,
        }
    }

    /// Convert the tree into a plain value.
    #[must_use]
    pub fn materialize(&self) -> Value {
        match self {
            Self::Scalar(scalar) => scalar.clone().into(),
            Self::Object(object) => object.materialize(),
            Self::Array(items) => Value::Array(items.iter().map(Self::materialize).collect()),
        }
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl Object {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Object holding a single field.
    #[must_use]
    pub fn single(field: impl Into<String>, value: Generator) -> Self {
        let mut object = Self::new();
        object.add(field, value);
        object
    }

    /// Insert a field, merging with any value already stored under it.
    pub fn add(&mut self, field: impl Into<String>, value: Generator) {
        let field = field.into();
        let value = match self.fields.remove(&field) {
            Some(existing) => existing.merge(value),
            None => value,
        };
        self.fields.insert(field, value);
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Generator> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Generator> {
        self.fields.iter()
    }

    fn merged(mut self, incoming: Self) -> Self {
        for (field, value) in incoming.fields {
            self.add(field, value);
        }
        self
    }

    fn materialize(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(field, value)| (field.clone(), value.materialize()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = (&'a String, &'a Generator);
    type IntoIter = btree_map::Iter<'a, String, Generator>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Generator {
        Generator::Scalar(Scalar::Int(n))
    }

    #[test]
    fn scalar_merge_takes_incoming() {
        let merged = int(1).merge(int(2));
        assert_eq!(merged.materialize(), Value::Int(2));
    }

    #[test]
    fn scalar_merge_with_any_kind() {
        let others = [
            Generator::Object(Object::new()),
            Generator::Array(Vec::new()),
            int(42),
        ];
        for other in others {
            assert_eq!(int(7).merge(other.clone()), other);
        }
    }

    #[test]
    fn array_never_merges() {
        let first = Generator::Array(vec![int(1), int(2)]);
        let second = Generator::Array(vec![int(3)]);
        assert_eq!(first.merge(second.clone()), second);
    }

    #[test]
    fn object_replaced_by_non_object() {
        let object = Generator::Object(Object::single("a", int(1)));
        assert_eq!(object.merge(int(5)), int(5));
    }

    #[test]
    fn objects_merge_recursively() {
        let left = Generator::Object(Object::single(
            "parent",
            Generator::Object(Object::single("child1", int(1))),
        ));
        let right = Generator::Object(Object::single(
            "parent",
            Generator::Object(Object::single("child2", int(2))),
        ));

        let merged = left.merge(right);
        let parent = merged
            .as_object()
            .and_then(|o| o.get("parent"))
            .and_then(Generator::as_object)
            .expect("parent object");
        assert_eq!(parent.len(), 2);
        assert_eq!(parent.get("child1"), Some(&int(1)));
        assert_eq!(parent.get("child2"), Some(&int(2)));
    }

    #[test]
    fn add_merges_existing_field() {
        let mut object = Object::new();
        object.add("a", int(1));
        object.add("a", int(2));
        assert_eq!(object.len(), 1);
        assert_eq!(object.get("a"), Some(&int(2)));
    }

    #[test]
    fn array_materializes_in_order() {
        let array = Generator::Array(vec![
            int(6),
            Generator::Scalar(Scalar::Bool(true)),
            Generator::Scalar(Scalar::String(" aloha".to_string())),
        ]);
        assert_eq!(
            array.materialize(),
            Value::Array(vec![
                Value::Int(6),
                Value::Bool(true),
                Value::String(" aloha".to_string()),
            ])
        );
    }
}

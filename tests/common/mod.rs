#![allow(dead_code)]

use serde_json::Value as Json;
use yo_rs::{Context, Engine, Error, Generator, parse};

/// Engine with a fixed seed so random builtins are reproducible.
pub fn engine() -> Engine {
    Engine::new(7)
}

pub fn context(value: Json) -> Context {
    match value {
        Json::Object(map) => map,
        other => panic!("context must be an object, got {other}"),
    }
}

pub fn parse_ok(input: &str) -> Vec<Generator> {
    parse(input, &Context::new(), &mut engine())
        .unwrap_or_else(|e| panic!("failed to parse {input:?}: {e}"))
}

pub fn parse_err(input: &str) -> Error {
    match parse(input, &Context::new(), &mut engine()) {
        Ok(documents) => panic!("expected {input:?} to fail, got {documents:?}"),
        Err(e) => e,
    }
}

/// Materialize every root document as JSON.
pub fn documents(input: &str) -> Vec<Json> {
    parse_ok(input)
        .iter()
        .map(|doc| serde_json::to_value(doc.materialize()).expect("serialize"))
        .collect()
}

/// Materialize the single root document as JSON.
pub fn document(input: &str) -> Json {
    let mut docs = documents(input);
    assert_eq!(docs.len(), 1, "expected one document for {input:?}");
    docs.remove(0)
}

pub fn document_with(input: &str, data: &Context) -> Json {
    let docs = parse(input, data, &mut engine())
        .unwrap_or_else(|e| panic!("failed to parse {input:?}: {e}"));
    assert_eq!(docs.len(), 1);
    serde_json::to_value(docs[0].materialize()).expect("serialize")
}

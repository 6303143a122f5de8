//! Data context assembly.
//!
//! Value files (YAML or JSON) are deep-merged in order, then every
//! `--set key.path=value` expression is applied on top.

use std::fs;
use std::io::{self, Read};
use std::mem;
use std::path::Path;

use serde_json::Value as Json;

/// The data handed to expressions. Read-only during parsing.
pub type Context = serde_json::Map<String, Json>;

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{path}: top-level value must be a mapping")]
    NotAMapping { path: String },
    #[error("invalid set expression {0:?}: expected key=value")]
    InvalidSet(String),
}

/// Load and deep-merge value files; `-` reads standard input.
///
/// # Errors
///
/// Fails when a file cannot be read or parsed, or does not hold a mapping.
pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Context, ContextError> {
    let mut context = Context::new();
    for path in paths {
        let path = path.as_ref();
        let name = path.display().to_string();
        tracing::debug!(path = %name, "loading values");

        let text = read_source(path).map_err(|source| ContextError::Read {
            path: name.clone(),
            source,
        })?;
        let value: Json = serde_yaml::from_str(&text).map_err(|source| ContextError::Parse {
            path: name.clone(),
            source,
        })?;
        match value {
            Json::Object(map) => merge_maps(&mut context, map),
            Json::Null => {}
            _ => return Err(ContextError::NotAMapping { path: name }),
        }
    }
    Ok(context)
}

fn read_source(path: &Path) -> io::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        Ok(text)
    } else {
        fs::read_to_string(path)
    }
}

/// Maps merge recursively; any other pairing keeps `overlay`.
#[must_use]
pub fn merge_values(base: Json, overlay: Json) -> Json {
    match (base, overlay) {
        (Json::Object(mut base), Json::Object(overlay)) => {
            merge_maps(&mut base, overlay);
            Json::Object(base)
        }
        (_, overlay) => overlay,
    }
}

pub fn merge_maps(base: &mut Context, overlay: Context) {
    for (key, value) in overlay {
        let merged = match base.remove(&key) {
            Some(existing) => merge_values(existing, value),
            None => value,
        };
        base.insert(key, merged);
    }
}

/// Apply `a.b=1,c={x,y}`. A backslash escapes a comma; intermediate
/// non-map values are replaced by maps.
///
/// # Errors
///
/// Fails on a pair without `=` or with an empty key segment.
pub fn apply_set(context: &mut Context, expr: &str) -> Result<(), ContextError> {
    tracing::debug!(expr, "applying set expression");
    for pair in split_top_level(expr) {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| ContextError::InvalidSet(pair.clone()))?;
        let path: Vec<&str> = key.trim().split('.').collect();
        if path.iter().any(|segment| segment.is_empty()) {
            return Err(ContextError::InvalidSet(pair.clone()));
        }
        set_path(context, &path, typed(raw));
    }
    Ok(())
}

/// Load `files`, then apply every set expression in order.
///
/// # Errors
///
/// See [`load_files`] and [`apply_set`].
pub fn assemble<P: AsRef<Path>, S: AsRef<str>>(
    files: &[P],
    sets: &[S],
) -> Result<Context, ContextError> {
    let mut context = load_files(files)?;
    for set in sets {
        apply_set(&mut context, set.as_ref())?;
    }
    Ok(context)
}

/// Split on commas outside braces, keeping escapes for a later pass.
fn split_top_level(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0_usize;
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => parts.push(mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

fn unescape(text: &str) -> String {
    text.replace("\\,", ",")
}

fn typed(raw: &str) -> Json {
    if let Some(inner) = raw.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
        if inner.is_empty() {
            return Json::Array(Vec::new());
        }
        return Json::Array(
            split_top_level(inner)
                .iter()
                .map(|item| Json::String(unescape(item)))
                .collect(),
        );
    }
    match raw {
        "true" => Json::Bool(true),
        "false" => Json::Bool(false),
        "null" => Json::Null,
        _ => raw
            .parse::<i64>()
            .map_or_else(|_| Json::String(unescape(raw)), Json::from),
    }
}

fn set_path(map: &mut Context, path: &[&str], value: Json) {
    match path {
        [] => {}
        [last] => {
            map.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let entry = map
                .entry((*head).to_string())
                .or_insert_with(|| Json::Object(Context::new()));
            if !entry.is_object() {
                *entry = Json::Object(Context::new());
            }
            if let Json::Object(child) = entry {
                set_path(child, rest, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(expr: &str) -> Json {
        let mut context = Context::new();
        apply_set(&mut context, expr).expect("set");
        Json::Object(context)
    }

    #[test]
    fn typed_values() {
        assert_eq!(
            set("a=true,b=null,c=42,d=hello,e=-7,f=1.5"),
            json!({"a": true, "b": null, "c": 42, "d": "hello", "e": -7, "f": "1.5"})
        );
    }

    #[test]
    fn dotted_keys_nest() {
        assert_eq!(
            set("image.tag=v1,image.name=app"),
            json!({"image": {"tag": "v1", "name": "app"}})
        );
    }

    #[test]
    fn lists_and_escapes() {
        assert_eq!(
            set(r"names={a,b},greeting=hello\, world"),
            json!({"names": ["a", "b"], "greeting": "hello, world"})
        );
        assert_eq!(set("empty={}"), json!({"empty": []}));
    }

    #[test]
    fn scalar_replaced_by_map() {
        let mut context = Context::new();
        apply_set(&mut context, "a=1").expect("set");
        apply_set(&mut context, "a.b=2").expect("set");
        assert_eq!(Json::Object(context), json!({"a": {"b": 2}}));
    }

    #[test]
    fn invalid_pairs() {
        let mut context = Context::new();
        assert!(matches!(
            apply_set(&mut context, "novalue"),
            Err(ContextError::InvalidSet(_))
        ));
        assert!(matches!(
            apply_set(&mut context, "a..b=1"),
            Err(ContextError::InvalidSet(_))
        ));
    }

    #[test]
    fn deep_merge() {
        let merged = merge_values(
            json!({"a": {"x": 1, "y": [1]}, "b": 1}),
            json!({"a": {"y": [2], "z": 3}, "b": {"c": 1}}),
        );
        assert_eq!(
            merged,
            json!({"a": {"x": 1, "y": [2], "z": 3}, "b": {"c": 1}})
        );
    }
}

//! Serialization of materialized documents to YAML or JSON text.

use std::fmt;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::value::Value;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Yaml,
    Json,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yaml => f.write_str("yaml"),
            Self::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("cannot render yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("cannot render json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rendered json is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Render every document in order.
///
/// YAML documents after the first are preceded by a `---` line. JSON
/// documents are indented with three spaces and end with a newline.
pub fn render(documents: &[Value], format: Format) -> Result<String, RenderError> {
    let mut out = String::new();
    for (idx, document) in documents.iter().enumerate() {
        match format {
            Format::Yaml => {
                if idx > 0 {
                    out.push_str("---\n");
                }
                out.push_str(&serde_yaml::to_string(document)?);
            }
            Format::Json => {
                out.push_str(&to_json(document)?);
                out.push('\n');
            }
        }
    }
    Ok(out)
}

fn to_json(document: &Value) -> Result<String, RenderError> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"   "));
    document.serialize(&mut serializer)?;
    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn object(fields: &[(&str, Value)]) -> Value {
        Value::Object(
            fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn yaml_single_document() {
        let doc = object(&[("a", Value::Int(1)), ("b", Value::String("x".into()))]);
        assert_eq!(render(&[doc], Format::Yaml).expect("render"), "a: 1\nb: x\n");
    }

    #[test]
    fn yaml_documents_are_separated() {
        let docs = [
            object(&[("a", Value::Int(1))]),
            object(&[("b", Value::Int(2))]),
        ];
        assert_eq!(
            render(&docs, Format::Yaml).expect("render"),
            "a: 1\n---\nb: 2\n"
        );
    }

    #[test]
    fn json_uses_three_space_indent() {
        let doc = object(&[("a", Value::Array(vec![Value::Bool(true)]))]);
        assert_eq!(
            render(&[doc], Format::Json).expect("render"),
            "{\n   \"a\": [\n      true\n   ]\n}\n"
        );
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(render(&[], Format::Json).expect("render"), "");
        assert_eq!(Format::default(), Format::Yaml);
    }
}

//! Inline expression evaluation.
//!
//! The parser hands the text of every `( ... )` token to an
//! [`Evaluate`] implementation. [`Engine`] is the standard one: a small
//! pipeline language over a library of builtin functions.

mod date;
pub mod expr;
pub mod functions;
mod strings;
pub mod value;

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

use crate::context::Context;
use expr::{Command, Operand, Pipeline};
pub use functions::{Arity, Builtin, Call, Functions};
pub use value::Value;

/// Errors raised while evaluating an inline expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("function {0:?} not defined")]
    UnknownFunction(String),
    #[error("wrong number of args for {name}: want {expected}, got {found}")]
    Arity {
        name: String,
        expected: Arity,
        found: usize,
    },
    #[error("wrong type of argument for {name}: {message}")]
    Argument { name: String, message: String },
    #[error("error calling {name}: {message}")]
    Failed { name: String, message: String },
    #[error("can't give argument to non-function {0}")]
    NotAFunction(String),
    #[error("can't evaluate field {field} in type {found}")]
    Field { field: String, found: &'static str },
}

/// Turns the text of an inline expression into a string value.
pub trait Evaluate {
    /// # Errors
    ///
    /// Returns an [`EvalError`] when the text does not evaluate.
    fn evaluate(&mut self, source: &str, data: &Context) -> Result<String, EvalError>;
}

/// Pipeline evaluator backed by the builtin function table.
#[derive(Debug, Clone)]
pub struct Engine {
    functions: Functions,
    rng: StdRng,
}

impl Engine {
    /// Engine with the standard builtins and a generator seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_functions(Functions::standard(), seed)
    }

    #[must_use]
    pub fn with_functions(functions: Functions, seed: u64) -> Self {
        Self {
            functions,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub const fn functions(&self) -> &Functions {
        &self.functions
    }

    /// Evaluate `source` to a typed value.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] on syntax errors or failing calls.
    pub fn eval(&mut self, source: &str, data: &Context) -> Result<Value, EvalError> {
        let pipeline = expr::parse(source)?;
        tracing::trace!(?pipeline, "parsed expression");
        self.pipeline(&pipeline, data)
    }

    fn pipeline(&mut self, pipeline: &Pipeline, data: &Context) -> Result<Value, EvalError> {
        let mut piped = None;
        for command in &pipeline.commands {
            piped = Some(self.command(command, data, piped.take())?);
        }
        Ok(piped.unwrap_or(Value::Nil))
    }

    fn command(
        &mut self,
        command: &Command,
        data: &Context,
        piped: Option<Value>,
    ) -> Result<Value, EvalError> {
        let Some((first, rest)) = command.operands.split_first() else {
            return Err(EvalError::Syntax("missing command".to_string()));
        };

        if let Operand::Function(name) = first {
            let mut args = rest
                .iter()
                .map(|operand| self.operand(operand, data))
                .collect::<Result<Vec<_>, _>>()?;
            args.extend(piped);
            return self.call(name, args);
        }

        if !rest.is_empty() || piped.is_some() {
            return Err(EvalError::NotAFunction(describe(first)));
        }
        self.operand(first, data)
    }

    fn operand(&mut self, operand: &Operand, data: &Context) -> Result<Value, EvalError> {
        match operand {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Field(path) => lookup(data, path),
            Operand::Function(name) => self.call(name, Vec::new()),
            Operand::Pipeline(pipeline) => self.pipeline(pipeline, data),
        }
    }

    fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        let builtin = self
            .functions
            .get(name)
            .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
        if !builtin.arity.accepts(args.len()) {
            return Err(EvalError::Arity {
                name: name.to_string(),
                expected: builtin.arity,
                found: args.len(),
            });
        }
        tracing::trace!(function = name, args = args.len(), "calling builtin");
        builtin.call(&mut Call::new(name, args, &mut self.rng))
    }
}

impl Evaluate for Engine {
    fn evaluate(&mut self, source: &str, data: &Context) -> Result<String, EvalError> {
        tracing::debug!(source, "evaluating expression");
        Ok(self.eval(source, data)?.to_string())
    }
}

/// A seed drawn from the OS generator, or the clock when that fails.
#[must_use]
pub fn seed_from_entropy() -> u64 {
    let mut bytes = [0_u8; 8];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => u64::from_le_bytes(bytes),
        Err(err) => {
            tracing::warn!(%err, "entropy source unavailable, seeding from the clock");
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs().rotate_left(32) ^ u64::from(d.subsec_nanos()))
        }
    }
}

fn lookup(data: &Context, path: &[String]) -> Result<Value, EvalError> {
    let Some((first, rest)) = path.split_first() else {
        return Ok(Value::Map(
            data.iter()
                .map(|(k, v)| (k.clone(), Value::from(v)))
                .collect(),
        ));
    };

    let Some(mut current) = data.get(first) else {
        return Ok(Value::Nil);
    };
    for (idx, segment) in rest.iter().enumerate() {
        current = match current {
            serde_json::Value::Object(map) => match map.get(segment) {
                Some(next) => next,
                None => return Ok(Value::Nil),
            },
            serde_json::Value::Null => return Ok(Value::Nil),
            other => {
                return Err(EvalError::Field {
                    field: path[..idx + 2].join("."),
                    found: Value::from(other).type_name(),
                });
            }
        };
    }
    Ok(Value::from(current))
}

fn describe(operand: &Operand) -> String {
    match operand {
        Operand::Literal(value) => format!("{value:?}"),
        Operand::Field(path) => format!(".{}", path.join(".")),
        Operand::Function(name) => name.clone(),
        Operand::Pipeline(_) => "(pipeline)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(value: serde_json::Value) -> Context {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("context must be an object"),
        }
    }

    fn eval(source: &str) -> Result<String, EvalError> {
        Engine::new(1).evaluate(source, &Context::new())
    }

    #[test]
    fn calls_with_arguments() {
        assert_eq!(eval(r#"b64enc "x""#), Ok("eA==".to_string()));
        assert_eq!(eval(r#"regexFind "[a-z]" "abc""#), Ok("a".to_string()));
    }

    #[test]
    fn piped_value_is_last_argument() {
        assert_eq!(eval(r#""hello-" | trimSuffix "-""#), Ok("hello".to_string()));
        assert_eq!(eval(r#""ab" | repeat 2 | upper"#), Ok("ABAB".to_string()));
    }

    #[test]
    fn nested_pipelines() {
        assert_eq!(eval(r#"upper (b64dec "eA==")"#), Ok("X".to_string()));
    }

    #[test]
    fn identifier_argument_is_a_call() {
        assert_eq!(eval("incr (decr 5)"), Ok("5".to_string()));
        assert_eq!(eval("len pathSep").unwrap_err(), EvalError::UnknownFunction("len".to_string()));
    }

    #[test]
    fn field_lookup() {
        let data = context(json!({"user": {"name": "Luca"}, "n": 3}));
        let mut engine = Engine::new(1);
        assert_eq!(engine.evaluate(".user.name | upper", &data), Ok("LUCA".to_string()));
        assert_eq!(engine.evaluate(".missing.deeper", &data), Ok(String::new()));
        assert_eq!(
            engine.evaluate(r#".nope | default "x""#, &data),
            Ok("x".to_string())
        );
        assert_eq!(engine.evaluate(".user", &data), Ok(r#"{"name":"Luca"}"#.to_string()));
        assert!(matches!(
            engine.evaluate(".n.value", &data),
            Err(EvalError::Field { .. })
        ));
    }

    #[test]
    fn errors() {
        assert_eq!(eval("nosuch"), Err(EvalError::UnknownFunction("nosuch".to_string())));
        assert!(matches!(eval("upper"), Err(EvalError::Arity { found: 0, .. })));
        assert!(matches!(eval(r#""a" "b""#), Err(EvalError::NotAFunction(_))));
        assert!(matches!(eval(r#""a" | "b""#), Err(EvalError::NotAFunction(_))));
        assert!(matches!(eval("upper (\"a\""), Err(EvalError::Syntax(_))));
    }

    #[test]
    fn same_seed_same_output() {
        let data = Context::new();
        let first = Engine::new(42).evaluate("rand 0 1000000", &data);
        let second = Engine::new(42).evaluate("rand 0 1000000", &data);
        assert_eq!(first, second);
    }

    #[test]
    fn literal_commands() {
        assert_eq!(eval("42"), Ok("42".to_string()));
        assert_eq!(eval("nil"), Ok(String::new()));
        assert_eq!(eval("`raw \\n`"), Ok("raw \\n".to_string()));
    }
}

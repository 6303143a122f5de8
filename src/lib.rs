//! Object notation: one-line expressions to YAML or JSON documents.
//!
//! An expression is a list of assignments to dotted paths. Repeated
//! paths merge, `{ }` and `[ ]` nest, and `( ... )` runs a builtin
//! function pipeline whose text output becomes a string value.
//!
//! # Quick start
//!
//! ## Parse and render
//!
//! ```
//! use yo_rs::{Format, parse_str, render};
//!
//! let documents = parse_str("kind=Secret data.user=(b64enc \"x\")").unwrap();
//! let values: Vec<_> = documents.iter().map(|doc| doc.materialize()).collect();
//! let yaml = render(&values, Format::Yaml).unwrap();
//! assert!(yaml.starts_with("data:\n  user: "));
//! assert!(yaml.ends_with("kind: Secret\n"));
//! ```
//!
//! ## Build a document programmatically
//!
//! ```
//! use yo_rs::{Format, Generator, Object, render};
//!
//! let doc = Generator::from(
//!     Object::new()
//!         .field("name", "web")
//!         .path("spec.replicas", 2)
//!         .field("ports", Generator::array([80, 443])),
//! );
//! let json = render(&[doc.materialize()], Format::Json).unwrap();
//! assert!(json.contains("\"replicas\": 2"));
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod builder;
pub mod context;
pub mod eval;
pub mod generator;
pub mod lexer;
pub mod literal;
pub mod parser;
pub mod render;
pub mod token;
pub mod value;

use std::fmt;

pub use context::{Context, ContextError, apply_set, assemble, load_files};
pub use eval::{Engine, EvalError, Evaluate, seed_from_entropy};
pub use generator::{Generator, Object};
pub use lexer::{Keywords, LexError, LexErrorKind, Lexer, tokenize};
pub use parser::{ParseError, ParseErrorKind, parse, parse_tokens};
pub use render::{Format, RenderError, render};
pub use token::{Span, Token, TokenKind};
pub use value::{Complex, Scalar, Value};

/// Unified error type covering both lexing and parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A lexer error.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// A parser error.
    #[error("{0}")]
    Parse(#[from] ParseError),
}

impl Error {
    /// Where in the input the error was detected.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Lex(err) => err.span,
            Self::Parse(err) => err.span,
        }
    }
}

/// A lexing or parsing error together with the input it refers to.
///
/// Displays the message, the input, and a caret under the offending
/// position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub error: Error,
    pub input: String,
}

impl SyntaxError {
    /// Byte offset of the error in [`SyntaxError::input`].
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.error.span().offset
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let offset = self.offset().min(self.input.len());
        let column = self
            .input
            .get(..offset)
            .map_or(offset, |head| head.chars().count());
        write!(f, "{}\n{}\n{:>width$}", self.error, self.input, "^", width = column + 1)
    }
}

impl std::error::Error for SyntaxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Parse with an empty data context and an entropy-seeded [`Engine`].
pub fn parse_str(input: &str) -> Result<Vec<Generator>, SyntaxError> {
    let mut engine = Engine::new(seed_from_entropy());
    parse_with(input, &Context::new(), &mut engine)
}

/// Parse with the given data context and evaluator.
pub fn parse_with<E: Evaluate + ?Sized>(
    input: &str,
    data: &Context,
    evaluator: &mut E,
) -> Result<Vec<Generator>, SyntaxError> {
    parse(input, data, evaluator).map_err(|error| SyntaxError {
        error,
        input: input.to_string(),
    })
}

/// Join trimmed lines with single spaces and parse the result.
pub fn parse_lines<I, S, E>(
    lines: I,
    data: &Context,
    evaluator: &mut E,
) -> Result<Vec<Generator>, SyntaxError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    E: Evaluate + ?Sized,
{
    let input = lines
        .into_iter()
        .map(|line| line.as_ref().trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    parse_with(&input, data, evaluator)
}

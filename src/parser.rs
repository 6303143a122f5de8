use std::fmt;
use std::mem;

use crate::Error;
use crate::context::Context;
use crate::eval::{EvalError, Evaluate};
use crate::generator::{Generator, Object};
use crate::lexer::Lexer;
use crate::literal;
use crate::token::{Span, Token, TokenKind};
use crate::value::Scalar;

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A token that cannot appear here.
    UnexpectedInput { found: String },
    /// Input ended where a path, `=` or value was required.
    UnexpectedEof,
    /// `[` without its `]`.
    UnclosedArray,
    /// `{` without its `}`.
    UnclosedObject,
    /// Literal text the token kind promised but could not deliver.
    InvalidLiteral {
        literal: String,
        expected: &'static str,
    },
    /// An inline expression failed.
    Evaluation(EvalError),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedInput { found } => write!(f, "unexpected input {found}"),
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::UnclosedArray => write!(f, "unclosed array, expected ']'"),
            Self::UnclosedObject => write!(f, "unclosed object, expected '}}'"),
            Self::InvalidLiteral { literal, expected } => {
                write!(f, "invalid literal {literal:?}, expected {expected}")
            }
            Self::Evaluation(err) => write!(f, "{err}"),
        }
    }
}

/// Error produced during parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, offset {}", span.line, span.offset)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

/// Parse an expression into its root generators.
///
/// Inline `( ... )` expressions are handed to `evaluator` along with
/// `data`, in source order, as they are reached.
///
/// # Errors
///
/// Returns the first lexical or syntax error, or the first failing
/// inline expression.
pub fn parse<E: Evaluate + ?Sized>(
    input: &str,
    data: &Context,
    evaluator: &mut E,
) -> Result<Vec<Generator>, Error> {
    parse_tokens(Lexer::new(input), data, evaluator)
}

/// Parse from a lexer built by the caller, e.g. with custom keywords.
///
/// # Errors
///
/// Same as [`parse`].
pub fn parse_tokens<E: Evaluate + ?Sized>(
    lexer: Lexer<'_>,
    data: &Context,
    evaluator: &mut E,
) -> Result<Vec<Generator>, Error> {
    tracing::debug!(input = lexer.input(), "parsing");
    Parser::new(lexer, data, evaluator)?.parse()
}

struct Parser<'a, 'e, E: ?Sized> {
    lexer: Lexer<'a>,
    next: Token,
    data: &'e Context,
    evaluator: &'e mut E,
}

impl<'a, 'e, E: Evaluate + ?Sized> Parser<'a, 'e, E> {
    fn new(mut lexer: Lexer<'a>, data: &'e Context, evaluator: &'e mut E) -> Result<Self, Error> {
        let next = lexer.next_token()?;
        Ok(Self {
            lexer,
            next,
            data,
            evaluator,
        })
    }

    fn parse(mut self) -> Result<Vec<Generator>, Error> {
        let documents = if matches!(
            self.next.kind,
            TokenKind::LeftBrace | TokenKind::LeftBracket
        ) {
            self.parse_blocks()?
        } else {
            vec![Generator::Object(self.parse_assignments()?)]
        };

        if self.next.kind != TokenKind::Eof {
            return Err(self.unexpected());
        }
        Ok(documents)
    }

    /// Top level `{ ... } [ ... ]`: one document per block.
    fn parse_blocks(&mut self) -> Result<Vec<Generator>, Error> {
        let mut documents = Vec::new();
        loop {
            match self.next.kind {
                TokenKind::LeftBrace => {
                    self.advance()?;
                    documents.push(self.parse_object()?);
                }
                TokenKind::LeftBracket => {
                    self.advance()?;
                    documents.push(self.parse_array()?);
                }
                _ => return Ok(documents),
            }
        }
    }

    fn parse_assignments(&mut self) -> Result<Object, Error> {
        let mut object = Object::new();
        while self.next.kind.is_segment() {
            let segment = self.advance()?;
            self.parse_assignment(&mut object, segment)?;
        }
        Ok(object)
    }

    /// The rest of `path = value` once its first segment is consumed.
    fn parse_assignment(&mut self, object: &mut Object, segment: Token) -> Result<(), Error> {
        let value = self.parse_field()?;
        object.add(segment.text, value);
        Ok(())
    }

    /// After `{`.
    fn parse_object(&mut self) -> Result<Generator, Error> {
        let object = self.parse_assignments()?;
        match self.next.kind {
            TokenKind::RightBrace => {
                self.advance()?;
                Ok(Generator::Object(object))
            }
            TokenKind::Eof => Err(error(ParseErrorKind::UnclosedObject, self.next.span)),
            _ => Err(self.unexpected()),
        }
    }

    /// After `[`.
    fn parse_array(&mut self) -> Result<Generator, Error> {
        let mut items = Vec::new();
        loop {
            let item = match self.next.kind {
                TokenKind::RightBracket => {
                    self.advance()?;
                    return Ok(Generator::Array(items));
                }
                TokenKind::Eof => {
                    return Err(error(ParseErrorKind::UnclosedArray, self.next.span));
                }
                TokenKind::Identifier | TokenKind::String => {
                    let word = self.advance()?;
                    if matches!(self.next.kind, TokenKind::Assign | TokenKind::Dot) {
                        let mut object = Object::new();
                        self.parse_assignment(&mut object, word)?;
                        Generator::Object(object)
                    } else {
                        Generator::Scalar(Scalar::String(word.text))
                    }
                }
                _ => self.parse_value()?,
            };
            items.push(item);
        }
    }

    /// What follows a path segment: `= value` or `. segment ...`.
    fn parse_field(&mut self) -> Result<Generator, Error> {
        match self.next.kind {
            TokenKind::Assign => {
                self.advance()?;
                self.parse_value()
            }
            TokenKind::Dot => {
                self.advance()?;
                if !self.next.kind.is_segment() {
                    return Err(self.unexpected());
                }
                let segment = self.advance()?;
                let value = self.parse_field()?;
                Ok(Generator::Object(Object::single(segment.text, value)))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_value(&mut self) -> Result<Generator, Error> {
        match self.next.kind {
            TokenKind::LeftBrace => {
                self.advance()?;
                self.parse_object()
            }
            TokenKind::LeftBracket => {
                self.advance()?;
                self.parse_array()
            }
            TokenKind::Expression => {
                let token = self.advance()?;
                self.evaluate(&token)
            }
            TokenKind::String
            | TokenKind::Null
            | TokenKind::Bool
            | TokenKind::Number
            | TokenKind::Complex => {
                let token = self.advance()?;
                Ok(Generator::Scalar(scalar(token)?))
            }
            _ => Err(self.unexpected()),
        }
    }

    fn evaluate(&mut self, token: &Token) -> Result<Generator, Error> {
        match self.evaluator.evaluate(&token.text, self.data) {
            Ok(text) => Ok(Generator::Scalar(Scalar::String(text))),
            Err(err) => Err(error(ParseErrorKind::Evaluation(err), token.span)),
        }
    }

    /// Consume the lookahead and return it.
    fn advance(&mut self) -> Result<Token, Error> {
        let next = self.lexer.next_token()?;
        Ok(mem::replace(&mut self.next, next))
    }

    /// Error for the lookahead token.
    fn unexpected(&self) -> Error {
        let kind = if self.next.kind == TokenKind::Eof {
            ParseErrorKind::UnexpectedEof
        } else {
            ParseErrorKind::UnexpectedInput {
                found: self.next.to_string(),
            }
        };
        error(kind, self.next.span)
    }
}

fn scalar(token: Token) -> Result<Scalar, Error> {
    let invalid = |token: &Token, expected: &'static str| {
        error(
            ParseErrorKind::InvalidLiteral {
                literal: token.text.clone(),
                expected,
            },
            token.span,
        )
    };
    match token.kind {
        TokenKind::Null => Ok(Scalar::Null),
        TokenKind::Bool => literal::parse_bool(&token.text)
            .map(Scalar::Bool)
            .ok_or_else(|| invalid(&token, "a boolean")),
        TokenKind::Number => {
            literal::parse_number(&token.text).ok_or_else(|| invalid(&token, "a number"))
        }
        TokenKind::Complex => literal::parse_complex(&token.text)
            .map(Scalar::Complex)
            .ok_or_else(|| invalid(&token, "a complex number")),
        TokenKind::String => Ok(Scalar::String(token.text)),
        _ => Err(invalid(&token, "a scalar")),
    }
}

const fn error(kind: ParseErrorKind, span: Span) -> Error {
    Error::Parse(ParseError { kind, span })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Engine;
    use crate::value::Value;
    use serde_json::json;

    fn parse_input(input: &str) -> Result<Vec<Generator>, Error> {
        parse(input, &Context::new(), &mut Engine::new(0))
    }

    fn json_of(input: &str) -> serde_json::Value {
        let documents = parse_input(input).expect("parse");
        assert_eq!(documents.len(), 1);
        serde_json::to_value(documents[0].materialize()).expect("to json")
    }

    fn parse_kind(input: &str) -> ParseErrorKind {
        match parse_input(input) {
            Err(Error::Parse(err)) => err.kind,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn flat_assignments() {
        assert_eq!(
            json_of("name=Luca age=30 ok=true none=null"),
            json!({"name": "Luca", "age": 30, "ok": true, "none": null})
        );
    }

    #[test]
    fn dotted_paths() {
        assert_eq!(json_of("a.b.c=1"), json!({"a": {"b": {"c": 1}}}));
        assert_eq!(json_of(r#"a."b.b".c=d"#), json!({"a": {"b.b": {"c": "d"}}}));
    }

    #[test]
    fn nested_values() {
        assert_eq!(
            json_of("spec={replicas=2 ports=[80 443]}"),
            json!({"spec": {"replicas": 2, "ports": [80, 443]}})
        );
    }

    #[test]
    fn array_items() {
        assert_eq!(
            json_of(r#"items=[a "b c" name=x 1.5 [true] {k=v}]"#),
            json!({"items": ["a", "b c", {"name": "x"}, 1.5, [true], {"k": "v"}]})
        );
    }

    #[test]
    fn complex_literal() {
        let documents = parse_input("z=1+2i").expect("parse");
        let value = documents[0].materialize();
        assert!(matches!(value.get("z"), Some(Value::Complex(_))));
    }

    #[test]
    fn top_level_blocks() {
        let documents = parse_input("{a=1} [2 3] {}").expect("parse");
        assert_eq!(documents.len(), 3);
        assert_eq!(
            serde_json::to_value(documents[1].materialize()).expect("json"),
            json!([2, 3])
        );
    }

    #[test]
    fn expressions_are_evaluated() {
        assert_eq!(json_of(r#"user=(b64enc "x")"#), json!({"user": "eA=="}));
    }

    #[test]
    fn errors() {
        assert_eq!(parse_kind("a"), ParseErrorKind::UnexpectedEof);
        assert_eq!(parse_kind("a="), ParseErrorKind::UnexpectedEof);
        assert_eq!(parse_kind("a={b=1"), ParseErrorKind::UnclosedObject);
        assert_eq!(parse_kind("a=[1"), ParseErrorKind::UnclosedArray);
        assert!(matches!(parse_kind("a b=1"), ParseErrorKind::UnexpectedInput { .. }));
        assert!(matches!(parse_kind("{a=1} b=2"), ParseErrorKind::UnexpectedInput { .. }));
        assert!(matches!(parse_kind("a=(nosuch)"), ParseErrorKind::Evaluation(_)));
    }

    #[test]
    fn error_offsets() {
        match parse_input("name=foo ]") {
            Err(Error::Parse(err)) => assert_eq!(err.span.offset, 9),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn lex_errors_pass_through() {
        assert!(matches!(parse_input(r#"a="open"#), Err(Error::Lex(_))));
    }
}

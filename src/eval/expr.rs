//! Pipeline syntax used inside parenthesized expressions.
//!
//! ```text
//! pipeline := command ('|' command)*
//! command  := operand+
//! operand  := "quoted" | `raw` | number | true | false | nil
//!           | .field.path | . | identifier | '(' pipeline ')'
//! ```

use super::EvalError;
use super::value::Value;
use crate::literal;
use crate::value::Scalar;

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    /// `.a.b` lookup into the context data. Empty for `.`.
    Field(Vec<String>),
    Function(String),
    Pipeline(Pipeline),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub operands: Vec<Operand>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
}

/// Parse the source of one expression.
///
/// # Errors
///
/// Returns [`EvalError::Syntax`] when the source is not a pipeline.
pub fn parse(source: &str) -> Result<Pipeline, EvalError> {
    let mut reader = Reader {
        input: source,
        pos: 0,
    };
    let pipeline = reader.pipeline()?;
    reader.skip_spaces();
    match reader.peek() {
        None => Ok(pipeline),
        Some(c) => Err(reader.error(format!("unexpected {c:?}"))),
    }
}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
}

impl Reader<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.input[self.pos..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_spaces(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn error(&self, message: impl Into<String>) -> EvalError {
        EvalError::Syntax(format!("{} at offset {}", message.into(), self.pos))
    }

    fn pipeline(&mut self) -> Result<Pipeline, EvalError> {
        let mut commands = vec![self.command()?];
        loop {
            self.skip_spaces();
            if !self.eat('|') {
                return Ok(Pipeline { commands });
            }
            commands.push(self.command()?);
        }
    }

    fn command(&mut self) -> Result<Command, EvalError> {
        let mut operands = Vec::new();
        loop {
            self.skip_spaces();
            match self.peek() {
                None | Some('|' | ')') => break,
                Some(_) => operands.push(self.operand()?),
            }
        }
        if operands.is_empty() {
            return Err(self.error("missing command"));
        }
        Ok(Command { operands })
    }

    fn operand(&mut self) -> Result<Operand, EvalError> {
        let Some(c) = self.peek() else {
            return Err(self.error("unexpected end of expression"));
        };
        match c {
            '(' => {
                self.bump();
                let inner = self.pipeline()?;
                self.skip_spaces();
                if !self.eat(')') {
                    return Err(self.error("unclosed left paren"));
                }
                Ok(Operand::Pipeline(inner))
            }
            '"' => {
                self.bump();
                self.quoted().map(|s| Operand::Literal(Value::Str(s)))
            }
            '`' => {
                self.bump();
                let raw = self.take_while(|c| c != '`').to_string();
                if !self.eat('`') {
                    return Err(self.error("unterminated raw quoted string"));
                }
                Ok(Operand::Literal(Value::Str(raw)))
            }
            '.' if !self.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                self.field()
            }
            '.' | '+' | '-' | '0'..='9' => self.number(),
            c if c.is_alphabetic() || c == '_' => {
                let word = self.take_while(is_identifier_char);
                Ok(match word {
                    "true" => Operand::Literal(Value::Bool(true)),
                    "false" => Operand::Literal(Value::Bool(false)),
                    "nil" => Operand::Literal(Value::Nil),
                    name => Operand::Function(name.to_string()),
                })
            }
            c => Err(self.error(format!("unexpected {c:?}"))),
        }
    }

    /// After the opening quote.
    fn quoted(&mut self) -> Result<String, EvalError> {
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated quoted string")),
                Some('"') => return Ok(text),
                Some('\\') => match self.bump() {
                    Some('"') => text.push('"'),
                    Some('\\') => text.push('\\'),
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some(c) => return Err(self.error(format!("invalid escape \\{c}"))),
                    None => return Err(self.error("unterminated quoted string")),
                },
                Some(c) => text.push(c),
            }
        }
    }

    fn field(&mut self) -> Result<Operand, EvalError> {
        let mut path = Vec::new();
        while self.eat('.') {
            let segment = self.take_while(is_identifier_char);
            if segment.is_empty() {
                if path.is_empty() {
                    break;
                }
                return Err(self.error("empty field name"));
            }
            path.push(segment.to_string());
        }
        Ok(Operand::Field(path))
    }

    fn number(&mut self) -> Result<Operand, EvalError> {
        let start = self.pos;
        let mut prev = '\0';
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-') && matches!(prev, 'e' | 'E' | 'p' | 'P');
            let leading_sign = (c == '+' || c == '-') && self.pos == start;
            if !(c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign || leading_sign)
            {
                break;
            }
            prev = c;
            self.bump();
        }
        let text = &self.input[start..self.pos];
        match literal::parse_number(text) {
            Some(Scalar::Int(n)) => Ok(Operand::Literal(Value::Int(n))),
            Some(Scalar::Float(x)) => Ok(Operand::Literal(Value::Float(x))),
            _ => Err(self.error(format!("bad number syntax: {text:?}"))),
        }
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

use std::collections::HashMap;
use std::fmt;

use crate::token::{Span, Token, TokenKind};

const DECIMAL_DIGITS: &str = "0123456789_";
const HEX_DIGITS: &str = "0123456789abcdefABCDEF_";
const OCTAL_DIGITS: &str = "01234567_";
const BINARY_DIGITS: &str = "01_";

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Quoted string not closed before a newline or end of input.
    UnterminatedString,
    /// Expression whose `(` has no matching `)`.
    UnbalancedParentheses,
    /// Malformed numeric literal.
    BadNumber(String),
    /// Identifier followed by a character that cannot end it.
    BadCharacter(char),
    /// Character that cannot start any token.
    UnrecognizedCharacter(char),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => write!(f, "unterminated quoted string"),
            Self::UnbalancedParentheses => {
                write!(f, "unbalanced parentheses in expression")
            }
            Self::BadNumber(text) => write!(f, "bad number syntax: {text:?}"),
            Self::BadCharacter(ch) => write!(f, "bad character {ch:?}"),
            Self::UnrecognizedCharacter(ch) => {
                write!(f, "unrecognized character: {ch:?}")
            }
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, offset {}", span.line, span.offset)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

/// Words that lex to a dedicated token kind instead of an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keywords {
    table: HashMap<&'static str, TokenKind>,
}

impl Keywords {
    /// The standard table: `true`, `false`, `null`, `nil` and `.`.
    #[must_use]
    pub fn standard() -> Self {
        let table = HashMap::from([
            (".", TokenKind::Dot),
            ("true", TokenKind::Bool),
            ("false", TokenKind::Bool),
            ("null", TokenKind::Null),
            ("nil", TokenKind::Null),
        ]);
        Self { table }
    }

    /// Kind for `word`, if it is a keyword.
    #[must_use]
    pub fn get(&self, word: &str) -> Option<TokenKind> {
        self.table.get(word).copied()
    }
}

impl Default for Keywords {
    fn default() -> Self {
        Self::standard()
    }
}

/// Tokenize a whole expression, stopping before end of input.
///
/// # Errors
///
/// Returns `LexError` on the first malformed token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        if token.kind == TokenKind::Eof {
            return Ok(tokens);
        }
        tokens.push(token);
    }
}

/// Pull-based scanner producing one token per call.
///
/// Once end of input or an error has been returned, every later call
/// returns the same result.
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    start: usize,
    line: usize,
    start_line: usize,
    last_seen: Option<TokenKind>,
    keywords: Keywords,
    terminal: Option<Result<Token, LexError>>,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self::with_keywords(input, Keywords::standard())
    }

    #[must_use]
    pub const fn with_keywords(input: &'a str, keywords: Keywords) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
            line: 1,
            start_line: 1,
            last_seen: None,
            keywords,
            terminal: None,
        }
    }

    /// The text being scanned.
    #[must_use]
    pub const fn input(&self) -> &'a str {
        self.input
    }

    /// Scan the next token.
    ///
    /// # Errors
    ///
    /// Returns `LexError` for unterminated strings, unbalanced
    /// expressions, malformed numbers and stray characters.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        if let Some(terminal) = &self.terminal {
            return terminal.clone();
        }

        let result = self.scan();
        if !matches!(&result, Ok(token) if token.kind != TokenKind::Eof) {
            self.terminal = Some(result.clone());
        }
        result
    }

    fn scan(&mut self) -> Result<Token, LexError> {
        self.skip_spaces();

        let Some(ch) = self.bump() else {
            return Ok(self.emit(TokenKind::Eof));
        };

        match ch {
            '{' => Ok(self.emit(TokenKind::LeftBrace)),
            '}' => Ok(self.emit(TokenKind::RightBrace)),
            '[' => Ok(self.emit(TokenKind::LeftBracket)),
            ']' => Ok(self.emit(TokenKind::RightBracket)),
            '=' => Ok(self.emit(TokenKind::Assign)),
            '"' => self.lex_quoted_string(),
            '(' => self.lex_expression(),
            '.' if !self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                Ok(self.emit(TokenKind::Dot))
            }
            // '.' can start a number
            '.' | '+' | '-' | '0'..='9' => {
                self.pos = self.start;
                self.lex_number()
            }
            c if is_alphanumeric(c) => self.lex_identifier(),
            c => Err(self.error(LexErrorKind::UnrecognizedCharacter(c))),
        }
    }

    fn lex_identifier(&mut self) -> Result<Token, LexError> {
        while self.peek().is_some_and(is_alphanumeric) {
            self.bump();
        }

        if let Some(ch) = self.peek().filter(|&c| !is_terminator(c)) {
            return Err(self.error(LexErrorKind::BadCharacter(ch)));
        }

        let word = &self.input[self.start..self.pos];
        let kind = match self.keywords.get(word) {
            Some(keyword) => keyword,
            // bare value shorthand: `type=Opaque`
            None if self.last_seen == Some(TokenKind::Assign) => TokenKind::String,
            None => TokenKind::Identifier,
        };
        Ok(self.emit(kind))
    }

    fn lex_quoted_string(&mut self) -> Result<Token, LexError> {
        loop {
            match self.bump() {
                Some('\\') => {
                    if matches!(self.bump(), None | Some('\n')) {
                        return Err(self.error(LexErrorKind::UnterminatedString));
                    }
                }
                None | Some('\n') => {
                    return Err(self.error(LexErrorKind::UnterminatedString));
                }
                Some('"') => break,
                Some(_) => {}
            }
        }

        let text = self.input[self.start + 1..self.pos - 1].to_string();
        Ok(self.emit_text(TokenKind::String, text))
    }

    fn lex_expression(&mut self) -> Result<Token, LexError> {
        let mut depth = 1usize;
        loop {
            match self.bump() {
                None => return Err(self.error(LexErrorKind::UnbalancedParentheses)),
                Some(quote @ ('"' | '`')) => self.skip_embedded_string(quote)?,
                Some('(') => depth += 1,
                Some(')') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Some(_) => {}
            }
        }

        let text = self.input[self.start + 1..self.pos - 1].to_string();
        Ok(self.emit_text(TokenKind::Expression, text))
    }

    /// Skip a string nested in an expression so its parentheses are
    /// not counted. Backticks delimit raw strings without escapes.
    fn skip_embedded_string(&mut self, quote: char) -> Result<(), LexError> {
        loop {
            match self.bump() {
                None => return Err(self.error(LexErrorKind::UnterminatedString)),
                Some('\\') if quote == '"' => {
                    if self.bump().is_none() {
                        return Err(self.error(LexErrorKind::UnterminatedString));
                    }
                }
                Some(c) if c == quote => return Ok(()),
                Some(_) => {}
            }
        }
    }

    fn lex_number(&mut self) -> Result<Token, LexError> {
        if !self.scan_number() {
            return Err(self.bad_number());
        }

        let mut kind = if self.input[self.start..self.pos].ends_with('i') {
            TokenKind::Complex
        } else {
            TokenKind::Number
        };

        // Complex: 1+2i. No spaces, must end in 'i'.
        if matches!(self.peek(), Some('+' | '-')) {
            if !self.scan_number() || !self.input[..self.pos].ends_with('i') {
                return Err(self.bad_number());
            }
            kind = TokenKind::Complex;
        }

        Ok(self.emit(kind))
    }

    fn scan_number(&mut self) -> bool {
        let begin = self.pos;
        self.accept("+-");

        let mut digits = DECIMAL_DIGITS;
        // a leading 0 does not mean octal
        if self.accept("0") {
            if self.accept("xX") {
                digits = HEX_DIGITS;
            } else if self.accept("oO") {
                digits = OCTAL_DIGITS;
            } else if self.accept("bB") {
                digits = BINARY_DIGITS;
            }
        }

        self.accept_run(digits);
        if self.accept(".") {
            self.accept_run(digits);
        }
        if digits == DECIMAL_DIGITS && self.accept("eE") {
            self.accept("+-");
            self.accept_run(DECIMAL_DIGITS);
        }
        if digits == HEX_DIGITS && self.accept("pP") {
            self.accept("+-");
            self.accept_run(DECIMAL_DIGITS);
        }

        // imaginary
        self.accept("i");

        if let Some(c) = self.peek().filter(|&c| c.is_alphanumeric() || c == '_') {
            self.pos += c.len_utf8();
            return false;
        }

        self.input[begin..self.pos].chars().any(|c| c.is_ascii_digit())
    }

    fn bad_number(&self) -> LexError {
        let text = self.input[self.start..self.pos].to_string();
        self.error(LexErrorKind::BadNumber(text))
    }

    fn skip_spaces(&mut self) {
        while self.peek().is_some_and(is_space) {
            self.bump();
        }
        self.start = self.pos;
        self.start_line = self.line;
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn accept(&mut self, valid: &str) -> bool {
        if self.peek().is_some_and(|c| valid.contains(c)) {
            self.bump();
            return true;
        }
        false
    }

    fn accept_run(&mut self, valid: &str) {
        while self.accept(valid) {}
    }

    fn emit(&mut self, kind: TokenKind) -> Token {
        let text = self.input[self.start..self.pos].to_string();
        self.emit_text(kind, text)
    }

    fn emit_text(&mut self, kind: TokenKind, text: String) -> Token {
        let token = Token {
            kind,
            text,
            span: self.span(),
        };
        self.start = self.pos;
        self.start_line = self.line;
        self.last_seen = Some(kind);
        token
    }

    const fn span(&self) -> Span {
        Span {
            offset: self.start,
            line: self.start_line,
        }
    }

    const fn error(&self, kind: LexErrorKind) -> LexError {
        LexError {
            kind,
            span: self.span(),
        }
    }
}

const fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_alphanumeric(c: char) -> bool {
    c == '_' || c == '-' || c.is_alphanumeric()
}

/// Characters allowed right after an identifier.
const fn is_terminator(c: char) -> bool {
    is_space(c) || matches!(c, '=' | '.' | '[' | ']' | '{' | '}')
}

use std::fmt;

/// Source location for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset of the first character.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// End of input.
    Eof,
    /// Field name (`name`, `api-version`).
    Identifier,
    /// `=`
    Assign,
    /// `.`
    Dot,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// Quoted string, or a bare word right after `=`.
    String,
    /// Integer or float literal.
    Number,
    /// Complex literal (`1+2i`).
    Complex,
    /// `true` or `false`.
    Bool,
    /// `null` or `nil`.
    Null,
    /// Parenthesized function call, text without the parentheses.
    Expression,
}

impl TokenKind {
    /// Whether this kind can name a path segment.
    #[must_use]
    pub const fn is_segment(self) -> bool {
        matches!(self, Self::Identifier | Self::String)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Eof => "end of input",
            Self::Identifier => "identifier",
            Self::Assign => "'='",
            Self::Dot => "'.'",
            Self::LeftBrace => "'{'",
            Self::RightBrace => "'}'",
            Self::LeftBracket => "'['",
            Self::RightBracket => "']'",
            Self::String => "string",
            Self::Number => "number",
            Self::Complex => "complex number",
            Self::Bool => "boolean",
            Self::Null => "null",
            Self::Expression => "expression",
        };
        f.write_str(name)
    }
}

/// A single token with its kind, text, and source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "EOF"),
            TokenKind::Bool | TokenKind::Null => write!(f, "<{}>", self.text),
            _ if self.text.chars().count() > 10 => {
                let head: String = self.text.chars().take(10).collect();
                write!(f, "{head:?}...")
            }
            _ => write!(f, "{:?}", self.text),
        }
    }
}

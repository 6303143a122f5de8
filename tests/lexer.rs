use yo_rs::{Keywords, LexErrorKind, Lexer, TokenKind, tokenize};

fn single(input: &str) -> (TokenKind, String) {
    let tokens = tokenize(input).expect("should tokenize");
    assert_eq!(tokens.len(), 1, "expected one token for {input:?}, got {tokens:?}");
    (tokens[0].kind, tokens[0].text.clone())
}

fn lex_error(input: &str) -> LexErrorKind {
    tokenize(input).expect_err("should fail").kind
}

#[test]
fn every_literal_class_is_one_token() {
    let cases = [
        ("name", TokenKind::Identifier, "name"),
        ("api-version", TokenKind::Identifier, "api-version"),
        (r#""hello world""#, TokenKind::String, "hello world"),
        ("42", TokenKind::Number, "42"),
        ("-7", TokenKind::Number, "-7"),
        ("8.171", TokenKind::Number, "8.171"),
        (".5", TokenKind::Number, ".5"),
        ("1e3", TokenKind::Number, "1e3"),
        ("0x1F", TokenKind::Number, "0x1F"),
        ("0o17", TokenKind::Number, "0o17"),
        ("0b101", TokenKind::Number, "0b101"),
        ("1_000", TokenKind::Number, "1_000"),
        ("1+2i", TokenKind::Complex, "1+2i"),
        ("2i", TokenKind::Complex, "2i"),
        ("true", TokenKind::Bool, "true"),
        ("false", TokenKind::Bool, "false"),
        ("null", TokenKind::Null, "null"),
        ("nil", TokenKind::Null, "nil"),
        (r#"(upper "x")"#, TokenKind::Expression, r#"upper "x""#),
    ];
    for (input, kind, text) in cases {
        assert_eq!(single(input), (kind, text.to_string()), "input {input:?}");
    }
}

#[test]
fn bare_value_after_assign_is_a_string() {
    let tokens = tokenize("a=API_VALUE").expect("should tokenize");
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![TokenKind::Identifier, TokenKind::Assign, TokenKind::String]
    );
    assert_eq!(tokens[2].text, "API_VALUE");
}

#[test]
fn structure_tokens() {
    let kinds: Vec<_> = tokenize(r#"a.b={c=[1 "x"]}"#)
        .expect("should tokenize")
        .iter()
        .map(|t| t.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier,
            TokenKind::Dot,
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::LeftBrace,
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::LeftBracket,
            TokenKind::Number,
            TokenKind::String,
            TokenKind::RightBracket,
            TokenKind::RightBrace,
        ]
    );
}

#[test]
fn spans_are_byte_offsets() {
    let tokens = tokenize("ab = \"c\"").expect("should tokenize");
    let offsets: Vec<_> = tokens.iter().map(|t| t.span.offset).collect();
    assert_eq!(offsets, vec![0, 3, 5]);
}

#[test]
fn unterminated_string() {
    assert_eq!(lex_error(r#"a="x"#), LexErrorKind::UnterminatedString);
    let err = tokenize(r#"a="x"#).expect_err("should fail");
    assert!(err.to_string().contains("unterminated quoted string"));
}

#[test]
fn unbalanced_expression() {
    assert_eq!(lex_error("a=(upper \"x\""), LexErrorKind::UnbalancedParentheses);
}

#[test]
fn malformed_numbers() {
    assert!(matches!(lex_error("a=12abc"), LexErrorKind::BadNumber(_)));
    assert!(matches!(lex_error("a=1+2"), LexErrorKind::BadNumber(_)));
}

#[test]
fn stray_characters() {
    assert_eq!(lex_error("a=1 ;"), LexErrorKind::UnrecognizedCharacter(';'));
    assert_eq!(lex_error("ab;c=1"), LexErrorKind::BadCharacter(';'));
}

#[test]
fn eof_repeats() {
    let mut lexer = Lexer::new("a");
    assert_eq!(lexer.next_token().expect("token").kind, TokenKind::Identifier);
    for _ in 0..3 {
        assert_eq!(lexer.next_token().expect("token").kind, TokenKind::Eof);
    }
}

#[test]
fn standard_keywords() {
    let keywords = Keywords::standard();
    assert_eq!(keywords.get("nil"), Some(TokenKind::Null));
    assert_eq!(keywords.get("yes"), None);
}

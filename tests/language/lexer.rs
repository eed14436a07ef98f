//! Integration tests for the lexer and preprocessor
//!
//! Tests tokenization of source lines and line preprocessing.

use forkpack_foundation::ErrorKind;
use forkpack_language::{Lexer, TokenKind, preprocess};

// =============================================================================
// Fine Tokenizer
// =============================================================================

#[test]
fn words_keep_one_trailing_space() {
    let tokens = Lexer::tokenize_line("say  hi");
    let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["say ", " ", "hi"]);
    assert!(tokens.iter().all(|t| t.kind == TokenKind::Word));
}

#[test]
fn punctuation_is_split_out() {
    let tokens = Lexer::tokenize_line("a+=b");
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Word,
            TokenKind::Punct('+'),
            TokenKind::Punct('='),
            TokenKind::Word
        ]
    );
}

#[test]
fn only_the_opening_quote_closes() {
    let tokens = Lexer::tokenize_line("say \"it's\"");
    assert_eq!(tokens[1].kind, TokenKind::Quote('"'));
    assert_eq!(tokens[2].kind, TokenKind::Quoted);
    assert_eq!(tokens[2].text, "it's");
    assert_eq!(tokens[3].kind, TokenKind::Quote('"'));
}

#[test]
fn unterminated_quote_runs_to_the_end() {
    let tokens = Lexer::tokenize_line("say 'open");
    let last = tokens.last().unwrap();
    assert_eq!(last.kind, TokenKind::Quoted);
    assert_eq!(last.text, "open");
}

#[test]
fn tokens_reproduce_the_line() {
    let line = r#"summon zombie ~ ~1 ~ {CustomName:'{"text":"Bob"}'}"#;
    assert_eq!(Lexer::join(&Lexer::tokenize_line(line)), line);
}

#[test]
fn words_rejoin_digit_fragments() {
    let words = Lexer::words("x12 y#1p");
    let texts: Vec<&str> = words.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["x12 ", "y#1p"]);
}

// =============================================================================
// Broad Tokenizer
// =============================================================================

#[test]
fn arguments_respect_brackets_and_quotes() {
    let args = Lexer::arguments(r#"tellraw @a {"text":"a b"} "c d"  e"#);
    assert_eq!(args, vec!["tellraw", "@a", r#"{"text":"a b"}"#, "\"c d\"", "e"]);
}

#[test]
fn arguments_survive_unbalanced_brackets() {
    assert_eq!(Lexer::arguments("] a"), vec!["]", "a"]);
    assert_eq!(Lexer::arguments("[a b"), vec!["[a b"]);
}

// =============================================================================
// Preprocessing
// =============================================================================

#[test]
fn preprocess_measures_depth_and_numbers_lines() {
    let lines = preprocess("if entity @p:\n  say a\n\n  # note\n  say b # trailing\nsay c", 4, 0).unwrap();
    let summary: Vec<(usize, &str, usize)> = lines
        .iter()
        .map(|l| (l.depth, l.text.as_str(), l.line))
        .collect();
    assert_eq!(
        summary,
        vec![
            (0, "if entity @p:", 1),
            (1, "say a", 2),
            (1, "say b", 5),
            (0, "say c", 6),
        ]
    );
}

#[test]
fn preprocess_keeps_hash_inside_words() {
    let lines = preprocess("x = #i\ntellraw @a x#t", 4, 0).unwrap();
    assert_eq!(lines[0].text, "x = #i");
    assert_eq!(lines[1].text, "tellraw @a x#t");
}

#[test]
fn preprocess_rejects_stray_spaces() {
    let err = preprocess("if x:\n    a\n      b", 4, 0).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownIndentation);
    assert_eq!(err.line(), Some(3));
    assert!(err.to_string().starts_with("Error at line 3"));
}

//! Lexer for source lines.
//!
//! The fine tokenizer ([`Lexer::tokenize`]) splits one line into words,
//! quotes, quoted text and punctuation. The broad tokenizer
//! ([`Lexer::arguments`]) regroups those tokens into whitespace-delimited
//! arguments that respect brackets and quotes, so `{a b c}` and `"a b"`
//! each stay one argument.

use crate::token::{Token, TokenKind};

/// Characters that are always emitted as their own token.
pub const PUNCTUATION: &str = "=,{}[]():+-*<>%\\/";

/// Characters that open and close quoted text.
pub const QUOTES: &str = "\"'";

/// Lexer for one source line.
pub struct Lexer<'src> {
    /// Remaining characters of the line.
    rest: std::str::Chars<'src>,
    /// Characters of the token being built.
    buffer: String,
    /// The quote character that opened the current quoted run, if any.
    quote: Option<char>,
    /// Tokens produced so far.
    tokens: Vec<Token>,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given line.
    #[must_use]
    pub fn new(line: &'src str) -> Self {
        Self {
            rest: line.chars(),
            buffer: String::new(),
            quote: None,
            tokens: Vec::new(),
        }
    }

    /// Consumes the lexer and returns every token of the line.
    #[must_use]
    pub fn tokenize(mut self) -> Vec<Token> {
        while let Some(c) = self.rest.next() {
            if let Some(open) = self.quote {
                if c == open {
                    self.flush(TokenKind::Quoted);
                    self.tokens.push(Token::new(TokenKind::Quote(c), c.to_string()));
                    self.quote = None;
                } else {
                    self.buffer.push(c);
                }
            } else if QUOTES.contains(c) {
                self.flush(TokenKind::Word);
                self.tokens.push(Token::new(TokenKind::Quote(c), c.to_string()));
                self.quote = Some(c);
            } else if PUNCTUATION.contains(c) {
                self.flush(TokenKind::Word);
                self.tokens.push(Token::new(TokenKind::Punct(c), c.to_string()));
            } else if c == ' ' || c.is_ascii_digit() {
                self.buffer.push(c);
                self.flush(TokenKind::Word);
            } else {
                self.buffer.push(c);
            }
        }

        let kind = if self.quote.is_some() {
            TokenKind::Quoted
        } else {
            TokenKind::Word
        };
        self.flush(kind);
        self.tokens
    }

    /// Emits the buffered characters as one token, if there are any.
    fn flush(&mut self, kind: TokenKind) {
        if !self.buffer.is_empty() {
            let text = std::mem::take(&mut self.buffer);
            self.tokens.push(Token::new(kind, text));
        }
    }

    /// Tokenizes a line with the fine tokenizer.
    #[must_use]
    pub fn tokenize_line(line: &str) -> Vec<Token> {
        Lexer::new(line).tokenize()
    }

    /// Tokenizes a line, then folds adjacent word fragments back together.
    ///
    /// Digits flush the fine tokenizer's buffer, so `x#1p` arrives as `x#1`
    /// and `p`. Expression substitution works on whole words instead.
    #[must_use]
    pub fn words(line: &str) -> Vec<Token> {
        let mut words: Vec<Token> = Vec::new();
        for token in Self::tokenize_line(line) {
            match words.last_mut() {
                Some(last)
                    if token.kind == TokenKind::Word
                        && last.kind == TokenKind::Word
                        && !last.ends_with_space() =>
                {
                    last.text.push_str(&token.text);
                }
                _ => words.push(token),
            }
        }
        words
    }

    /// Splits a line into whitespace-delimited arguments.
    ///
    /// Whitespace inside brackets or quotes does not split. Arguments are
    /// trimmed and empty ones are dropped.
    #[must_use]
    pub fn arguments(line: &str) -> Vec<String> {
        let mut arguments = Vec::new();
        let mut current = String::new();
        let mut depth = 0usize;
        let mut quoted = false;

        for token in Self::tokenize_line(line) {
            current.push_str(&token.text);
            match token.kind {
                TokenKind::Quote(_) => quoted = !quoted,
                kind if kind.is_open_bracket() => depth += 1,
                kind if kind.is_close_bracket() => depth = depth.saturating_sub(1),
                _ => {}
            }

            if depth == 0 && !quoted && current.ends_with(' ') {
                push_argument(&mut arguments, &current);
                current.clear();
            }
        }

        push_argument(&mut arguments, &current);
        arguments
    }

    /// Concatenates token texts.
    #[must_use]
    pub fn join(tokens: &[Token]) -> String {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }
}

fn push_argument(arguments: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        arguments.push(trimmed.to_string());
    }
}

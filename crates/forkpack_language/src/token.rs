//! Token types for source lines.
//!
//! Tokens are the output of the lexer. Unlike most token streams they keep
//! every character of the line, whitespace included, so concatenating the
//! texts of a line's tokens reproduces the line exactly.

use std::fmt;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// The type of this token.
    pub kind: TokenKind,
    /// The verbatim text this token covers.
    pub text: String,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Returns the token text without surrounding whitespace.
    #[must_use]
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }

    /// Returns true if this token ends with whitespace.
    #[must_use]
    pub fn ends_with_space(&self) -> bool {
        self.text.ends_with(' ')
    }

    /// Returns true if this is the given punctuation character.
    #[must_use]
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    /// Returns true for tokens made only of whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Token types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// A bare word or numeric fragment, possibly with one trailing space.
    Word,
    /// An opening or closing quote character.
    Quote(char),
    /// The verbatim contents between two matching quotes.
    Quoted,
    /// A single punctuation character.
    Punct(char),
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Quote(_) => "quote",
            Self::Quoted => "quoted text",
            Self::Punct(_) => "punctuation",
        }
    }

    /// Returns true if this kind opens a bracket group.
    #[must_use]
    pub const fn is_open_bracket(&self) -> bool {
        matches!(self, Self::Punct('[' | '{'))
    }

    /// Returns true if this kind closes a bracket group.
    #[must_use]
    pub const fn is_close_bracket(&self) -> bool {
        matches!(self, Self::Punct(']' | '}'))
    }
}

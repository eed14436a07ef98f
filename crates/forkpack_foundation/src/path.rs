//! Dotted function paths and synthetic fork codes.
//!
//! A [`FunctionPath`] such as `main.w0.b1` is both the identity of a
//! compiled function and the key of its lexical scope: resolving a name
//! walks the path's prefixes from innermost to outermost.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// =============================================================================
// ForkCode
// =============================================================================

/// The kind of a synthetic function generated to lower control flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ForkCode {
    /// Body of an implicit `execute` (and of `else`).
    Execute,
    /// Body of a `while`, `whilenot` or `loop`.
    While,
    /// Body of a `repeat`.
    Repeat,
    /// Guarded continuation after a body that may break or continue.
    Guard,
    /// Instance of a string-parameterized function.
    Instance,
}

impl ForkCode {
    /// Returns the single-letter code used in generated names.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Execute => 'e',
            Self::While => 'w',
            Self::Repeat => 'r',
            Self::Guard => 'b',
            Self::Instance => 's',
        }
    }

    /// Parses a single-letter code.
    #[must_use]
    pub const fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'e' => Some(Self::Execute),
            'w' => Some(Self::While),
            'r' => Some(Self::Repeat),
            'b' => Some(Self::Guard),
            's' => Some(Self::Instance),
            _ => None,
        }
    }

    /// Returns the path segment for the `counter`-th fork of this code.
    #[must_use]
    pub fn segment(self, counter: u32) -> String {
        format!("{}{counter}", self.letter())
    }

    /// Splits a segment like `b12` into its code and counter.
    ///
    /// Returns `None` for user-chosen names.
    #[must_use]
    pub fn parse_segment(segment: &str) -> Option<(Self, u32)> {
        let mut chars = segment.chars();
        let code = Self::from_letter(chars.next()?)?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(|n| (code, n))
    }

    /// Returns true if a fork of this kind starts a new loop scope.
    #[must_use]
    pub const fn is_loop(self) -> bool {
        matches!(self, Self::While | Self::Repeat)
    }
}

impl fmt::Display for ForkCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

// =============================================================================
// FunctionPath
// =============================================================================

/// A dotted function path like `main.greet.e0`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FunctionPath {
    segments: Vec<String>,
}

impl FunctionPath {
    /// Creates a single-segment root path.
    #[must_use]
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    /// Parses a dotted string like `main.load`.
    #[must_use]
    pub fn parse(dotted: &str) -> Self {
        Self {
            segments: dotted.split('.').map(String::from).collect(),
        }
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the path extended by one segment.
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Returns the path of the `counter`-th fork with the given code.
    #[must_use]
    pub fn fork(&self, code: ForkCode, counter: u32) -> Self {
        self.child(code.segment(counter))
    }

    /// Returns the enclosing path, or `None` for a root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns the last segment.
    #[must_use]
    pub fn last(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Returns the fork code and counter of the last segment, if synthetic.
    #[must_use]
    pub fn last_fork(&self) -> Option<(ForkCode, u32)> {
        ForkCode::parse_segment(self.last())
    }

    /// Returns the dotted name of `name` declared in this scope.
    #[must_use]
    pub fn qualify(&self, name: &str) -> String {
        format!("{self}.{name}")
    }

    /// Returns the dotted names to try when resolving `name` from this scope,
    /// innermost first.
    pub fn candidates<'a>(&'a self, name: &'a str) -> impl Iterator<Item = String> + 'a {
        (1..=self.segments.len())
            .rev()
            .map(move |end| format!("{}.{name}", self.segments[..end].join(".")))
    }

    /// Returns true if `self` strictly encloses `other`.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.segments.len() < other.segments.len() && other.segments.starts_with(&self.segments)
    }

    /// Returns the output artifact name: the path without its root segment.
    ///
    /// A bare root keeps its own name.
    #[must_use]
    pub fn artifact_name(&self) -> String {
        match self.segments.split_first() {
            Some((root, [])) => root.clone(),
            Some((_, rest)) => rest.join("."),
            None => String::new(),
        }
    }
}

impl fmt::Display for FunctionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for FunctionPath {
    fn from(dotted: &str) -> Self {
        Self::parse(dotted)
    }
}

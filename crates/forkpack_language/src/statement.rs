//! Statement classification.
//!
//! Each preprocessed line is exactly one [`Statement`]. Classification
//! looks at the leading word of the line and tries the statement forms in
//! a fixed order; the first that matches wins, and anything left over is
//! a passthrough command.

use std::fmt;

use forkpack_foundation::{Error, ErrorKind, FunctionPath, Result};

use crate::lexer::Lexer;
use crate::token::TokenKind;

/// Keywords that open an implicit `execute` block.
pub const EXECUTE_KEYWORDS: &[&str] = &[
    "as",
    "at",
    "positioned",
    "align",
    "facing",
    "rotated",
    "in",
    "anchored",
    "if",
    "unless",
    "store",
];

/// Every reserved leading keyword.
pub const KEYWORDS: &[&str] = &[
    "def",
    "as",
    "at",
    "positioned",
    "align",
    "facing",
    "rotated",
    "in",
    "anchored",
    "if",
    "unless",
    "store",
    "else",
    "repeat",
    "while",
    "whilenot",
    "loop",
    "break",
    "continue",
];

/// Leading words that are rejected outright.
const FORBIDDEN: &[&str] = &["function", "include", "file"];

// =============================================================================
// Operators
// =============================================================================

/// An in-place integer operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AugmentedOp {
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
    /// `%=`
    Mod,
    /// `<`: keep the smaller value.
    Min,
    /// `>`: keep the larger value.
    Max,
    /// `><`: swap the two slots.
    Swap,
}

impl AugmentedOp {
    /// Splits a leading operator off `rest`.
    #[must_use]
    pub fn split(rest: &str) -> Option<(Self, &str)> {
        const TABLE: &[(&str, AugmentedOp)] = &[
            ("+=", AugmentedOp::Add),
            ("-=", AugmentedOp::Sub),
            ("*=", AugmentedOp::Mul),
            ("/=", AugmentedOp::Div),
            ("%=", AugmentedOp::Mod),
            ("><", AugmentedOp::Swap),
        ];
        for (text, op) in TABLE {
            if let Some(operand) = rest.strip_prefix(text) {
                return Some((*op, operand));
            }
        }
        if rest.starts_with("<=") || rest.starts_with(">=") {
            return None;
        }
        if let Some(operand) = rest.strip_prefix('<') {
            return Some((Self::Min, operand));
        }
        rest.strip_prefix('>').map(|operand| (Self::Max, operand))
    }

    /// The operator as written in a scoreboard operation.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+=",
            Self::Sub => "-=",
            Self::Mul => "*=",
            Self::Div => "/=",
            Self::Mod => "%=",
            Self::Min => "<",
            Self::Max => ">",
            Self::Swap => "><",
        }
    }
}

impl fmt::Display for AugmentedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// The flavor of a loop header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopKind {
    /// `while <condition>:` runs while the condition holds.
    While,
    /// `whilenot <condition>:` runs while the condition fails.
    WhileNot,
    /// `loop [clauses]:` runs with raw `execute` clauses, or forever.
    Loop,
}

// =============================================================================
// Statement
// =============================================================================

/// One classified source line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    /// `name[#clarifier] = value`
    Assignment {
        /// Destination name.
        target: String,
        /// Destination clarifier, if any.
        clarifier: Option<String>,
        /// Right-hand side text.
        value: String,
    },
    /// `name op= operand`
    Augmented {
        /// Destination name.
        target: String,
        /// Operator.
        op: AugmentedOp,
        /// Right-hand side text.
        operand: String,
    },
    /// `name++` or `name--`
    Step {
        /// Destination name.
        target: String,
        /// True for `++`.
        increment: bool,
    },
    /// `def name params:`
    Definition {
        /// Function name.
        name: String,
    },
    /// A call to a user function.
    Call {
        /// Resolved callee.
        callee: FunctionPath,
        /// Argument text.
        args: String,
    },
    /// An implicit `execute` block header, keyword included.
    Dispatch {
        /// Clause text.
        clauses: String,
    },
    /// `else [clauses]:`
    Else {
        /// Extra clause text; may be empty.
        clauses: String,
    },
    /// `repeat N:`
    Repeat {
        /// Count text.
        count: String,
    },
    /// `while`, `whilenot` or `loop`.
    Loop {
        /// Loop flavor.
        kind: LoopKind,
        /// Condition text after the keyword.
        condition: String,
    },
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// Anything else, passed through after substitution.
    Command(String),
}

impl Statement {
    /// Classifies a line.
    ///
    /// `resolve_function` maps a leading word to a callable function.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MalformedCommand`] for lines starting with
    /// `function`, `include` or `file`.
    pub fn classify<F>(line: &str, resolve_function: F) -> Result<Self>
    where
        F: FnOnce(&str) -> Option<FunctionPath>,
    {
        let line = line.trim();
        let (head, rest) = split_head(line);

        if !head.is_empty() {
            let (target, clarifier) = split_clarifier(head);

            if let Some(value) = rest.strip_prefix('=').filter(|v| !v.starts_with('=')) {
                return Ok(Self::Assignment {
                    target: target.to_string(),
                    clarifier: clarifier.map(String::from),
                    value: value.trim().to_string(),
                });
            }
            if let Some((op, operand)) = AugmentedOp::split(rest) {
                return Ok(Self::Augmented {
                    target: target.to_string(),
                    op,
                    operand: operand.trim().to_string(),
                });
            }
            if rest == "++" || rest == "--" {
                return Ok(Self::Step {
                    target: target.to_string(),
                    increment: rest == "++",
                });
            }
        }

        let body = strip_colon(line);
        let after_head = strip_colon(rest);
        match head {
            "def" => {
                let name = Lexer::arguments(after_head)
                    .into_iter()
                    .next()
                    .unwrap_or_default();
                return Ok(Self::Definition { name });
            }
            "else" => {
                return Ok(Self::Else {
                    clauses: after_head.to_string(),
                });
            }
            "repeat" => {
                return Ok(Self::Repeat {
                    count: after_head.to_string(),
                });
            }
            "while" | "whilenot" | "loop" => {
                let kind = match head {
                    "while" => LoopKind::While,
                    "whilenot" => LoopKind::WhileNot,
                    _ => LoopKind::Loop,
                };
                return Ok(Self::Loop {
                    kind,
                    condition: after_head.to_string(),
                });
            }
            "break" if after_head.is_empty() => return Ok(Self::Break),
            "continue" if after_head.is_empty() => return Ok(Self::Continue),
            h if FORBIDDEN.contains(&h) => {
                return Err(Error::new(ErrorKind::MalformedCommand(format!(
                    "\"{h}\" cannot be used as a command here."
                ))));
            }
            h if EXECUTE_KEYWORDS.contains(&h) => {
                return Ok(Self::Dispatch {
                    clauses: body.to_string(),
                });
            }
            _ => {}
        }

        if !head.is_empty() && !KEYWORDS.contains(&head) {
            if let Some(callee) = resolve_function(head) {
                return Ok(Self::Call {
                    callee,
                    args: rest.to_string(),
                });
            }
        }

        Ok(Self::Command(line.to_string()))
    }

    /// Returns true for statements that keep an `else` chain open.
    #[must_use]
    pub const fn continues_chain(&self) -> bool {
        matches!(self, Self::Dispatch { .. } | Self::Else { .. })
    }
}

/// Splits a line into its leading word and the trimmed remainder.
///
/// The leading word is the run of word tokens before the first whitespace,
/// punctuation or quote.
#[must_use]
pub fn split_head(line: &str) -> (&str, &str) {
    let mut len = 0;
    for token in Lexer::tokenize_line(line) {
        if token.kind != TokenKind::Word {
            break;
        }
        if token.ends_with_space() {
            len += token.text.trim_end().len();
            break;
        }
        len += token.text.len();
    }
    (&line[..len], line[len..].trim())
}

/// Splits `name#clarifier`.
#[must_use]
pub fn split_clarifier(word: &str) -> (&str, Option<&str>) {
    match word.split_once('#') {
        Some((name, clarifier)) => (name, Some(clarifier)),
        None => (word, None),
    }
}

/// Returns true if the line's leading word is `else`.
#[must_use]
pub fn starts_with_else(line: &str) -> bool {
    split_head(line).0 == "else"
}

fn strip_colon(text: &str) -> &str {
    let text = text.trim();
    text.strip_suffix(':').map_or(text, str::trim_end)
}

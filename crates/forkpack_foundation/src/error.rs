//! Error types for the forkpack compiler.
//!
//! Uses `thiserror` for the error kinds. Every error is fatal to the
//! compilation that raised it; the context records which source line
//! was being compiled when it happened.

use std::fmt;

use thiserror::Error;

/// The main error type for forkpack operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Returns true if this is a syntax error (missing or misplaced content).
    #[must_use]
    pub fn is_syntax(&self) -> bool {
        self.kind.is_syntax()
    }

    /// Returns the reported source line, if any.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        self.context.as_ref().map(|ctx| ctx.line)
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(ctx) = &self.context else {
            return write!(f, "{}", self.kind);
        };
        let position = if self.is_syntax() { "after" } else { "at" };
        write!(f, "Error {position} line {}", ctx.line)?;
        if let Some(source) = &ctx.source {
            write!(f, " of {source}")?;
        }
        write!(f, ": \"{}\"\n\t{}", ctx.text, self.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    // Structural errors
    /// A block was opened but no content follows it.
    #[error("Expected content, nothing found.")]
    ExpectedContent,

    /// A block starts at a different depth than its header implies.
    #[error("Incorrect indentation.")]
    IncorrectIndentation,

    /// Leading whitespace is not a multiple of the detected indent unit.
    #[error("Unknown indentation. There may be a missing or extra space character.")]
    UnknownIndentation,

    // Compilation errors
    /// A function with this name already exists in the same scope.
    #[error("Duplicate function \"{0}\".")]
    DuplicateFunction(String),

    /// `def` without a name.
    #[error("No function name provided.")]
    MissingFunctionName,

    /// The function name contains invalid characters or is reserved.
    #[error("Invalid function name: \"{0}\".")]
    InvalidFunctionName(String),

    /// A parameter name contains invalid characters.
    #[error("Invalid parameter name \"{parameter}\" for function \"{function}\".")]
    InvalidParameterName {
        /// The function being declared.
        function: String,
        /// The offending parameter.
        parameter: String,
    },

    /// A parameter carries an unknown clarifier.
    #[error("Invalid parameter clarifier \"{parameter}\" for function \"{function}\".")]
    InvalidParameterClarifier {
        /// The function being declared.
        function: String,
        /// The offending parameter.
        parameter: String,
    },

    /// A parameter without a default follows one with a default.
    #[error("Can't have a non-default parameter after a default parameter.")]
    DefaultOrder,

    /// A function with default parameters declares sub-functions.
    #[error("A function with defaults cannot have any sub-functions.")]
    DefaultsWithSubfunctions,

    /// A call supplies fewer arguments than required.
    #[error("Not enough parameters for function \"{0}\".")]
    NotEnoughParameters(String),

    /// A call selects a sub-function that does not exist.
    #[error("\"{name}\" is not a valid sub-function of function \"{function}\".")]
    UnknownSubfunction {
        /// The function that was called.
        function: String,
        /// The requested sub-function.
        name: String,
    },

    /// A call resolves to a function that is not registered.
    #[error("Unknown function \"{0}\".")]
    UnknownFunction(String),

    /// A function calls itself or one of its enclosing functions.
    #[error("Attempt at recursing in function {0}, this is not supported.")]
    Recursion(String),

    /// An operator is missing its right-hand side.
    #[error("Expected something after \"{0}\".")]
    ExpectedExpression(String),

    /// An invalid variable name appears on the left of an assignment.
    #[error("Invalid variable name: \"{0}\".")]
    InvalidVariableName(String),

    /// The value does not fit the declared or expected kind.
    #[error("\"{value}\" is not a valid {expected}.")]
    TypeMismatch {
        /// Description of what was expected.
        expected: String,
        /// The value that was supplied.
        value: String,
    },

    /// A `#clarifier` declaration names no known kind.
    #[error("Invalid global variable: \"{0}\".")]
    InvalidDeclaration(String),

    /// A string variable is assigned a second time.
    #[error("Strings are handled at compile time, so overwriting string \"{0}\" is not allowed.")]
    StringReassignment(String),

    /// The destination of an augmented assignment is not an integer.
    #[error("Cannot perform augmented assignment on \"{0}\".")]
    InvalidAugmentedTarget(String),

    /// The operand of an augmented assignment is not an integer.
    #[error("Cannot perform augmented assignment with \"{0}\".")]
    InvalidAugmentedOperand(String),

    /// `break` outside of any loop body.
    #[error("\"break\" outside of loop.")]
    BreakOutsideLoop,

    /// `continue` outside of any loop body.
    #[error("\"continue\" outside of loop.")]
    ContinueOutsideLoop,

    /// An unknown `#clarifier` on a reference.
    #[error("Unknown clarifier: \"{0}\".")]
    UnknownClarifier(String),

    /// A repeat count or literal that is not a valid number.
    #[error("\"{0}\" is not a valid number.")]
    InvalidNumber(String),

    /// `else` that does not follow a dispatch line.
    #[error("\"else\" without a matching execution block.")]
    ElseWithoutDispatch,

    /// A comparison operand that is neither an integer variable nor a literal.
    #[error("\"{0}\" is not a valid integer variable or constant.")]
    InvalidComparisonOperand(String),

    /// A comparison between two literals.
    #[error("Cannot compare two constants.")]
    ConstantComparison,

    /// A comparison outside of `if`/`unless`/`while`/`whilenot`.
    #[error("Integer comparison without a conditional.")]
    ComparisonWithoutConditional,

    /// A command that cannot be emitted as written.
    #[error("{0}")]
    MalformedCommand(String),

    /// A string placeholder survived until linking.
    #[error("String \"{0}\" has no value bound at this call site.")]
    UnboundString(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorKind {
    /// Returns true for errors raised on missing or misplaced content.
    ///
    /// These are reported against the line before the one being read.
    #[must_use]
    pub const fn is_syntax(&self) -> bool {
        matches!(self, Self::ExpectedContent | Self::IncorrectIndentation)
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// Source file name, when compiling more than one file.
    pub source: Option<String>,
    /// 1-based line number in the source.
    pub line: usize,
    /// The literal text of that line.
    pub text: String,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source name.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line number and its text.
    #[must_use]
    pub fn with_line(mut self, line: usize, text: impl Into<String>) -> Self {
        self.line = line;
        self.text = text.into();
        self
    }
}

/// Result type for forkpack operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Compiled function records.
//!
//! Every function of a namespace, whether written by the user or generated
//! to lower control flow, is a [`Function`] owned by the namespace arena
//! and addressed by its [`FunctionPath`].

use forkpack_foundation::{Error, ErrorKind, ForkCode, FunctionPath, Result, VariableKind};

use crate::lexer::Lexer;
use crate::scope::SymbolTable;
use crate::statement::KEYWORDS;

// =============================================================================
// FunctionKind
// =============================================================================

/// How a function came to exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    /// The root function of the namespace.
    Root,
    /// A function declared with `def`.
    Defined,
    /// A synthetic function generated by the forking engine.
    Fork(ForkCode),
    /// An instance of a string-parameterized function.
    Instance,
}

impl FunctionKind {
    /// Returns true if this function binds its own parameters.
    #[must_use]
    pub const fn binds_params(self) -> bool {
        matches!(self, Self::Defined | Self::Instance)
    }

    /// Returns true for guard-chain links.
    #[must_use]
    pub const fn is_guard(self) -> bool {
        matches!(self, Self::Fork(ForkCode::Guard))
    }
}

// =============================================================================
// Param
// =============================================================================

/// A declared function parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Declared kind; entity when no clarifier is given.
    pub kind: VariableKind,
    /// Default argument text, evaluated in the caller's scope.
    pub default: Option<String>,
}

impl Param {
    /// Creates a parameter without a default.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: VariableKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    /// Sets the default argument text.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

// =============================================================================
// Template
// =============================================================================

/// Deferred state of a string-parameterized function.
///
/// Such a function is only compiled per distinct tuple of string
/// arguments, against the symbols visible where it was defined.
#[derive(Clone, Debug, Default)]
pub struct Template {
    /// Symbols visible at the definition.
    pub symbols: SymbolTable,
    /// Number of instances created so far.
    pub counter: u32,
}

// =============================================================================
// Function
// =============================================================================

/// One function of the namespace.
#[derive(Clone, Debug)]
pub struct Function {
    /// Identity and scope key.
    pub path: FunctionPath,
    /// Origin of the function.
    pub kind: FunctionKind,
    /// Declared parameters.
    pub params: Vec<Param>,
    /// Index of the first body line in the namespace's line list.
    pub start: usize,
    /// Indentation depth of the body.
    pub depth: usize,
    /// Emitted commands.
    pub commands: Vec<String>,
    /// Set when something must invoke this function by name.
    pub used: bool,
    /// The body may summon its loop's break marker.
    pub has_break: bool,
    /// The body may summon its loop's continue marker.
    pub has_continue: bool,
    /// Nearest enclosing user-defined function (itself for `def`s).
    pub owner: FunctionPath,
    /// Nearest enclosing loop body.
    pub enclosing_loop: Option<FunctionPath>,
    /// String values bound for an instance, by qualified parameter path.
    pub bindings: Vec<(String, String)>,
    /// Present once a string-parameterized `def` has been reached.
    pub template: Option<Template>,
    /// Guard-chain link that continues this function's block.
    pub continuation: Option<FunctionPath>,
    /// Set once the body has been compiled.
    pub compiled: bool,
}

impl Function {
    /// Creates an uncompiled function.
    #[must_use]
    pub fn new(
        path: FunctionPath,
        kind: FunctionKind,
        start: usize,
        depth: usize,
        owner: FunctionPath,
    ) -> Self {
        Self {
            path,
            kind,
            params: Vec::new(),
            start,
            depth,
            commands: Vec::new(),
            used: false,
            has_break: false,
            has_continue: false,
            owner,
            enclosing_loop: None,
            bindings: Vec::new(),
            template: None,
            continuation: None,
            compiled: false,
        }
    }

    /// Creates the root function.
    #[must_use]
    pub fn root(path: FunctionPath) -> Self {
        let mut function = Self::new(path.clone(), FunctionKind::Root, 0, 0, path);
        function.used = true;
        function
    }

    /// Sets the parameters.
    #[must_use]
    pub fn with_params(mut self, params: Vec<Param>) -> Self {
        self.params = params;
        self
    }

    /// Sets the enclosing loop.
    #[must_use]
    pub fn with_loop(mut self, enclosing_loop: Option<FunctionPath>) -> Self {
        self.enclosing_loop = enclosing_loop;
        self
    }

    /// Sets the string bindings.
    #[must_use]
    pub fn with_bindings(mut self, bindings: Vec<(String, String)>) -> Self {
        self.bindings = bindings;
        self
    }

    /// Returns true if any parameter is a string.
    #[must_use]
    pub fn is_template(&self) -> bool {
        self.params.iter().any(|p| p.kind.is_string())
    }

    /// Returns true if any parameter has a default.
    #[must_use]
    pub fn has_defaults(&self) -> bool {
        self.params.iter().any(|p| p.default.is_some())
    }
}

// =============================================================================
// Definitions
// =============================================================================

/// A parsed `def` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Definition {
    /// Function name.
    pub name: String,
    /// Declared parameters.
    pub params: Vec<Param>,
}

impl Definition {
    /// Parses a `def name params:` line.
    ///
    /// # Errors
    ///
    /// Returns an error for a missing or invalid name, an invalid parameter
    /// name or clarifier, or a parameter without a default after one with
    /// a default.
    pub fn parse(line: &str) -> Result<Self> {
        let body = line.trim();
        let body = body.strip_prefix("def").unwrap_or(body).trim();
        let body = body.strip_suffix(':').unwrap_or(body);
        let mut arguments = Lexer::arguments(body).into_iter();

        let name = arguments
            .next()
            .ok_or_else(|| Error::new(ErrorKind::MissingFunctionName))?;
        if !is_valid_function_name(&name) {
            return Err(Error::new(ErrorKind::InvalidFunctionName(name)));
        }

        let mut params = Vec::new();
        let mut seen_default = false;
        for token in arguments {
            let (spec, default) = match token.split_once('=') {
                Some((spec, default)) => (spec, Some(default)),
                None => (token.as_str(), None),
            };
            if default.is_some() {
                seen_default = true;
            } else if seen_default {
                return Err(Error::new(ErrorKind::DefaultOrder));
            }

            let (param, clarifier) = match spec.split_once('#') {
                Some((param, clarifier)) => (param, Some(clarifier)),
                None => (spec, None),
            };
            if !is_valid_variable_name(param) {
                return Err(Error::new(ErrorKind::InvalidParameterName {
                    function: name,
                    parameter: token.clone(),
                }));
            }
            let kind = match clarifier {
                None => VariableKind::ENTITY,
                Some(c) => VariableKind::from_declaration(c).ok_or_else(|| {
                    Error::new(ErrorKind::InvalidParameterClarifier {
                        function: name.clone(),
                        parameter: token.clone(),
                    })
                })?,
            };

            let mut parsed = Param::new(param, kind);
            if let Some(default) = default {
                parsed = parsed.with_default(default);
            }
            params.push(parsed);
        }

        Ok(Self { name, params })
    }
}

/// Returns true for names usable as a variable or parameter.
///
/// Lowercase ASCII letters, digits and underscores, not starting with a
/// digit.
#[must_use]
pub fn is_valid_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Returns true for names usable as a function.
///
/// Function names follow variable naming, and may be neither a reserved
/// keyword nor shaped like a generated segment such as `e0` or `b12`.
#[must_use]
pub fn is_valid_function_name(name: &str) -> bool {
    is_valid_variable_name(name)
        && !KEYWORDS.contains(&name)
        && ForkCode::parse_segment(name).is_none()
}

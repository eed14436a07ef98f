//! The namespace: compilation context and function arena.
//!
//! One [`Namespace`] owns everything a compilation mutates: the function
//! arena, the symbol table, the integer slot registry and the constant
//! pool. It is passed by `&mut` into every recursive compile, so there is
//! no process-wide state and two compilations never interfere.

use std::rc::Rc;

use forkpack_foundation::{
    Error, ErrorContext, ErrorKind, FunctionPath, Result, VariableKind,
};
use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::commands::Scoreboard;
use crate::compiler::FunctionCompiler;
use crate::function::{Function, FunctionKind};
use crate::linker;
use crate::marker::unescape;
use crate::options::CompileOptions;
use crate::output::CompiledPack;
use crate::preprocess::{SourceLine, preprocess};
use crate::scope::SymbolTable;

/// Dotted path of the `index`-th interned constant.
#[must_use]
pub fn constant_path(index: usize) -> String {
    format!("CONSTANT.{index}")
}

/// The compilation context.
#[derive(Debug)]
pub struct Namespace {
    /// Options for this compilation.
    options: CompileOptions,
    /// Every function, in registration order.
    functions: IndexMap<FunctionPath, Function>,
    /// Dotted paths of integer variables, in declaration order.
    ints: IndexSet<String>,
    /// Interned literal constants, deduplicated by value.
    constants: Vec<i64>,
    /// Objective name for every integer slot and constant.
    slots: IndexMap<String, String>,
    /// The shared symbol table.
    pub(crate) symbols: SymbolTable,
    /// Preprocessed lines of every source, in order.
    lines: Rc<Vec<SourceLine>>,
    /// Source names, indexed by [`SourceLine::source`].
    sources: Vec<String>,
}

impl Namespace {
    /// Creates an empty namespace.
    #[must_use]
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            functions: IndexMap::new(),
            ints: IndexSet::new(),
            constants: Vec::new(),
            slots: IndexMap::new(),
            symbols: SymbolTable::new(),
            lines: Rc::new(Vec::new()),
            sources: Vec::new(),
        }
    }

    /// Returns the compilation options.
    #[must_use]
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Returns the pack identifier.
    #[must_use]
    pub fn pack(&self) -> &str {
        &self.options.pack
    }

    // =========================================================================
    // Sources
    // =========================================================================

    /// Preprocesses a source file and appends its lines.
    ///
    /// Sources are compiled in the order they are added, as one body.
    ///
    /// # Errors
    ///
    /// Returns an error if the file's indentation is inconsistent.
    pub fn add_source(&mut self, name: impl Into<String>, text: &str) -> Result<()> {
        let name = name.into();
        let index = self.sources.len();
        let lines = preprocess(text, self.options.default_indent, index).map_err(|err| {
            match err.context {
                Some(ctx) if !name.is_empty() => {
                    let ctx = ctx.with_source(name.clone());
                    Error::new(err.kind).with_context(ctx)
                }
                _ => err,
            }
        })?;
        debug!("source {index} ({name}): {} lines", lines.len());
        Rc::make_mut(&mut self.lines).extend(lines);
        self.sources.push(name);
        Ok(())
    }

    /// Returns the shared line list.
    #[must_use]
    pub fn lines(&self) -> Rc<Vec<SourceLine>> {
        Rc::clone(&self.lines)
    }

    /// Returns the source names.
    #[must_use]
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Builds error context for the line at `index`.
    ///
    /// An index past the end yields an empty context (line 0).
    #[must_use]
    pub fn context_at(&self, index: usize) -> ErrorContext {
        let Some(line) = self.lines.get(index) else {
            return ErrorContext::new();
        };
        let ctx = ErrorContext::new().with_line(line.line, unescape(&line.text));
        match self.sources.get(line.source) {
            Some(name) if !name.is_empty() => ctx.with_source(name.clone()),
            _ => ctx,
        }
    }

    /// Builds error context pointing at a function's header line.
    #[must_use]
    pub fn context_for(&self, path: &FunctionPath) -> ErrorContext {
        let index = self
            .functions
            .get(path)
            .map_or(0, |f| f.start.saturating_sub(1));
        self.context_at(index)
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Returns every function in registration order.
    #[must_use]
    pub fn functions(&self) -> &IndexMap<FunctionPath, Function> {
        &self.functions
    }

    /// Returns true if a function is registered at `path`.
    #[must_use]
    pub fn contains_function(&self, path: &FunctionPath) -> bool {
        self.functions.contains_key(path)
    }

    /// Returns the function at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownFunction`] if none is registered.
    pub fn function(&self, path: &FunctionPath) -> Result<&Function> {
        self.functions
            .get(path)
            .ok_or_else(|| Error::new(ErrorKind::UnknownFunction(path.to_string())))
    }

    /// Returns the function at `path` for modification.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownFunction`] if none is registered.
    pub fn function_mut(&mut self, path: &FunctionPath) -> Result<&mut Function> {
        self.functions
            .get_mut(path)
            .ok_or_else(|| Error::new(ErrorKind::UnknownFunction(path.to_string())))
    }

    /// Registers a new function.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DuplicateFunction`] if the path is taken.
    pub fn register(&mut self, function: Function) -> Result<()> {
        if self.functions.contains_key(&function.path) {
            return Err(Error::new(ErrorKind::DuplicateFunction(
                function.path.last().to_string(),
            )));
        }
        self.functions.insert(function.path.clone(), function);
        Ok(())
    }

    /// Resolves a user function name from `scope`, innermost first.
    #[must_use]
    pub fn resolve_function(&self, scope: &FunctionPath, name: &str) -> Option<FunctionPath> {
        if name.is_empty() {
            return None;
        }
        scope.candidates(name).map(|c| FunctionPath::parse(&c)).find(|path| {
            self.functions
                .get(path)
                .is_some_and(|f| f.kind == FunctionKind::Defined)
        })
    }

    /// Drops every function that is unused or has no commands.
    ///
    /// Returns the dropped paths.
    pub fn prune(&mut self) -> Vec<FunctionPath> {
        let dropped: Vec<FunctionPath> = self
            .functions
            .values()
            .filter(|f| !f.used || f.commands.is_empty())
            .map(|f| f.path.clone())
            .collect();
        self.functions
            .retain(|_, f| f.used && !f.commands.is_empty());
        if !dropped.is_empty() {
            debug!(
                "pruned {} functions: {}",
                dropped.len(),
                dropped
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        dropped
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    /// Returns the symbol table.
    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Resolves a variable name from `scope`, innermost first.
    #[must_use]
    pub fn resolve_reference(&self, scope: &FunctionPath, name: &str) -> Option<String> {
        self.symbols.resolve(scope, name)
    }

    /// Returns the kind of a fully-qualified symbol.
    #[must_use]
    pub fn kind_of(&self, path: &str) -> Option<VariableKind> {
        self.symbols.kind(path)
    }

    // =========================================================================
    // Integer slots
    // =========================================================================

    /// Registers an integer variable and assigns it an objective name.
    ///
    /// Registering the same path twice is a no-op.
    pub fn add_int(&mut self, path: &str) {
        if self.ints.insert(path.to_string()) {
            let short = self.shorten(&format!("{path}.{}", self.slots.len()));
            self.slots.insert(path.to_string(), short);
        }
    }

    /// Interns a literal constant and returns its slot path.
    pub fn add_constant(&mut self, value: i64) -> String {
        if let Some(index) = self.constants.iter().position(|&v| v == value) {
            return constant_path(index);
        }
        let path = constant_path(self.constants.len());
        self.constants.push(value);
        let short = self.shorten(&path);
        self.slots.insert(path.clone(), short);
        path
    }

    /// Returns the objective name of an integer slot.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the slot was never registered.
    pub fn objective(&self, path: &str) -> Result<&str> {
        self.slots
            .get(path)
            .map(String::as_str)
            .ok_or_else(|| Error::internal(format!("no scoreboard slot for \"{path}\"")))
    }

    /// Returns the integer variable paths in declaration order.
    #[must_use]
    pub fn ints(&self) -> &IndexSet<String> {
        &self.ints
    }

    /// Returns the interned constants.
    #[must_use]
    pub fn constants(&self) -> &[i64] {
        &self.constants
    }

    /// Returns the slot path to objective map.
    #[must_use]
    pub fn slots(&self) -> &IndexMap<String, String> {
        &self.slots
    }

    /// Returns a scoreboard command builder for this pack.
    #[must_use]
    pub fn scoreboard(&self) -> Scoreboard<'_> {
        Scoreboard::new(&self.options.pack)
    }

    /// Keeps the last `slot_name_limit` characters of a name.
    fn shorten(&self, name: &str) -> String {
        let count = name.chars().count();
        name.chars()
            .skip(count.saturating_sub(self.options.slot_name_limit))
            .collect()
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    /// Compiles the root function, and with it everything reachable.
    ///
    /// # Errors
    ///
    /// Returns the first compilation error.
    pub fn compile(&mut self) -> Result<()> {
        let root = self.options.root_path();
        self.register(Function::root(root.clone()))?;
        FunctionCompiler::new(self, &root)?.compile()
    }

    /// Links the compiled namespace into its final command lists.
    ///
    /// # Errors
    ///
    /// Returns an error if a call cannot be resolved.
    pub fn link(self) -> Result<CompiledPack> {
        linker::link(self)
    }
}

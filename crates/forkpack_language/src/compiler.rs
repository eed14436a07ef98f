//! The function compiler.
//!
//! A [`FunctionCompiler`] turns the lines of one function body into
//! commands. It walks the namespace's line list from the function's first
//! body line, classifies each line at the body's depth and lowers it,
//! forking a fresh compiler for every nested block (see `fork.rs`) and
//! every `def` reached. Calls to other functions are left as deferred
//! markers for the linker.

use std::rc::Rc;

use forkpack_foundation::{Error, ErrorKind, FunctionPath, Result, VariableKind};
use log::{debug, trace};

use crate::commands::{tag_add, tag_release, tag_summon};
use crate::function::{Definition, Function, FunctionKind, Param, Template, is_valid_variable_name};
use crate::lexer::Lexer;
use crate::marker::CallMarker;
use crate::namespace::Namespace;
use crate::preprocess::SourceLine;
use crate::statement::{AugmentedOp, Statement, split_clarifier, split_head};

/// The most recent branch of an open `if`/`else` chain.
#[derive(Clone, Debug)]
pub(crate) struct Dispatch {
    /// The branch's function.
    pub(crate) fork: FunctionPath,
    /// Marker shared by the chain, when an `else` follows.
    pub(crate) chain_marker: Option<String>,
}

/// Compiles one function body.
pub struct FunctionCompiler<'ns> {
    pub(crate) ns: &'ns mut Namespace,
    pub(crate) lines: Rc<Vec<SourceLine>>,
    pub(crate) path: FunctionPath,
    pub(crate) kind: FunctionKind,
    pub(crate) owner: FunctionPath,
    pub(crate) enclosing_loop: Option<FunctionPath>,
    params: Vec<Param>,
    bindings: Vec<(String, String)>,
    start: usize,
    pub(crate) depth: usize,
    /// Index of the line being compiled.
    pub(crate) pointer: usize,
    pub(crate) commands: Vec<String>,
    /// Commands a conditional needs run just before its `execute`.
    pub(crate) aux: Vec<String>,
    /// Symbols declared by this body.
    locals: Vec<String>,
    /// Next fork number.
    pub(crate) counter: u32,
    pub(crate) has_break: bool,
    pub(crate) has_continue: bool,
    pub(crate) continuation: Option<FunctionPath>,
    pub(crate) previous: Option<Dispatch>,
}

impl<'ns> FunctionCompiler<'ns> {
    /// Prepares to compile the registered function at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if no function is registered at `path`.
    pub fn new(ns: &'ns mut Namespace, path: &FunctionPath) -> Result<Self> {
        let function = ns.function(path)?;
        let kind = function.kind;
        let owner = function.owner.clone();
        let enclosing_loop = function.enclosing_loop.clone();
        let params = function.params.clone();
        let bindings = function.bindings.clone();
        let start = function.start;
        let depth = function.depth;
        let lines = ns.lines();
        Ok(Self {
            ns,
            lines,
            path: path.clone(),
            kind,
            owner,
            enclosing_loop,
            params,
            bindings,
            start,
            depth,
            pointer: start,
            commands: Vec::new(),
            aux: Vec::new(),
            locals: Vec::new(),
            counter: 0,
            has_break: false,
            has_continue: false,
            continuation: None,
            previous: None,
        })
    }

    /// Compiles the body and stores the result in the namespace.
    ///
    /// # Errors
    ///
    /// Returns the first error, located at the offending source line.
    pub fn compile(mut self) -> Result<()> {
        debug!("compiling {}", self.path);
        let lines = Rc::clone(&self.lines);

        match lines.get(self.start) {
            None if self.kind == FunctionKind::Root || self.kind.is_guard() => {
                return self.commit();
            }
            None => return Err(self.syntax_error(ErrorKind::ExpectedContent)),
            Some(first) if first.depth < self.depth => {
                if self.kind.is_guard() {
                    return self.commit();
                }
                return Err(self.syntax_error(ErrorKind::ExpectedContent));
            }
            Some(first) if first.depth > self.depth => {
                return Err(self.syntax_error(ErrorKind::IncorrectIndentation));
            }
            Some(_) => {}
        }

        self.bind_params();
        if !self.kind.is_guard() {
            self.scan_definitions()?;
        }

        self.pointer = self.start;
        let mut opens_block = false;
        while let Some(line) = lines.get(self.pointer) {
            if line.depth < self.depth {
                break;
            }
            if line.depth > self.depth {
                // only a block header may be followed by deeper lines
                if !opens_block {
                    let index = self.pointer.saturating_sub(1);
                    return Err(Error::new(ErrorKind::IncorrectIndentation)
                        .with_context(self.ns.context_at(index)));
                }
            } else {
                opens_block = line.text.ends_with(':');
                if !self.has_break && !self.has_continue {
                    let index = self.pointer;
                    self.process_line(&line.text)
                        .map_err(|err| self.locate(err, index))?;
                }
            }
            self.pointer += 1;
        }

        self.release_locals();
        self.commit()
    }

    // =========================================================================
    // Setup and teardown
    // =========================================================================

    fn bind_params(&mut self) {
        if self.kind.binds_params() {
            for param in &self.params {
                let path = self.owner.qualify(&param.name);
                self.ns.symbols.declare(path.clone(), param.kind);
                self.locals.push(path);
            }
        }
        for (path, value) in &self.bindings {
            self.ns.symbols.bind_string(path.clone(), value.clone());
            self.locals.push(path.clone());
        }
    }

    /// Registers every `def` at this body's depth before any line runs, so
    /// calls may precede definitions.
    fn scan_definitions(&mut self) -> Result<()> {
        let lines = Rc::clone(&self.lines);
        for (index, line) in lines.iter().enumerate().skip(self.start) {
            if line.depth < self.depth {
                break;
            }
            if line.depth > self.depth || split_head(&line.text).0 != "def" {
                continue;
            }
            self.register_definition(index, &line.text)
                .map_err(|err| self.locate(err, index))?;
        }
        Ok(())
    }

    fn register_definition(&mut self, index: usize, text: &str) -> Result<()> {
        if self.kind.binds_params() && self.params.iter().any(|p| p.default.is_some()) {
            return Err(Error::new(ErrorKind::DefaultsWithSubfunctions));
        }
        let definition = Definition::parse(text)?;
        let path = self.path.child(&definition.name);
        for param in &definition.params {
            if param.kind.is_integer() {
                self.ns.add_int(&path.qualify(&param.name));
            }
        }
        let function = Function::new(
            path.clone(),
            FunctionKind::Defined,
            index + 1,
            self.depth + 1,
            path.clone(),
        )
        .with_params(definition.params);
        self.ns.register(function)
    }

    /// Drops this body's non-integer symbols. Integer slots stay declared
    /// since the scoreboard objectives outlive the function.
    fn release_locals(&mut self) {
        for path in std::mem::take(&mut self.locals) {
            if self.ns.symbols.kind(&path) != Some(VariableKind::Integer) {
                self.ns.symbols.remove(&path);
            }
        }
    }

    fn commit(self) -> Result<()> {
        trace!("{}: {} commands", self.path, self.commands.len());
        let function = self.ns.function_mut(&self.path)?;
        function.commands = self.commands;
        function.has_break = self.has_break;
        function.has_continue = self.has_continue;
        function.continuation = self.continuation;
        function.compiled = true;
        Ok(())
    }

    // =========================================================================
    // Errors
    // =========================================================================

    pub(crate) fn locate(&self, err: Error, index: usize) -> Error {
        if err.context.is_some() {
            return err;
        }
        err.with_context(self.ns.context_at(index))
    }

    /// A structural error, reported after the line that opened the block.
    fn syntax_error(&self, kind: ErrorKind) -> Error {
        let index = self.start.checked_sub(1).unwrap_or(self.start);
        Error::new(kind).with_context(self.ns.context_at(index))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn process_line(&mut self, text: &str) -> Result<()> {
        trace!("{} [{}]: {text}", self.path, self.pointer);
        self.aux.clear();

        let statement = {
            let ns = &*self.ns;
            let scope = &self.path;
            Statement::classify(text, |name| ns.resolve_function(scope, name))?
        };
        let keeps_chain = statement.continues_chain();

        match statement {
            Statement::Assignment {
                target,
                clarifier,
                value,
            } => self.assign(&target, clarifier.as_deref(), &value)?,
            Statement::Augmented {
                target,
                op,
                operand,
            } => self.augment(&target, op, &operand)?,
            Statement::Step { target, increment } => self.step(&target, increment)?,
            Statement::Definition { name } => self.define(&name)?,
            Statement::Call { callee, args } => self.call(callee, &args)?,
            Statement::Dispatch { clauses } => self.dispatch(&clauses)?,
            Statement::Else { clauses } => self.else_branch(&clauses)?,
            Statement::Repeat { count } => self.repeat(&count)?,
            Statement::Loop { kind, condition } => self.loop_block(kind, &condition)?,
            Statement::Break => self.escape(true)?,
            Statement::Continue => self.escape(false)?,
            Statement::Command(command) => {
                let command = self.substitute(&command, false)?;
                self.emit(command)?;
            }
        }

        if !keeps_chain {
            self.previous = None;
        }
        Ok(())
    }

    pub(crate) fn emit(&mut self, command: String) -> Result<()> {
        if command.trim().is_empty() {
            return Err(Error::new(ErrorKind::MalformedCommand(
                "The command is empty.".to_string(),
            )));
        }
        self.commands.push(command);
        Ok(())
    }

    pub(crate) fn flush_aux(&mut self) -> Result<()> {
        for command in std::mem::take(&mut self.aux) {
            self.emit(command)?;
        }
        Ok(())
    }

    /// Resolves a variable name from this function's scope.
    pub(crate) fn resolve(&self, name: &str) -> Option<String> {
        self.ns.resolve_reference(&self.path, name)
    }

    /// Resolves a name to an integer slot path.
    pub(crate) fn resolve_int(&self, name: &str) -> Option<String> {
        self.resolve(name)
            .filter(|path| self.ns.kind_of(path) == Some(VariableKind::Integer))
    }

    fn declare_int(&mut self, path: &str) {
        self.ns.symbols.declare(path, VariableKind::Integer);
        self.ns.add_int(path);
    }

    fn assign(&mut self, target: &str, clarifier: Option<&str>, value: &str) -> Result<()> {
        if !is_valid_variable_name(target) {
            return Err(Error::new(ErrorKind::InvalidVariableName(target.to_string())));
        }
        if value.is_empty() {
            return Err(Error::new(ErrorKind::ExpectedExpression("=".to_string())));
        }
        let declared = clarifier
            .map(|c| {
                VariableKind::from_declaration(c)
                    .ok_or_else(|| Error::new(ErrorKind::UnknownClarifier(c.to_string())))
            })
            .transpose()?;

        let dest = match self.resolve(target) {
            None => {
                let dest = self.path.qualify(target);
                self.locals.push(dest.clone());
                dest
            }
            Some(existing) => {
                match self.ns.kind_of(&existing) {
                    Some(VariableKind::String) => {
                        return Err(Error::new(ErrorKind::StringReassignment(
                            target.to_string(),
                        )));
                    }
                    Some(VariableKind::Entity { .. }) => self.emit(tag_release(&existing))?,
                    _ => {}
                }
                existing
            }
        };

        if Lexer::arguments(value).first().is_some_and(|a| a == "summon") {
            let kind = match declared {
                None => VariableKind::ENTITY,
                Some(kind) if kind.is_entity() => kind,
                Some(_) => {
                    return Err(Error::new(ErrorKind::TypeMismatch {
                        expected: "entity".to_string(),
                        value: value.to_string(),
                    }));
                }
            };
            let command = self.substitute(value, false)?;
            self.emit(tag_summon(&command, &dest))?;
            self.ns.symbols.declare(dest, kind);
            return Ok(());
        }

        let expression = self.substitute(value, false)?;
        let literal = parse_int(&expression);
        let source = self.resolve_int(split_clarifier(value).0);

        match declared {
            None => {
                if let Some(value) = literal {
                    self.declare_int(&dest);
                    let command = self.ns.scoreboard().set(self.ns.objective(&dest)?, value);
                    self.emit(command)?;
                } else if let Some(source) = source {
                    self.declare_int(&dest);
                    self.copy_int(&dest, &source)?;
                } else if expression.starts_with('@') {
                    self.ns.symbols.declare(dest.clone(), VariableKind::ENTITY);
                    self.emit(tag_add(&expression, &dest))?;
                } else if let Some(declaration) = expression.strip_prefix('#') {
                    let kind = VariableKind::from_declaration(declaration)
                        .filter(|k| !k.is_string())
                        .ok_or_else(|| {
                            Error::new(ErrorKind::InvalidDeclaration(expression.clone()))
                        })?;
                    if kind.is_integer() {
                        self.declare_int(&dest);
                    } else {
                        self.ns.symbols.declare(dest, kind);
                    }
                } else {
                    self.ns.symbols.bind_string(dest, expression);
                }
            }
            Some(kind) if kind.is_entity() => {
                if !expression.starts_with('@') {
                    return Err(Error::new(ErrorKind::TypeMismatch {
                        expected: "entity".to_string(),
                        value: expression,
                    }));
                }
                self.ns.symbols.declare(dest.clone(), kind);
                self.emit(tag_add(&expression, &dest))?;
            }
            Some(VariableKind::Integer) => {
                self.declare_int(&dest);
                if let Some(value) = literal {
                    let command = self.ns.scoreboard().set(self.ns.objective(&dest)?, value);
                    self.emit(command)?;
                } else if let Some(source) = source {
                    self.copy_int(&dest, &source)?;
                } else {
                    return Err(Error::new(ErrorKind::TypeMismatch {
                        expected: "integer or integer variable".to_string(),
                        value: expression,
                    }));
                }
            }
            Some(_) => self.ns.symbols.bind_string(dest, expression),
        }
        Ok(())
    }

    fn copy_int(&mut self, dest: &str, source: &str) -> Result<()> {
        let command = self.ns.scoreboard().operation(
            self.ns.objective(dest)?,
            "=",
            self.ns.objective(source)?,
        );
        self.emit(command)
    }

    fn augment(&mut self, target: &str, op: AugmentedOp, operand: &str) -> Result<()> {
        let dest = self
            .resolve_int(target)
            .ok_or_else(|| Error::new(ErrorKind::InvalidAugmentedTarget(target.to_string())))?;
        if operand.is_empty() {
            return Err(Error::new(ErrorKind::ExpectedExpression(
                op.symbol().to_string(),
            )));
        }

        let board = self.ns.scoreboard();
        let objective = self.ns.objective(&dest)?;
        let command = if let Some(source) = self.resolve_int(split_clarifier(operand).0) {
            board.operation(objective, op.symbol(), self.ns.objective(&source)?)
        } else if let Some(value) = parse_int(operand) {
            match op {
                AugmentedOp::Add if value < 0 => board.remove(objective, -value),
                AugmentedOp::Add => board.add(objective, value),
                AugmentedOp::Sub if value < 0 => board.add(objective, -value),
                AugmentedOp::Sub => board.remove(objective, value),
                // a swap writes its operand, and constants are shared
                AugmentedOp::Swap => {
                    return Err(Error::new(ErrorKind::InvalidAugmentedOperand(
                        operand.to_string(),
                    )));
                }
                _ => {
                    let constant = self.ns.add_constant(value);
                    let board = self.ns.scoreboard();
                    board.operation(
                        self.ns.objective(&dest)?,
                        op.symbol(),
                        self.ns.objective(&constant)?,
                    )
                }
            }
        } else {
            return Err(Error::new(ErrorKind::InvalidAugmentedOperand(
                operand.to_string(),
            )));
        };
        self.emit(command)
    }

    fn step(&mut self, target: &str, increment: bool) -> Result<()> {
        let dest = self
            .resolve_int(target)
            .ok_or_else(|| Error::new(ErrorKind::InvalidAugmentedTarget(target.to_string())))?;
        let board = self.ns.scoreboard();
        let objective = self.ns.objective(&dest)?;
        let command = if increment {
            board.add(objective, 1)
        } else {
            board.remove(objective, 1)
        };
        self.emit(command)
    }

    fn define(&mut self, name: &str) -> Result<()> {
        let callee = self
            .ns
            .resolve_function(&self.path, name)
            .ok_or_else(|| Error::internal(format!("definition \"{name}\" was never registered")))?;

        if self.ns.function(&callee)?.is_template() {
            let symbols = self.ns.symbols.clone();
            self.ns.function_mut(&callee)?.template = Some(Template {
                symbols,
                counter: 0,
            });
            debug!("deferred {callee} until its string arguments are known");
            return Ok(());
        }

        FunctionCompiler::new(self.ns, &callee)?.compile()?;
        // user functions are entry points, kept even when every call inlines
        self.ns.function_mut(&callee)?.used = true;
        Ok(())
    }

    fn check_recursion(&self, callee: &FunctionPath) -> Result<()> {
        if *callee == self.owner || callee.is_ancestor_of(&self.owner) {
            return Err(Error::new(ErrorKind::Recursion(
                self.owner.artifact_name(),
            )));
        }
        Ok(())
    }

    fn call(&mut self, callee: FunctionPath, args: &str) -> Result<()> {
        let mut callee = callee;
        self.check_recursion(&callee)?;
        let mut params = self.ns.function(&callee)?.params.clone();
        let mut index = 0;
        let mut strings = Vec::new();
        let mut released = Vec::new();

        for arg in Lexer::arguments(args) {
            if index < params.len() {
                self.bind_argument(&callee, &params[index], &arg, &mut strings, &mut released)?;
                index += 1;
                continue;
            }
            let sub = callee.child(&arg);
            let is_subfunction = self
                .ns
                .functions()
                .get(&sub)
                .is_some_and(|f| f.kind == FunctionKind::Defined);
            if !is_subfunction {
                return Err(Error::new(ErrorKind::UnknownSubfunction {
                    function: callee.artifact_name(),
                    name: arg,
                }));
            }
            self.check_recursion(&sub)?;
            params = self.ns.function(&sub)?.params.clone();
            callee = sub;
            index = 0;
            strings.clear();
        }

        for param in &params[index..] {
            let Some(default) = &param.default else {
                return Err(Error::new(ErrorKind::NotEnoughParameters(
                    callee.artifact_name(),
                )));
            };
            self.bind_argument(&callee, param, default, &mut strings, &mut released)?;
        }

        self.emit(CallMarker::with_args(callee, strings).render())?;
        for tag in released {
            self.emit(tag_release(&tag))?;
        }
        Ok(())
    }

    fn bind_argument(
        &mut self,
        callee: &FunctionPath,
        param: &Param,
        arg: &str,
        strings: &mut Vec<String>,
        released: &mut Vec<String>,
    ) -> Result<()> {
        let slot = callee.qualify(&param.name);
        let expression = self.substitute(arg, false)?;
        match param.kind {
            VariableKind::Entity { .. } => {
                self.emit(tag_add(&expression, &slot))?;
                released.push(slot);
            }
            VariableKind::Integer => {
                let board = self.ns.scoreboard();
                let command = if let Some(value) = parse_int(&expression) {
                    board.set(self.ns.objective(&slot)?, value)
                } else if let Some(source) = self.resolve_int(split_clarifier(arg).0) {
                    board.operation(self.ns.objective(&slot)?, "=", self.ns.objective(&source)?)
                } else {
                    return Err(Error::new(ErrorKind::TypeMismatch {
                        expected: "integer or integer variable".to_string(),
                        value: arg.to_string(),
                    }));
                };
                self.emit(command)?;
            }
            VariableKind::String => strings.push(expression),
        }
        Ok(())
    }
}

/// Parses a 32-bit integer literal.
pub(crate) fn parse_int(text: &str) -> Option<i64> {
    text.trim().parse::<i32>().ok().map(i64::from)
}

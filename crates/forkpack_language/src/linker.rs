//! The linker.
//!
//! Runs once compilation has finished and rewrites every deferred call
//! marker into its final form, starting from the used functions and
//! following calls transitively:
//!
//! - a callee with no commands is skipped (the line becomes inert),
//! - a callee with exactly one command is inlined,
//! - anything else becomes a real `function <pack>:<name>` call and the
//!   callee is marked used.
//!
//! Calls carrying string arguments first instantiate the string-parameterized
//! function for that argument tuple. Afterwards unused and empty functions
//! are pruned, and the scoreboard prelude is added to the `load` function.

use std::collections::{HashMap, HashSet, VecDeque};

use forkpack_foundation::{Error, ErrorKind, ForkCode, FunctionPath, Result};
use log::{debug, info};

use crate::commands::{Scoreboard, call, inert, is_inert};
use crate::compiler::FunctionCompiler;
use crate::function::{Function, FunctionKind};
use crate::marker::{CallMarker, find_string_placeholder, unescape};
use crate::namespace::{Namespace, constant_path};
use crate::output::CompiledPack;

/// Reason recorded on calls to empty functions.
const SKIPPED: &str = "skipped empty call";

/// Links a compiled namespace.
///
/// # Errors
///
/// Returns an error if a call cannot be resolved, a string placeholder is
/// never bound, or a string instance fails to compile.
pub fn link(mut ns: Namespace) -> Result<CompiledPack> {
    Linker::new(&mut ns).run()?;
    ns.prune();
    restore_source_text(&mut ns)?;
    add_prelude(&mut ns)?;
    Ok(CompiledPack::from_namespace(&ns))
}

struct Linker<'ns> {
    ns: &'ns mut Namespace,
    queue: VecDeque<FunctionPath>,
    visited: HashSet<FunctionPath>,
    instances: HashMap<(FunctionPath, Vec<String>), FunctionPath>,
}

impl<'ns> Linker<'ns> {
    fn new(ns: &'ns mut Namespace) -> Self {
        let queue = ns
            .functions()
            .values()
            .filter(|f| f.used)
            .map(|f| f.path.clone())
            .collect();
        Self {
            ns,
            queue,
            visited: HashSet::new(),
            instances: HashMap::new(),
        }
    }

    fn run(mut self) -> Result<()> {
        while let Some(path) = self.queue.pop_front() {
            if !self.visited.insert(path.clone()) {
                continue;
            }
            let commands = self.ns.function(&path)?.commands.clone();
            let mut resolved = Vec::with_capacity(commands.len());
            for command in &commands {
                let line = self.resolve(command, 0).map_err(|err| {
                    if err.context.is_some() {
                        err
                    } else {
                        err.with_context(self.ns.context_for(&path))
                    }
                })?;
                resolved.push(line);
            }
            self.ns.function_mut(&path)?.commands = resolved;
        }
        Ok(())
    }

    fn resolve(&mut self, line: &str, depth: usize) -> Result<String> {
        let Some((start, marker, end)) = CallMarker::find(line) else {
            if let Some(path) = find_string_placeholder(line) {
                return Err(Error::new(ErrorKind::UnboundString(path.to_string())));
            }
            return Ok(line.to_string());
        };
        if depth > self.ns.functions().len() {
            return Err(Error::new(ErrorKind::Recursion(
                marker.target.artifact_name(),
            )));
        }

        let target = if marker.args.is_empty() {
            marker.target
        } else {
            self.instantiate(&marker.target, &marker.args)?
        };
        let (prefix, suffix) = (&line[..start], &line[end..]);
        let (count, first) = {
            let function = self
                .ns
                .functions()
                .get(&target)
                .ok_or_else(|| Error::new(ErrorKind::UnknownFunction(target.to_string())))?;
            (function.commands.len(), function.commands.first().cloned())
        };
        let called = format!("{prefix}{}{suffix}", call(self.ns.pack(), &target));

        match (count, first) {
            (1, Some(single)) => {
                let inlined = self.resolve(&single, depth + 1)?;
                if is_inert(&inlined) {
                    return Ok(inert(SKIPPED, &called));
                }
                Ok(format!("{prefix}{inlined}{suffix}"))
            }
            (_, None) => Ok(inert(SKIPPED, &called)),
            _ => {
                self.ns.function_mut(&target)?.used = true;
                if !self.visited.contains(&target) {
                    self.queue.push_back(target);
                }
                Ok(called)
            }
        }
    }

    /// Returns the instance of `template` for one string argument tuple,
    /// compiling it on first use.
    fn instantiate(&mut self, template: &FunctionPath, args: &[String]) -> Result<FunctionPath> {
        let key = (template.clone(), args.to_vec());
        if let Some(path) = self.instances.get(&key) {
            return Ok(path.clone());
        }

        let function = self
            .ns
            .functions()
            .get(template)
            .ok_or_else(|| Error::new(ErrorKind::UnknownFunction(template.to_string())))?;
        let Some(state) = &function.template else {
            return Err(Error::internal(format!(
                "{template} was called with string arguments before its definition was reached"
            )));
        };
        let params = function.params.clone();
        let (start, depth) = (function.start, function.depth);
        let (symbols, counter) = (state.symbols.clone(), state.counter);

        let bindings: Vec<(String, String)> = params
            .iter()
            .filter(|p| p.kind.is_string())
            .map(|p| template.qualify(&p.name))
            .zip(args.iter().cloned())
            .collect();
        let path = template.fork(ForkCode::Instance, counter);
        if let Some(state) = self.ns.function_mut(template)?.template.as_mut() {
            state.counter += 1;
        }

        let before = self.ns.functions().len();
        let instance = Function::new(
            path.clone(),
            FunctionKind::Instance,
            start,
            depth,
            template.clone(),
        )
        .with_params(params)
        .with_bindings(bindings);
        self.ns.register(instance)?;

        let saved = std::mem::replace(&mut self.ns.symbols, symbols);
        let result = FunctionCompiler::new(self.ns, &path).and_then(FunctionCompiler::compile);
        self.ns.symbols = saved;
        result?;

        debug!("instantiated {path} for ({})", args.join(", "));
        let fresh: Vec<FunctionPath> = self
            .ns
            .functions()
            .values()
            .skip(before)
            .filter(|f| f.used)
            .map(|f| f.path.clone())
            .collect();
        self.queue.extend(fresh);
        self.instances.insert(key, path.clone());
        Ok(path)
    }
}

/// Undoes the escaping of marker-like source text in every kept function.
fn restore_source_text(ns: &mut Namespace) -> Result<()> {
    let paths: Vec<FunctionPath> = ns.functions().keys().cloned().collect();
    for path in paths {
        for command in &mut ns.function_mut(&path)?.commands {
            *command = unescape(command);
        }
    }
    Ok(())
}

/// Prepends scoreboard setup to the root's `load` function, creating it
/// if the source defines none.
fn add_prelude(ns: &mut Namespace) -> Result<()> {
    if ns.ints().is_empty() && ns.constants().is_empty() {
        return Ok(());
    }
    let load = ns.options().root_path().child("load");
    if !ns.contains_function(&load) {
        info!("no load function defined; creating {load}");
        ns.register(Function::new(
            load.clone(),
            FunctionKind::Defined,
            0,
            1,
            load.clone(),
        ))?;
    }

    let board = ns.scoreboard();
    let mut prelude = vec![board.summon_carrier()];
    for int in ns.ints() {
        prelude.push(Scoreboard::declare(ns.objective(int)?));
    }
    for (index, &value) in ns.constants().iter().enumerate() {
        let objective = ns.objective(&constant_path(index))?;
        prelude.push(Scoreboard::declare(objective));
        prelude.push(board.set(objective, value));
    }

    let function = ns.function_mut(&load)?;
    prelude.append(&mut function.commands);
    function.commands = prelude;
    function.used = true;
    Ok(())
}

//! The control-flow forking engine.
//!
//! The target has no jumps. Every nested block therefore becomes its own
//! function, named by a fork segment under the function that contains it:
//!
//! | segment | block                                   |
//! |---------|-----------------------------------------|
//! | `eN`    | `if`/`as`/`else`... (implicit execute)  |
//! | `wN`    | `while`/`whilenot`/`loop`               |
//! | `rN`    | `repeat`                                |
//! | `bN`    | remainder of a block after a `break`/`continue` |
//!
//! `break` and `continue` summon a marker object tagged after the loop.
//! Once a nested block may have fired one, the rest of the enclosing block
//! moves into a guard (`b`) fork that only runs while no marker exists,
//! and the chain of guard forks is recorded through
//! [`Function::continuation`](crate::function::Function::continuation) so
//! the loop can re-enter from its last link.

use std::rc::Rc;

use forkpack_foundation::{Error, ErrorKind, ForkCode, FunctionPath, Result};
use log::debug;

use crate::commands::{
    break_tag, continue_tag, guarded, kill_marker, marker_present, summon_marker,
};
use crate::compiler::{Dispatch, FunctionCompiler};
use crate::function::{Function, FunctionKind};
use crate::marker::CallMarker;
use crate::statement::{LoopKind, starts_with_else};

fn marker(path: &FunctionPath) -> String {
    CallMarker::new(path.clone()).render()
}

/// Tag of the marker shared by an `if`/`else` chain, named after its
/// first branch.
fn chain_tag(first: &FunctionPath) -> String {
    format!("{first}.ELSE")
}

impl FunctionCompiler<'_> {
    /// Creates and compiles a fork of the current function for the block
    /// opened at the current line.
    pub(crate) fn fork(&mut self, code: ForkCode) -> Result<FunctionPath> {
        let lines = Rc::clone(&self.lines);
        let (path, start, depth) = if code == ForkCode::Guard {
            let mut start = self.pointer + 1;
            while lines.get(start).is_some_and(|l| l.depth > self.depth) {
                start += 1;
            }
            let path = match (self.path.last_fork(), self.path.parent()) {
                (Some((ForkCode::Guard, n)), Some(parent)) => parent.fork(ForkCode::Guard, n + 1),
                _ => self.path.fork(code, self.counter),
            };
            (path, start, self.depth)
        } else {
            (self.path.fork(code, self.counter), self.pointer + 1, self.depth + 1)
        };
        self.counter += 1;

        let enclosing_loop = if code.is_loop() {
            Some(path.clone())
        } else {
            self.enclosing_loop.clone()
        };
        let function = Function::new(
            path.clone(),
            FunctionKind::Fork(code),
            start,
            depth,
            self.owner.clone(),
        )
        .with_loop(enclosing_loop);
        self.ns.register(function)?;
        debug!("forked {path} from {}", self.path);

        let mut child = FunctionCompiler::new(self.ns, &path)?;
        if code == ForkCode::Guard {
            child.previous = self.previous.clone();
        }
        child.compile()?;
        Ok(path)
    }

    fn flags(&self, path: &FunctionPath) -> Result<(bool, bool)> {
        let function = self.ns.function(path)?;
        Ok((function.has_break, function.has_continue))
    }

    /// After a nested block that may break or continue, moves the rest of
    /// this block into a guard fork.
    fn check_break(&mut self, fork: &FunctionPath) -> Result<()> {
        let Some(lp) = self.enclosing_loop.clone() else {
            return Ok(());
        };
        let (breaks, continues) = self.flags(fork)?;
        if !breaks && !continues {
            return Ok(());
        }

        let mut clauses = Vec::new();
        if breaks {
            self.has_break = true;
            clauses.push(format!("unless {}", marker_present(&break_tag(&lp))));
        }
        if continues {
            self.has_continue = true;
            clauses.push(format!("unless {}", marker_present(&continue_tag(&lp))));
        }

        let guard = self.fork(ForkCode::Guard)?;
        let (guard_breaks, guard_continues) = self.flags(&guard)?;
        if !self.ns.function(&guard)?.commands.is_empty() {
            self.emit(guarded(&clauses, &marker(&guard)))?;
            self.continuation = Some(guard);
        }
        self.has_break |= guard_breaks;
        self.has_continue |= guard_continues;
        Ok(())
    }

    /// `if ...:` and the other implicit `execute` blocks.
    ///
    /// A dispatch that opens an `else` chain first clears the chain's
    /// marker. That line runs on every pass, even when a branch of the
    /// chain breaks out of the rest of the block.
    pub(crate) fn dispatch(&mut self, clauses: &str) -> Result<()> {
        let fork = self.fork(ForkCode::Execute)?;
        let clauses = self.substitute(clauses, true)?;
        let chain_marker = self.chain_continues().then(|| chain_tag(&fork));
        if let Some(chain) = &chain_marker {
            self.emit(kill_marker(chain))?;
        }
        self.flush_aux()?;
        self.emit(format!("execute {clauses} run {}", marker(&fork)))?;
        self.previous = Some(Dispatch {
            fork: fork.clone(),
            chain_marker,
        });
        self.check_break(&fork)
    }

    /// `else [clauses]:`
    ///
    /// Every branch of a chain summons the chain's marker when it runs, and
    /// each `else` only runs while the marker is absent. The last `else`
    /// of the chain kills the marker again.
    pub(crate) fn else_branch(&mut self, clauses: &str) -> Result<()> {
        let previous = self
            .previous
            .take()
            .ok_or_else(|| Error::new(ErrorKind::ElseWithoutDispatch))?;
        let fork = self.fork(ForkCode::Execute)?;
        let chain = previous
            .chain_marker
            .unwrap_or_else(|| chain_tag(&previous.fork));

        let summon = format!(
            "execute unless {} run {}",
            marker_present(&chain),
            summon_marker(&chain)
        );
        self.ns
            .function_mut(&previous.fork)?
            .commands
            .insert(0, summon);

        let clauses = self.substitute(clauses, true)?;
        let mut tests = vec![format!("unless {}", marker_present(&chain))];
        if !clauses.is_empty() {
            tests.push(clauses);
        }
        self.flush_aux()?;
        self.emit(format!("execute {} run {}", tests.join(" "), marker(&fork)))?;
        if !self.chain_continues() {
            self.emit(kill_marker(&chain))?;
        }

        self.previous = Some(Dispatch {
            fork: fork.clone(),
            chain_marker: Some(chain),
        });
        self.check_break(&fork)
    }

    /// Returns true if the next line at this depth is another `else`.
    fn chain_continues(&self) -> bool {
        self.lines
            .iter()
            .skip(self.pointer + 1)
            .find(|line| line.depth <= self.depth)
            .is_some_and(|line| line.depth == self.depth && starts_with_else(&line.text))
    }

    /// `repeat N:`
    pub(crate) fn repeat(&mut self, count: &str) -> Result<()> {
        let times: u32 = count
            .trim()
            .parse()
            .map_err(|_| Error::new(ErrorKind::InvalidNumber(count.to_string())))?;
        let fork = self.fork(ForkCode::Repeat)?;
        let (breaks, continues) = self.flags(&fork)?;

        if continues {
            self.ns
                .function_mut(&fork)?
                .commands
                .insert(0, kill_marker(&continue_tag(&fork)));
        }
        let mut clauses = Vec::new();
        if breaks {
            clauses.push(format!("unless {}", marker_present(&break_tag(&fork))));
        }
        let call = guarded(&clauses, &marker(&fork));
        for _ in 0..times {
            self.emit(call.clone())?;
        }
        self.kill_loop_markers(&fork, breaks, continues)
    }

    /// `while`, `whilenot` and `loop`.
    pub(crate) fn loop_block(&mut self, kind: LoopKind, condition: &str) -> Result<()> {
        if kind != LoopKind::Loop && condition.is_empty() {
            let keyword = if kind == LoopKind::While { "while" } else { "whilenot" };
            return Err(Error::new(ErrorKind::ExpectedExpression(keyword.to_string())));
        }
        let fork = self.fork(ForkCode::While)?;
        let condition = self.substitute(condition, true)?;
        let target = marker(&fork);
        let call = match kind {
            LoopKind::While => format!("execute if {condition} run {target}"),
            LoopKind::WhileNot => format!("execute unless {condition} run {target}"),
            LoopKind::Loop if condition.is_empty() => target,
            LoopKind::Loop => format!("execute {condition} run {target}"),
        };

        let aux = std::mem::take(&mut self.aux);
        for command in &aux {
            self.emit(command.clone())?;
        }
        self.emit(call.clone())?;
        self.close_loop(&fork, &call, &aux)?;

        let (breaks, continues) = self.flags(&fork)?;
        self.kill_loop_markers(&fork, breaks, continues)
    }

    /// Makes a loop body call itself again from the end of its last guard
    /// link, and after a `continue` from its head.
    fn close_loop(&mut self, fork: &FunctionPath, call: &str, aux: &[String]) -> Result<()> {
        let mut tail = fork.clone();
        while let Some(next) = self.ns.function(&tail)?.continuation.clone() {
            tail = next;
        }

        let tail = self.ns.function_mut(&tail)?;
        let mut clauses = Vec::new();
        if tail.has_break {
            clauses.push(format!("unless {}", marker_present(&break_tag(fork))));
        }
        if tail.has_continue {
            clauses.push(format!("unless {}", marker_present(&continue_tag(fork))));
        }
        tail.commands.extend(aux.iter().cloned());
        tail.commands.push(guarded(&clauses, call));

        let head = self.ns.function_mut(fork)?;
        if head.has_continue {
            let tag = continue_tag(fork);
            head.commands.insert(0, kill_marker(&tag));
            head.commands.extend(aux.iter().cloned());
            head.commands
                .push(guarded(&[format!("if {}", marker_present(&tag))], call));
        }
        Ok(())
    }

    fn kill_loop_markers(&mut self, lp: &FunctionPath, breaks: bool, continues: bool) -> Result<()> {
        if breaks {
            self.emit(kill_marker(&break_tag(lp)))?;
        }
        if continues {
            self.emit(kill_marker(&continue_tag(lp)))?;
        }
        Ok(())
    }

    /// `break` and `continue`.
    pub(crate) fn escape(&mut self, is_break: bool) -> Result<()> {
        let Some(lp) = self.enclosing_loop.clone() else {
            let kind = if is_break {
                ErrorKind::BreakOutsideLoop
            } else {
                ErrorKind::ContinueOutsideLoop
            };
            return Err(Error::new(kind));
        };
        if is_break {
            self.has_break = true;
            self.emit(summon_marker(&break_tag(&lp)))
        } else {
            self.has_continue = true;
            self.emit(summon_marker(&continue_tag(&lp)))
        }
    }
}

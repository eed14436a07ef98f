//! Reference substitution and conditional comparisons.
//!
//! Commands are written in the target language with variable names mixed
//! in. Substitution rewrites every word that resolves to a variable:
//!
//! - entity variables become tag selectors (`@e[tag=main.a]`),
//! - integer variables become `<carrier> <objective>` (or a score text
//!   component with `#t`),
//! - string variables become their bound value.
//!
//! In a conditional context, `a < b` style comparisons involving integer
//! variables are lowered to scoreboard range tests first.

use forkpack_foundation::{Error, ErrorKind, Result, VariableKind};

use crate::commands::{Comparison, select};
use crate::compiler::{FunctionCompiler, parse_int};
use crate::lexer::Lexer;
use crate::marker::string_placeholder;
use crate::statement::split_clarifier;
use crate::token::TokenKind;

/// Keywords that may precede a lowered comparison.
const CONDITIONALS: &[&str] = &["if", "unless", "while", "whilenot"];

/// One top-level argument during substitution.
#[derive(Clone, Debug)]
enum Argument {
    /// Source text still to be substituted.
    Source(String),
    /// Generated text, emitted as is.
    Generated(String),
    /// Consumed by a lowered comparison.
    Removed,
}

/// A classified comparison operand.
enum Operand {
    Slot(String),
    Literal(i64),
    Other,
}

impl FunctionCompiler<'_> {
    /// Substitutes every variable reference in `text`.
    ///
    /// With `conditional` set, comparisons are lowered first and any
    /// commands they need are queued in the auxiliary list.
    pub(crate) fn substitute(&mut self, text: &str, conditional: bool) -> Result<String> {
        let mut arguments: Vec<Argument> = Lexer::arguments(text)
            .into_iter()
            .map(Argument::Source)
            .collect();
        if conditional {
            self.lower_comparisons(&mut arguments)?;
        }

        let mut out = Vec::with_capacity(arguments.len());
        for argument in arguments {
            match argument {
                Argument::Source(text) => out.push(self.substitute_words(&text)?),
                Argument::Generated(text) => out.push(text),
                Argument::Removed => {}
            }
        }
        Ok(out.join(" "))
    }

    fn substitute_words(&self, text: &str) -> Result<String> {
        let words = Lexer::words(text);
        let mut out = String::with_capacity(text.len());
        let mut i = 0;
        while let Some(word) = words.get(i) {
            i += 1;
            match word.kind {
                TokenKind::Word => {
                    let Some((replacement, is_entity)) = self.evaluate_word(word.trimmed())? else {
                        out.push_str(&word.text);
                        continue;
                    };
                    // `sel[...]` narrows the selector in place
                    let narrows = is_entity
                        && !word.ends_with_space()
                        && words.get(i).is_some_and(|next| next.is_punct('['));
                    match replacement.strip_suffix(']') {
                        Some(open) if narrows => {
                            out.push_str(open);
                            out.push(',');
                            i += 1;
                        }
                        _ => {
                            out.push_str(&replacement);
                            if word.ends_with_space() {
                                out.push(' ');
                            }
                        }
                    }
                }
                TokenKind::Quoted => match self.quoted_value(word.trimmed()) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&word.text),
                },
                _ => out.push_str(&word.text),
            }
        }
        Ok(out)
    }

    fn quoted_value(&self, content: &str) -> Option<String> {
        let path = self.resolve(content)?;
        if self.ns.kind_of(&path) != Some(VariableKind::String) {
            return None;
        }
        Some(
            self.ns
                .symbols()
                .string_value(&path)
                .map_or_else(|| string_placeholder(&path), String::from),
        )
    }

    /// Evaluates one word, returning its replacement and whether it is an
    /// entity selector. `None` leaves the word untouched.
    fn evaluate_word(&self, word: &str) -> Result<Option<(String, bool)>> {
        let (name, clarifier) = split_clarifier(word);
        if clarifier == Some("v") {
            return Ok(Some((name.to_string(), false)));
        }
        let Some(path) = self.resolve(name) else {
            return Ok(None);
        };
        let unknown = || {
            Error::new(ErrorKind::UnknownClarifier(
                clarifier.unwrap_or_default().to_string(),
            ))
        };

        match self.ns.kind_of(&path) {
            Some(kind @ VariableKind::Entity { .. }) => {
                let (mut player, mut singleton) = (false, false);
                for c in clarifier.unwrap_or_default().chars() {
                    match c {
                        'e' => {}
                        'p' => player = true,
                        '1' => singleton = true,
                        _ => return Err(unknown()),
                    }
                }
                Ok(Some((select(&path, kind.narrowed(player, singleton)), true)))
            }
            Some(VariableKind::Integer) => {
                let board = self.ns.scoreboard();
                let objective = self.ns.objective(&path)?;
                let text = match clarifier {
                    None | Some("") => board.select(objective),
                    Some("t") => board.text(objective),
                    Some(_) => return Err(unknown()),
                };
                Ok(Some((text, false)))
            }
            Some(VariableKind::String) => {
                let value = self
                    .ns
                    .symbols()
                    .string_value(&path)
                    .map_or_else(|| string_placeholder(&path), String::from);
                Ok(Some((value, false)))
            }
            None => Ok(None),
        }
    }

    // =========================================================================
    // Comparisons
    // =========================================================================

    fn operand(&self, argument: &Argument) -> Operand {
        let Argument::Source(text) = argument else {
            return Operand::Other;
        };
        if let Some(path) = self.resolve_int(text) {
            return Operand::Slot(path);
        }
        parse_int(text).map_or(Operand::Other, Operand::Literal)
    }

    fn lower_comparisons(&mut self, arguments: &mut [Argument]) -> Result<()> {
        for i in 1..arguments.len().saturating_sub(1) {
            let Argument::Source(op_text) = &arguments[i] else {
                continue;
            };
            let Some(op) = Comparison::parse(op_text) else {
                continue;
            };
            let text_of = |argument: &Argument| match argument {
                Argument::Source(text) | Argument::Generated(text) => text.clone(),
                Argument::Removed => String::new(),
            };

            let left = self.operand(&arguments[i - 1]);
            let right = self.operand(&arguments[i + 1]);
            match (&left, &right) {
                (Operand::Other, Operand::Other) => continue,
                (Operand::Literal(_), Operand::Literal(_)) => {
                    return Err(Error::new(ErrorKind::ConstantComparison));
                }
                (Operand::Other, _) => {
                    return Err(Error::new(ErrorKind::InvalidComparisonOperand(text_of(
                        &arguments[i - 1],
                    ))));
                }
                (_, Operand::Other) => {
                    return Err(Error::new(ErrorKind::InvalidComparisonOperand(text_of(
                        &arguments[i + 1],
                    ))));
                }
                _ => {}
            }
            if i > 1 {
                let keyword = text_of(&arguments[i - 2]);
                if !CONDITIONALS.contains(&keyword.as_str()) {
                    return Err(Error::new(ErrorKind::ComparisonWithoutConditional));
                }
            }

            let check = match (left, right) {
                (Operand::Slot(slot), Operand::Literal(value)) => {
                    self.ns
                        .scoreboard()
                        .matches(self.ns.objective(&slot)?, &op.range(value))
                }
                (Operand::Literal(value), Operand::Slot(slot)) => self
                    .ns
                    .scoreboard()
                    .matches(self.ns.objective(&slot)?, &op.converse().range(value)),
                (Operand::Slot(lhs), Operand::Slot(rhs)) => self.difference_test(&lhs, &rhs, op)?,
                _ => continue,
            };
            arguments[i - 1] = Argument::Generated(check);
            arguments[i] = Argument::Removed;
            arguments[i + 1] = Argument::Removed;
        }
        Ok(())
    }

    /// Compares two slots through a scratch slot holding `lhs - rhs`.
    fn difference_test(&mut self, lhs: &str, rhs: &str, op: Comparison) -> Result<String> {
        let test = format!("{lhs}.TEST");
        self.ns.add_int(&test);
        let board = self.ns.scoreboard();
        let scratch = self.ns.objective(&test)?;
        self.aux
            .push(board.operation(scratch, "=", self.ns.objective(lhs)?));
        self.aux
            .push(board.operation(scratch, "-=", self.ns.objective(rhs)?));
        Ok(board.matches(scratch, &op.range(0)))
    }
}

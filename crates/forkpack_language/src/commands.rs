//! The target command vocabulary.
//!
//! Every command the compiler generates is built here, so the exact text
//! of tags, markers and scoreboard operations lives in one place.
//!
//! Entity variables are object tags named after the variable's dotted
//! path. Integer variables are scoreboard objectives held by a single
//! persistent carrier object named `<pack>.VARS`. Control-flow state
//! (break, continue, else) is carried by marker objects that are summoned
//! and killed by tag.

use std::fmt;

use forkpack_foundation::{FunctionPath, VariableKind};

use crate::lexer::Lexer;

/// Object type used for control-flow markers.
pub const MARKER_ENTITY: &str = "area_effect_cloud";

/// Prefix of lines that a consumer must never execute.
pub const INERT_PREFIX: &str = "#";

// =============================================================================
// Entities and markers
// =============================================================================

/// `tag <selector> add <tag>`
#[must_use]
pub fn tag_add(selector: &str, tag: &str) -> String {
    format!("tag {selector} add {tag}")
}

/// Removes a tag from every object carrying it.
#[must_use]
pub fn tag_release(tag: &str) -> String {
    format!("tag @e[tag={tag}] remove {tag}")
}

/// Selects the objects carrying `tag`, narrowed by an entity kind.
#[must_use]
pub fn select(tag: &str, kind: VariableKind) -> String {
    let (player, singleton) = match kind {
        VariableKind::Entity { player, singleton } => (player, singleton),
        _ => (false, false),
    };
    let base = if player { 'p' } else { 'e' };
    let limit = if singleton { ",limit=1" } else { "" };
    format!("@{base}[tag={tag}{limit}]")
}

/// Summons a control-flow marker carrying `tag`.
#[must_use]
pub fn summon_marker(tag: &str) -> String {
    format!(
        "summon {MARKER_ENTITY} 0 0 0 {{Age:-2147483648,Duration:-1,WaitTime:-2147483648,Tags:[\"{tag}\"]}}"
    )
}

/// Kills every marker carrying `tag`.
#[must_use]
pub fn kill_marker(tag: &str) -> String {
    format!("kill @e[tag={tag}]")
}

/// The `execute` test clause for "a marker carrying `tag` exists".
#[must_use]
pub fn marker_present(tag: &str) -> String {
    format!("entity @e[tag={tag}]")
}

/// Tag of the marker that records a `break` out of `lp`.
#[must_use]
pub fn break_tag(lp: &FunctionPath) -> String {
    format!("{lp}.BREAK")
}

/// Tag of the marker that records a `continue` in `lp`.
#[must_use]
pub fn continue_tag(lp: &FunctionPath) -> String {
    format!("{lp}.CONTINUE")
}

/// Injects `tag` into the NBT of a `summon` command.
///
/// An existing `Tags` list is extended, otherwise a `Tags` entry is added
/// to the trailing compound, or a new compound is appended.
#[must_use]
pub fn tag_summon(command: &str, tag: &str) -> String {
    let command = command.trim();
    let entry = format!("\"{tag}\"");
    if command.contains("Tags:[]") {
        return command.replacen("Tags:[]", &format!("Tags:[{entry}]"), 1);
    }
    if command.contains("Tags:[") {
        return command.replacen("Tags:[", &format!("Tags:[{entry},"), 1);
    }
    if let Some(open) = command.strip_suffix("{}") {
        return format!("{open}{{Tags:[{entry}]}}");
    }
    if let Some(open) = command.strip_suffix('}') {
        return format!("{open},Tags:[{entry}]}}");
    }
    if Lexer::arguments(command).len() <= 2 {
        return format!("{command} ~ ~ ~ {{Tags:[{entry}]}}");
    }
    format!("{command} {{Tags:[{entry}]}}")
}

// =============================================================================
// Calls
// =============================================================================

/// `function <pack>:<artifact>`
#[must_use]
pub fn call(pack: &str, path: &FunctionPath) -> String {
    format!("function {pack}:{}", path.artifact_name())
}

/// Prefixes a command with `execute` test clauses.
///
/// A command that is already an `execute` absorbs the clauses; any other
/// command is wrapped in `execute ... run`.
#[must_use]
pub fn guarded(clauses: &[String], command: &str) -> String {
    if clauses.is_empty() {
        return command.to_string();
    }
    let clauses = clauses.join(" ");
    match command.strip_prefix("execute ") {
        Some(rest) => format!("execute {clauses} {rest}"),
        None => format!("execute {clauses} run {command}"),
    }
}

/// Returns an inert line recording a skipped command.
#[must_use]
pub fn inert(reason: &str, command: &str) -> String {
    format!("{INERT_PREFIX} {reason}: {command}")
}

/// Returns true for lines a consumer must not execute.
#[must_use]
pub fn is_inert(command: &str) -> bool {
    command.starts_with(INERT_PREFIX)
}

// =============================================================================
// Comparisons
// =============================================================================

/// A relational operator in a conditional.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    /// `==`
    Equal,
    /// `>=`
    AtLeast,
    /// `<=`
    AtMost,
    /// `>`
    Greater,
    /// `<`
    Less,
}

impl Comparison {
    /// Parses an operator argument.
    #[must_use]
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "==" => Some(Self::Equal),
            ">=" => Some(Self::AtLeast),
            "<=" => Some(Self::AtMost),
            ">" => Some(Self::Greater),
            "<" => Some(Self::Less),
            _ => None,
        }
    }

    /// Returns the operator with its operands swapped.
    #[must_use]
    pub const fn converse(self) -> Self {
        match self {
            Self::Equal => Self::Equal,
            Self::AtLeast => Self::AtMost,
            Self::AtMost => Self::AtLeast,
            Self::Greater => Self::Less,
            Self::Less => Self::Greater,
        }
    }

    /// Returns the score range matching `slot <op> value`.
    #[must_use]
    pub fn range(self, value: i64) -> String {
        match self {
            Self::Equal => format!("{value}"),
            Self::AtLeast => format!("{value}.."),
            Self::AtMost => format!("..{value}"),
            Self::Greater => format!("{}..", value + 1),
            Self::Less => format!("..{}", value - 1),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::Equal => "==",
            Self::AtLeast => ">=",
            Self::AtMost => "<=",
            Self::Greater => ">",
            Self::Less => "<",
        };
        write!(f, "{op}")
    }
}

// =============================================================================
// Scoreboard
// =============================================================================

/// Builds scoreboard commands for one pack.
///
/// Objective names passed in are the short names assigned by the
/// namespace, never raw dotted paths.
#[derive(Clone, Copy, Debug)]
pub struct Scoreboard<'a> {
    pack: &'a str,
}

impl<'a> Scoreboard<'a> {
    /// Creates a builder for the given pack.
    #[must_use]
    pub const fn new(pack: &'a str) -> Self {
        Self { pack }
    }

    /// Name of the persistent carrier object.
    #[must_use]
    pub fn carrier_name(&self) -> String {
        format!("{}.VARS", self.pack)
    }

    /// Selector for the carrier object.
    #[must_use]
    pub fn carrier(&self) -> String {
        format!("@e[name={}.VARS,limit=1]", self.pack)
    }

    /// `scoreboard players set`
    #[must_use]
    pub fn set(&self, objective: &str, value: i64) -> String {
        format!("scoreboard players set {} {objective} {value}", self.carrier())
    }

    /// `scoreboard players add`
    #[must_use]
    pub fn add(&self, objective: &str, value: i64) -> String {
        format!("scoreboard players add {} {objective} {value}", self.carrier())
    }

    /// `scoreboard players remove`
    #[must_use]
    pub fn remove(&self, objective: &str, value: i64) -> String {
        format!(
            "scoreboard players remove {} {objective} {value}",
            self.carrier()
        )
    }

    /// `scoreboard players operation` between two slots.
    #[must_use]
    pub fn operation(&self, target: &str, op: &str, source: &str) -> String {
        let carrier = self.carrier();
        format!("scoreboard players operation {carrier} {target} {op} {carrier} {source}")
    }

    /// The `<holder> <objective>` pair naming a slot inside a command.
    #[must_use]
    pub fn select(&self, objective: &str) -> String {
        format!("{} {objective}", self.carrier())
    }

    /// A text component displaying a slot.
    #[must_use]
    pub fn text(&self, objective: &str) -> String {
        format!(
            "{{\"score\":{{\"name\":\"@e[name={}.VARS]\",\"objective\":\"{objective}\"}}}}",
            self.pack
        )
    }

    /// `scoreboard objectives add <objective> dummy`
    #[must_use]
    pub fn declare(objective: &str) -> String {
        format!("scoreboard objectives add {objective} dummy")
    }

    /// Summons the carrier object unless it already exists.
    #[must_use]
    pub fn summon_carrier(&self) -> String {
        format!(
            "execute unless entity @e[name={pack}.VARS] run summon armor_stand 0 0 0 {{Marker:1b,Invisible:1b,NoGravity:1b,CustomName:\"\\\"{pack}.VARS\\\"\"}}",
            pack = self.pack
        )
    }

    /// The `execute` test clause for "slot lies in `range`".
    #[must_use]
    pub fn matches(&self, objective: &str, range: &str) -> String {
        format!(
            "entity @e[name={}.VARS,scores={{{objective}={range}}}]",
            self.pack
        )
    }
}

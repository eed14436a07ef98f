//! Printing of compiled packs.
//!
//! The driver hands the finished pack to a packaging step. Writing the
//! on-disk layout is out of scope, so the listing is the packaging step:
//! a readable text dump, or JSON for tools.

use std::fmt::Write as _;

use forkpack_language::CompiledPack;

use crate::config::CliError;

/// Renders every function as a header followed by its commands.
#[must_use]
pub fn render_text(pack: &CompiledPack) -> String {
    let mut out = String::new();
    for (name, commands) in pack.artifacts() {
        let _ = writeln!(out, "=== {}:{name} ({} commands) ===", pack.pack, commands.len());
        for command in commands {
            let _ = writeln!(out, "{command}");
        }
        out.push('\n');
    }
    if !pack.slots.is_empty() {
        out.push_str("=== scoreboard slots ===\n");
        for (path, objective) in &pack.slots {
            let _ = writeln!(out, "{path} -> {objective}");
        }
    }
    out
}

/// Renders the pack as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(pack: &CompiledPack) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(pack)?)
}

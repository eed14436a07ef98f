//! Deferred call markers.
//!
//! While compiling, a call to another function is not yet final: the
//! callee may end up with one command (and be inlined), with none (and be
//! skipped) or may need a string instance first. The compiler therefore
//! emits a marker `!f{path}{arg}...` in place of the call, always as the
//! last thing on its line, and the linker rewrites it.
//!
//! String symbols with no value bound at compile time become `!s{path}`
//! placeholders. None may survive linking.
//!
//! Source text that happens to read as a marker is escaped on the way in
//! ([`escape_source`]) and restored once linking is done ([`unescape`]).

use forkpack_foundation::FunctionPath;

/// Opening of a deferred call marker.
pub const CALL_PREFIX: &str = "!f";

/// Opening of an unbound string placeholder.
pub const STRING_PREFIX: &str = "!s{";

/// Inserted after the `!` of marker-like source text.
const ESCAPE: char = '\u{1}';

/// A deferred call to a function, with any string arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallMarker {
    /// The function being called.
    pub target: FunctionPath,
    /// String-literal arguments, in parameter order.
    pub args: Vec<String>,
}

impl CallMarker {
    /// Creates a marker with no string arguments.
    #[must_use]
    pub fn new(target: FunctionPath) -> Self {
        Self {
            target,
            args: Vec::new(),
        }
    }

    /// Creates a marker carrying string arguments.
    #[must_use]
    pub fn with_args(target: FunctionPath, args: Vec<String>) -> Self {
        Self { target, args }
    }

    /// Renders the marker text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!("{CALL_PREFIX}{{{}}}", self.target);
        for arg in &self.args {
            out.push('{');
            for c in arg.chars() {
                if matches!(c, '{' | '}' | '\\') {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push('}');
        }
        out
    }

    /// Finds the first marker in a line.
    ///
    /// Returns the byte offset where the marker starts, the marker, and the
    /// byte offset just past its end.
    #[must_use]
    pub fn find(line: &str) -> Option<(usize, Self, usize)> {
        let start = line.find("!f{")?;
        let mut groups = Vec::new();
        let mut rest = line[start + CALL_PREFIX.len()..].char_indices().peekable();
        let mut end = start + CALL_PREFIX.len();

        while let Some(&(_, '{')) = rest.peek() {
            rest.next();
            let mut group = String::new();
            let mut closed = false;
            while let Some((offset, c)) = rest.next() {
                match c {
                    '\\' => {
                        if let Some((_, escaped)) = rest.next() {
                            group.push(escaped);
                        }
                    }
                    '}' => {
                        end = start + CALL_PREFIX.len() + offset + 1;
                        closed = true;
                        break;
                    }
                    other => group.push(other),
                }
            }
            if !closed {
                return None;
            }
            groups.push(group);
        }

        let mut groups = groups.into_iter();
        let target = FunctionPath::parse(&groups.next()?);
        Some((start, Self::with_args(target, groups.collect()), end))
    }
}

/// Renders the placeholder for an unbound string symbol.
#[must_use]
pub fn string_placeholder(path: &str) -> String {
    format!("{STRING_PREFIX}{path}}}")
}

/// Returns the path of the first unbound string placeholder in a line.
#[must_use]
pub fn find_string_placeholder(line: &str) -> Option<&str> {
    let start = line.find(STRING_PREFIX)? + STRING_PREFIX.len();
    let len = line[start..].find('}')?;
    Some(&line[start..start + len])
}

/// Escapes source text so that neither [`CallMarker::find`] nor
/// [`find_string_placeholder`] matches it.
#[must_use]
pub fn escape_source(text: &str) -> String {
    if !text.contains('!') {
        return text.to_string();
    }
    text.replace("!f{", "!\u{1}f{").replace(STRING_PREFIX, "!\u{1}s{")
}

/// Restores text escaped by [`escape_source`].
#[must_use]
pub fn unescape(text: &str) -> String {
    text.replace(ESCAPE, "")
}

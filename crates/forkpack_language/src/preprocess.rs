//! Line preprocessing.
//!
//! Strips comments and blank lines, measures each line's indentation depth
//! and yields the ordered [`SourceLine`] records the function compiler
//! walks.

use forkpack_foundation::{Error, ErrorContext, ErrorKind, Result};

use crate::lexer::Lexer;
use crate::marker::escape_source;

/// One significant line of source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLine {
    /// Block nesting level.
    pub depth: usize,
    /// Line content without indentation or trailing comment.
    pub text: String,
    /// 1-based line number in its source file.
    pub line: usize,
    /// Index of the source file this line came from.
    pub source: usize,
}

impl SourceLine {
    /// Creates a new source line record.
    #[must_use]
    pub fn new(depth: usize, text: impl Into<String>, line: usize, source: usize) -> Self {
        Self {
            depth,
            text: text.into(),
            line,
            source,
        }
    }
}

/// Returns the indent unit of a file: the leading-space count of its first
/// space-indented line, or `default` if no line is indented with spaces.
#[must_use]
pub fn detect_indent(text: &str, default: usize) -> usize {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|&c| c == ' ').count())
        .find(|&spaces| spaces > 0)
        .unwrap_or(default)
        .max(1)
}

/// Measures the depth of a line given the file's indent unit.
///
/// Tabs count one level each. Returns `None` if the spaces are not a
/// multiple of the unit.
#[must_use]
pub fn indent_depth(line: &str, unit: usize) -> Option<usize> {
    let mut tabs = 0;
    let mut spaces = 0;
    for c in line.chars() {
        match c {
            '\t' => tabs += 1,
            ' ' => spaces += 1,
            _ => break,
        }
    }
    let unit = unit.max(1);
    (spaces % unit == 0).then_some(tabs + spaces / unit)
}

/// Removes a trailing comment from a line.
///
/// Returns `None` when the whole line is a comment. A comment starts at an
/// argument that begins with `#` in first position, or at any argument
/// that is exactly `#`.
#[must_use]
pub fn strip_comment(text: &str) -> Option<String> {
    let arguments = Lexer::arguments(text);
    match arguments.first() {
        None => return Some(String::new()),
        Some(first) if first.starts_with('#') => return None,
        Some(_) => {}
    }
    match arguments.iter().position(|a| a == "#") {
        Some(cut) => Some(arguments[..cut].join(" ")),
        None => Some(text.trim().to_string()),
    }
}

/// Preprocesses one source file.
///
/// # Errors
///
/// Returns [`ErrorKind::UnknownIndentation`] for a line whose leading
/// spaces are not a multiple of the detected indent unit.
pub fn preprocess(text: &str, default_indent: usize, source: usize) -> Result<Vec<SourceLine>> {
    let unit = detect_indent(text, default_indent);
    let mut lines = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let Some(content) = strip_comment(raw) else {
            continue;
        };
        if content.is_empty() {
            continue;
        }

        let Some(depth) = indent_depth(raw, unit) else {
            return Err(Error::new(ErrorKind::UnknownIndentation)
                .with_context(ErrorContext::new().with_line(index + 1, raw.trim())));
        };
        lines.push(SourceLine::new(depth, escape_source(&content), index + 1, source));
    }

    Ok(lines)
}

//! Compilation options.

use forkpack_foundation::FunctionPath;

/// Options controlling one compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    /// Pack identifier, used in calls and the scoreboard carrier name.
    pub pack: String,
    /// Name of the root function.
    pub root: String,
    /// Maximum length of a scoreboard objective name.
    pub slot_name_limit: usize,
    /// Indent unit for files with no space-indented line.
    pub default_indent: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            pack: "pack".to_string(),
            root: "main".to_string(),
            slot_name_limit: 16,
            default_indent: 4,
        }
    }
}

impl CompileOptions {
    /// Creates options for the given pack with default settings.
    #[must_use]
    pub fn new(pack: impl Into<String>) -> Self {
        Self {
            pack: pack.into(),
            ..Self::default()
        }
    }

    /// Sets the root function name.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Sets the objective name limit.
    #[must_use]
    pub fn with_slot_name_limit(mut self, limit: usize) -> Self {
        self.slot_name_limit = limit.max(1);
        self
    }

    /// Sets the fallback indent unit.
    #[must_use]
    pub fn with_default_indent(mut self, indent: usize) -> Self {
        self.default_indent = indent.max(1);
        self
    }

    /// Returns the root function path.
    #[must_use]
    pub fn root_path(&self) -> FunctionPath {
        FunctionPath::root(self.root.clone())
    }
}

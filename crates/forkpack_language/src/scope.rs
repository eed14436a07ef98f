//! The scope-chain symbol table.
//!
//! A single table maps fully-qualified dotted paths to variable kinds for
//! the whole namespace. Scoping comes from the keys themselves: a name is
//! resolved by trying each prefix of the current function path, innermost
//! first (see [`FunctionPath::candidates`]).
//!
//! The maps are persistent (`im`), so the snapshot a string-parameterized
//! function keeps for later instantiation is a cheap clone.

use forkpack_foundation::{FunctionPath, VariableKind};
use im::HashMap;

/// Symbol table shared by every function of a namespace.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    /// Declared kind for each dotted path.
    kinds: HashMap<String, VariableKind>,
    /// Bound compile-time values for string symbols.
    strings: HashMap<String, String>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares (or redeclares) a symbol.
    pub fn declare(&mut self, path: impl Into<String>, kind: VariableKind) {
        self.kinds.insert(path.into(), kind);
    }

    /// Declares a string symbol bound to a literal value.
    pub fn bind_string(&mut self, path: impl Into<String>, value: impl Into<String>) {
        let path = path.into();
        self.kinds.insert(path.clone(), VariableKind::String);
        self.strings.insert(path, value.into());
    }

    /// Returns the kind of a fully-qualified symbol.
    #[must_use]
    pub fn kind(&self, path: &str) -> Option<VariableKind> {
        self.kinds.get(path).copied()
    }

    /// Returns true if the symbol is declared.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.kinds.contains_key(path)
    }

    /// Returns the bound value of a string symbol.
    #[must_use]
    pub fn string_value(&self, path: &str) -> Option<&str> {
        self.strings.get(path).map(String::as_str)
    }

    /// Removes a symbol and any bound value.
    pub fn remove(&mut self, path: &str) -> Option<VariableKind> {
        self.strings.remove(path);
        self.kinds.remove(path)
    }

    /// Resolves `name` from `scope`, innermost scope first.
    #[must_use]
    pub fn resolve(&self, scope: &FunctionPath, name: &str) -> Option<String> {
        if name.is_empty() {
            return None;
        }
        scope.candidates(name).find(|path| self.contains(path))
    }

    /// Returns the number of declared symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Returns true if no symbols are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

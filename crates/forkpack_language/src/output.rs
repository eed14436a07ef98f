//! The linked result of a compilation.

use forkpack_foundation::FunctionPath;
use indexmap::IndexMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::namespace::Namespace;

/// Final command lists of every retained function.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompiledPack {
    /// Pack identifier.
    pub pack: String,
    /// Name of the root function.
    pub root: String,
    /// Commands by dotted function path, in registration order.
    pub functions: IndexMap<String, Vec<String>>,
    /// Objective name by integer slot path.
    pub slots: IndexMap<String, String>,
}

impl CompiledPack {
    /// Collects the functions of a linked namespace.
    #[must_use]
    pub fn from_namespace(ns: &Namespace) -> Self {
        Self {
            pack: ns.pack().to_string(),
            root: ns.options().root.clone(),
            functions: ns
                .functions()
                .values()
                .map(|f| (f.path.to_string(), f.commands.clone()))
                .collect(),
            slots: ns.slots().clone(),
        }
    }

    /// Returns the commands of a function by dotted path.
    #[must_use]
    pub fn function(&self, path: &str) -> Option<&[String]> {
        self.functions.get(path).map(Vec::as_slice)
    }

    /// Returns `(artifact name, commands)` for every function.
    ///
    /// The artifact name is the path without its root segment; it is what
    /// `function <pack>:<name>` calls refer to.
    pub fn artifacts(&self) -> impl Iterator<Item = (String, &[String])> + '_ {
        self.functions
            .iter()
            .map(|(path, commands)| (FunctionPath::parse(path).artifact_name(), commands.as_slice()))
    }

    /// Returns the `load` function's commands, if any.
    #[must_use]
    pub fn load(&self) -> Option<&[String]> {
        self.function(&format!("{}.load", self.root))
    }

    /// Returns the `tick` function's commands, if any.
    #[must_use]
    pub fn tick(&self) -> Option<&[String]> {
        self.function(&format!("{}.tick", self.root))
    }

    /// Returns the objective name of an integer slot.
    #[must_use]
    pub fn objective(&self, path: &str) -> Option<&str> {
        self.slots.get(path).map(String::as_str)
    }

    /// Returns the number of functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns true if no function survived linking.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

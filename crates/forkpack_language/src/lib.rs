//! Lexer, preprocessor, function compiler, forking engine, and linker for
//! forkpack.
//!
//! This crate provides:
//! - [`Lexer`] - Tokenization of single source lines
//! - [`preprocess`] - Indentation and comment handling
//! - [`Namespace`] - The compilation context and function arena
//! - [`FunctionCompiler`] - Lowering of one function body to commands
//! - [`link`] - Call resolution, inlining, pruning, and the load prelude
//! - [`CompiledPack`] - The linked output
//!
//! # Example
//!
//! ```
//! use forkpack_language::{CompileOptions, compile};
//!
//! let pack = compile(CompileOptions::new("demo"), "b = 5\nb += 3").unwrap();
//! assert_eq!(pack.function("main").unwrap().len(), 2);
//! assert!(pack.load().is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod commands;
pub mod compiler;
mod expr;
mod fork;
pub mod function;
pub mod lexer;
pub mod linker;
pub mod marker;
pub mod namespace;
pub mod options;
pub mod output;
pub mod preprocess;
pub mod scope;
pub mod statement;
pub mod token;


pub use compiler::FunctionCompiler;
pub use function::{Definition, Function, FunctionKind, Param};
pub use lexer::Lexer;
pub use linker::link;
pub use marker::CallMarker;
pub use namespace::Namespace;
pub use options::CompileOptions;
pub use output::CompiledPack;
pub use preprocess::{SourceLine, preprocess};
pub use scope::SymbolTable;
pub use statement::Statement;
pub use token::{Token, TokenKind};

use forkpack_foundation::Result;

/// Compiles and links a single source text.
///
/// # Errors
///
/// Returns the first preprocessing, compilation, or linking error.
pub fn compile(options: CompileOptions, source: &str) -> Result<CompiledPack> {
    compile_sources(options, &[("", source)])
}

/// Compiles and links several named sources as one body, in order.
///
/// # Errors
///
/// Returns the first preprocessing, compilation, or linking error.
pub fn compile_sources(options: CompileOptions, sources: &[(&str, &str)]) -> Result<CompiledPack> {
    let mut namespace = Namespace::new(options);
    for (name, text) in sources {
        namespace.add_source(*name, text)?;
    }
    namespace.compile()?;
    namespace.link()
}

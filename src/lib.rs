//! forkpack - Compiler from indented scripts to command functions
//!
//! This crate re-exports all layers of the forkpack system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: forkpack_runtime: CLI driver, logging backend, listings
//! Layer 1: forkpack_language: Lexer, preprocessor, compiler, forking, linker
//! Layer 0: forkpack_foundation: Core types (Error, VariableKind, FunctionPath)
//! ```

pub use forkpack_foundation as foundation;
pub use forkpack_language as language;
pub use forkpack_runtime as runtime;

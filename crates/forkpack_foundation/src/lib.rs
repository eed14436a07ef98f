//! Core types shared by every forkpack layer.
//!
//! This crate provides:
//! - [`Error`] - Compilation errors with source-line context
//! - [`VariableKind`] - The kinds a source variable can take
//! - [`FunctionPath`] - Dotted function identities and scope keys
//! - [`ForkCode`] - Codes for synthetic control-flow functions

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod kind;
pub mod path;

pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use kind::VariableKind;
pub use path::{ForkCode, FunctionPath};

//! Command-line driver, logging backend, and listings for forkpack.
//!
//! This crate provides:
//! - [`CliConfig`] - Argument parsing
//! - [`logger`] - A stderr backend for the `log` facade
//! - [`listing`] - Text and JSON rendering of compiled packs
//! - [`run`] - Reading, compiling, and rendering a set of source files

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod listing;
pub mod logger;

pub use config::{CliConfig, CliError};

use std::fs;

use forkpack_language::{CompiledPack, Namespace};
use log::info;

/// Reads and compiles every file named by the configuration.
///
/// # Errors
///
/// Returns an error if no files are given, a file cannot be read, or
/// compilation fails.
pub fn compile_files(config: &CliConfig) -> Result<CompiledPack, CliError> {
    if config.files.is_empty() {
        return Err(CliError::NoSources);
    }
    let mut namespace = Namespace::new(config.compile_options());
    for path in &config.files {
        let text = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.clone(),
            source,
        })?;
        namespace.add_source(path.display().to_string(), &text)?;
    }
    namespace.compile()?;
    let pack = namespace.link()?;
    info!(
        "compiled {} files into {} functions",
        config.files.len(),
        pack.len()
    );
    Ok(pack)
}

/// Compiles the configured files and renders the listing.
///
/// # Errors
///
/// Returns the first read, compile, or rendering error.
pub fn run(config: &CliConfig) -> Result<String, CliError> {
    let pack = compile_files(config)?;
    if config.json {
        listing::render_json(&pack)
    } else {
        Ok(listing::render_text(&pack))
    }
}

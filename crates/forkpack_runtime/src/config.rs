//! Command-line configuration.

use std::path::{Path, PathBuf};

use forkpack_language::CompileOptions;
use log::LevelFilter;
use thiserror::Error;

/// Errors raised by the driver.
#[derive(Debug, Error)]
pub enum CliError {
    /// An option that takes a value was given none.
    #[error("{0} requires a value")]
    MissingValue(String),

    /// An unrecognized option.
    #[error("unknown option: {0}")]
    UnknownOption(String),

    /// Nothing to compile.
    #[error("no source files given (try --help)")]
    NoSources,

    /// A source file could not be read.
    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Compilation failed.
    #[error(transparent)]
    Compile(#[from] forkpack_foundation::Error),

    /// The JSON listing could not be produced.
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// CLI configuration parsed from arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Source files, compiled in order as one body.
    pub files: Vec<PathBuf>,
    /// Pack identifier; defaults to the first file's stem.
    pub pack: Option<String>,
    /// Root function name.
    pub root: Option<String>,
    /// Number of `-v` flags.
    pub verbosity: u8,
    /// Print the compiled pack as JSON.
    pub json: bool,
    /// Print help and exit.
    pub show_help: bool,
    /// Print the version and exit.
    pub show_version: bool,
}

impl CliConfig {
    /// Parses arguments, the program name included.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown options or missing option values.
    pub fn parse_args(args: Vec<String>) -> Result<Self, CliError> {
        let mut config = Self::default();
        let mut args = args.into_iter().skip(1);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => config.show_help = true,
                "-V" | "--version" => config.show_version = true,
                "-v" | "--verbose" => config.verbosity = config.verbosity.saturating_add(1),
                "--json" => config.json = true,
                "-p" | "--pack" => {
                    let value = args
                        .next()
                        .ok_or_else(|| CliError::MissingValue(arg.clone()))?;
                    config.pack = Some(value);
                }
                "-r" | "--root" => {
                    let value = args
                        .next()
                        .ok_or_else(|| CliError::MissingValue(arg.clone()))?;
                    config.root = Some(value);
                }
                option if option.starts_with('-') && option.len() > 1 => {
                    return Err(CliError::UnknownOption(arg.clone()));
                }
                _ => config.files.push(PathBuf::from(arg)),
            }
        }

        Ok(config)
    }

    /// Returns the log level selected by `-v` flags.
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Builds the compile options for this run.
    #[must_use]
    pub fn compile_options(&self) -> CompileOptions {
        let pack = self
            .pack
            .clone()
            .or_else(|| self.files.first().and_then(|f| pack_name(f)))
            .unwrap_or_else(|| CompileOptions::default().pack);
        let options = CompileOptions::new(pack);
        match &self.root {
            Some(root) => options.with_root(root.clone()),
            None => options,
        }
    }
}

/// Derives a pack identifier from a file name.
fn pack_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?.to_ascii_lowercase();
    let name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    (!name.is_empty()).then_some(name)
}

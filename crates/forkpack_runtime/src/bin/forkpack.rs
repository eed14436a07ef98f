//! forkpack CLI entry point.

use std::env;
use std::process::ExitCode;

use forkpack_runtime::{CliConfig, CliError, logger};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), CliError> {
    let config = CliConfig::parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(());
    }

    if config.show_version {
        println!("forkpack {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if logger::init(config.log_level()).is_err() {
        eprintln!("\x1b[33mwarning: logger already installed\x1b[0m");
    }

    let listing = forkpack_runtime::run(&config)?;
    print!("{listing}");
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mforkpack\x1b[0m - Compile indented scripts into command functions

\x1b[1mUSAGE:\x1b[0m
    forkpack [OPTIONS] FILES...

\x1b[1mARGUMENTS:\x1b[0m
    FILES...    Source files, compiled in order as one body

\x1b[1mOPTIONS:\x1b[0m
    -h, --help         Print help information
    -V, --version      Print version information
    -p, --pack NAME    Pack identifier (default: first file's stem)
    -r, --root NAME    Root function name (default: main)
    -v, --verbose      Log more (repeat for debug and trace output)
    --json             Print the compiled pack as JSON

\x1b[1mEXAMPLES:\x1b[0m
    forkpack game.fp                 List the functions of game.fp
    forkpack -p demo a.fp b.fp       Compile two files as pack demo
    forkpack -vv --json game.fp      JSON output with debug logging"
    );
}

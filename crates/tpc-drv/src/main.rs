//! tpc - Turbo Pascal 7 to C++17 transpiler, command-line front end.
//!
//! Parses arguments with clap, initialises logging, and hands a
//! [`Config`] to the driver. Exit codes: 0 on a successful link (or a
//! clean debug dump), 1 on any front-end, back-end or usage error.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tpc_drv::Config;

/// Compile a Turbo Pascal program to a native executable.
#[derive(Parser, Debug)]
#[command(name = "tpc")]
#[command(version)]
#[command(about = "Turbo Pascal 7 to C++17 transpiler", long_about = None)]
struct Cli {
    /// Input Pascal source file
    input: PathBuf,

    /// Output executable path
    #[arg(short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Retain the intermediate C++ translation unit
    #[arg(long = "keep-cpp")]
    keep_cpp: bool,

    /// Verbose progress to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Print the token stream to stdout and stop
    #[arg(long)]
    tokens: bool,

    /// Print the AST to stdout and stop
    #[arg(long)]
    ast: bool,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and version are successful outcomes; everything else
            // is a usage error and exits 1.
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    print!("{}", err);
                    ExitCode::SUCCESS
                }
                _ => {
                    eprint!("{}", err);
                    ExitCode::from(1)
                }
            };
        }
    };

    init_logging(cli.verbose);

    let config = Config {
        input: cli.input,
        output: cli.output,
        keep_cpp: cli.keep_cpp,
        verbose: cli.verbose,
        dump_tokens: cli.tokens,
        dump_ast: cli.ast,
    };

    ExitCode::from(tpc_drv::run(config) as u8)
}

/// Progress lines go through tracing to stderr; `-v` raises the filter
/// to debug.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}

//! Jack Compiler CLI
//!
//! Command-line interface for compiling .jack programs to Hack VM code.

use clap::Parser as ClapParser;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "jackc")]
#[command(about = "Jack compiler - compile .jack programs to Hack VM code", long_about = None)]
struct Cli {
    /// Input .jack source file, or a directory containing .jack files
    input: PathBuf,

    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match jackc::compile_path(&cli.input) {
        Ok(outputs) => {
            for output_path in &outputs {
                let source_path = output_path.with_extension("jack");
                println!("Compiled {} -> {}", source_path.display(), output_path.display());
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

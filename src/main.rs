//! arena-supervisor binary entry point.

use std::io::Write;
use std::process::ExitCode;

use arena_supervisor::cli::{Cli, execute};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v flags.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match execute(&cli) {
        Ok(output) => {
            if !output.is_empty() {
                let mut stdout = std::io::stdout().lock();
                let _ = write!(stdout, "{output}");
                if !output.ends_with('\n') {
                    let _ = writeln!(stdout);
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            let _ = writeln!(std::io::stderr().lock(), "Error: {e}");
            ExitCode::FAILURE
        }
    }
}

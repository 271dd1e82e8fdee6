//! Main entry point for the deepunzip CLI application.

use clap::Parser;
use std::process::ExitCode;

use deepunzip::{Cli, logging};

/// Exit status when `--strict` is set and some archive failed.
const EXIT_INCOMPLETE: u8 = 2;

/// Runs on a single thread; archives are processed strictly one after another.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_cli_logger(cli.log_level());

    let options = cli.to_options();
    let report = match deepunzip::run(&options).await {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if !cli.is_quiet() {
        println!(
            "Extraction complete. Files extracted to: {}",
            report.destination.display()
        );
        println!("{report}");
    }

    if cli.strict && report.has_failures() {
        ExitCode::from(EXIT_INCOMPLETE)
    } else {
        ExitCode::SUCCESS
    }
}

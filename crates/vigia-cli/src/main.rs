//! Vigia CLI: end-to-end checks from the command line
//!
//! ## Usage
//!
//! ```bash
//! vigia run                              # Run both suites
//! vigia run --suite api --tag crud       # CRUD checks only
//! vigia run --format json -o report.json # Machine-readable report
//! vigia list --suite storefront          # Show scenarios
//! vigia config                           # Show resolved configuration
//! ```

use clap::Parser;
use std::process::ExitCode;
use vigia_cli::{Cli, CliResult, Commands, ProgressReporter};

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run() -> CliResult<bool> {
    let cli = Cli::parse();
    vigia::logging::init(cli.log_level(), cli.log_json);
    let mut reporter = ProgressReporter::new(cli.color.should_color(), cli.quiet);

    match cli.command {
        Commands::Run(args) => vigia_cli::run(&args, &mut reporter),
        Commands::List(args) => {
            print!("{}", vigia_cli::list(&args)?);
            Ok(true)
        }
        Commands::Config(args) => {
            print!("{}", vigia_cli::show_config(args.config.as_deref())?);
            Ok(true)
        }
    }
}

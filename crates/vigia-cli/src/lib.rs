//! Vigia CLI library
//!
//! Command-line front end for the bundled JSONPlaceholder and Demoblaze
//! scenarios: argument parsing, progress output and report handling.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod error;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, FormatArg, ListArgs, RunArgs, SuiteArg};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
pub use runner::{build_runner, execute, list, load_config, run, show_config};

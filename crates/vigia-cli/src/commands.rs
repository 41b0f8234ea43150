//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use vigia::reporter::ReportFormat;
use vigia::suites::Suite;

/// Vigia: end-to-end checks for the JSONPlaceholder API and the Demoblaze storefront
#[derive(Parser, Debug)]
#[command(name = "vigia")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true, env = "VIGIA_LOG_JSON")]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log verbosity: `-q` drops to errors only, each `-v` adds a level
    #[must_use]
    pub const fn log_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios
    Run(RunArgs),

    /// List scenarios without running them
    List(ListArgs),

    /// Show the resolved configuration
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Which suite to run
    #[arg(short, long, default_value = "all")]
    pub suite: SuiteArg,

    /// Only run scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Only run scenarios with this tag (repeatable, any match)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Skip remaining scenarios after the first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Report format
    #[arg(long, default_value = "text")]
    pub format: FormatArg,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file (overrides VIGIA_CONFIG)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Which suite to list
    #[arg(short, long, default_value = "all")]
    pub suite: SuiteArg,

    /// Only list scenarios with this tag (repeatable, any match)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration file (overrides VIGIA_CONFIG)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Suite selection
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SuiteArg {
    /// JSONPlaceholder REST scenarios
    Api,
    /// Demoblaze UI scenarios
    #[value(alias = "ui")]
    Storefront,
    /// Both suites
    #[default]
    All,
}

impl From<SuiteArg> for Suite {
    fn from(arg: SuiteArg) -> Self {
        match arg {
            SuiteArg::Api => Self::Api,
            SuiteArg::Storefront => Self::Storefront,
            SuiteArg::All => Self::All,
        }
    }
}

/// Report format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON summary
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Auto-detect
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorArg {
    /// Whether output should be colored
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::colors_enabled_stderr(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod parsing {
        use super::*;

        #[test]
        fn test_run_defaults() {
            let cli = Cli::try_parse_from(["vigia", "run"]).unwrap();
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(args.suite, SuiteArg::All);
            assert_eq!(args.format, FormatArg::Text);
            assert!(args.tags.is_empty());
            assert!(!args.fail_fast);
            assert!(args.output.is_none());
        }

        #[test]
        fn test_run_all_options() {
            let cli = Cli::try_parse_from([
                "vigia",
                "-vv",
                "run",
                "--suite",
                "api",
                "--filter",
                "post",
                "--tag",
                "crud",
                "--tag",
                "@smoke",
                "--fail-fast",
                "--format",
                "json",
                "--output",
                "out/report.json",
                "--config",
                "vigia.yaml",
            ])
            .unwrap();
            assert_eq!(cli.verbose, 2);
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(args.suite, SuiteArg::Api);
            assert_eq!(args.filter.as_deref(), Some("post"));
            assert_eq!(args.tags, vec!["crud", "@smoke"]);
            assert!(args.fail_fast);
            assert_eq!(args.format, FormatArg::Json);
            assert_eq!(args.output, Some(PathBuf::from("out/report.json")));
            assert_eq!(args.config, Some(PathBuf::from("vigia.yaml")));
        }

        #[test]
        fn test_ui_alias() {
            let cli = Cli::try_parse_from(["vigia", "list", "--suite", "ui"]).unwrap();
            let Commands::List(args) = cli.command else {
                panic!("expected list");
            };
            assert_eq!(Suite::from(args.suite), Suite::Storefront);
        }

        #[test]
        fn test_unknown_suite_rejected() {
            assert!(Cli::try_parse_from(["vigia", "run", "--suite", "mobile"]).is_err());
        }

        #[test]
        fn test_subcommand_required() {
            assert!(Cli::try_parse_from(["vigia"]).is_err());
        }
    }

    mod levels {
        use super::*;

        #[test]
        fn test_quiet_wins() {
            let cli = Cli::try_parse_from(["vigia", "-q", "-vvv", "config"]).unwrap();
            assert_eq!(cli.log_level(), 0);
        }

        #[test]
        fn test_default_is_warn() {
            let cli = Cli::try_parse_from(["vigia", "config"]).unwrap();
            assert_eq!(cli.log_level(), 1);
            assert_eq!(vigia::logging::level_for(cli.log_level()), "warn");
        }

        #[test]
        fn test_color_never() {
            assert!(!ColorArg::Never.should_color());
            assert!(ColorArg::Always.should_color());
        }
    }
}

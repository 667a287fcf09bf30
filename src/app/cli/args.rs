//! Command-line arguments
//!
//! Every flag is optional; unset flags fall back to the configuration file
//! and then to built-in defaults.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "sastbench")]
#[command(about = "Run SAST scanners over a repository benchmark and merge their SARIF results")]
#[command(version)]
#[command(after_help = " * can be specified multiple times or as a comma-separated list")]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Maximum number of concurrent fetch and scan tasks
    #[arg(short = 'w', long = "max-workers", value_name = "COUNT")]
    pub max_workers: Option<usize>,

    /// Per-task deadline in seconds
    #[arg(short = 't', long = "task-timeout", value_name = "SECONDS")]
    pub task_timeout: Option<u64>,

    /// Run only these runners*
    #[arg(short = 'r', long = "runner", value_name = "NAMES", action = ArgAction::Append, value_delimiter = ',')]
    pub runners: Vec<String>,

    /// Reuse existing working copies instead of fetching
    #[arg(long = "skip-fetch")]
    pub skip_fetch: bool,

    /// Skip fetch and scan; rebuild the report from existing results
    #[arg(long = "report-only", conflicts_with_all = ["skip_fetch", "runners"])]
    pub report_only: bool,

    /// Report template file or http(s) URL
    #[arg(short = 'T', long = "template", value_name = "FILE|URL")]
    pub template: Option<String>,

    /// HTML report file name, written inside the results directory
    #[arg(long = "report-file", value_name = "FILE")]
    pub report_file: Option<String>,

    /// Also write the aggregated findings as JSON
    #[arg(short = 'j', long = "json", value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Force colored output
    #[arg(long = "color", conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// More log output (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Less log output (repeatable)
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, conflicts_with = "verbose")]
    pub quiet: u8,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Net verbosity: positive is more verbose
    pub fn verbosity(&self) -> i8 {
        let verbose = self.verbose.min(i8::MAX as u8) as i8;
        let quiet = self.quiet.min(i8::MAX as u8) as i8;
        verbose - quiet
    }

    /// Explicit color choice from flags; `None` means decide by TTY
    pub fn color_choice(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

pub mod commands;

use std::path::PathBuf;

use clap::Parser;

use crate::cli::commands::INTERRUPTED_EXIT_STATUS;
use crate::config::endpoints::ENDPOINTS_EXAMPLE;
use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "mergefeeds", version)]
#[command(about = "Merge paginated location feeds into one deduplicated JSON file", long_about = None)]
#[command(after_help = after_help())]
pub struct Cli {
    /// JSON file containing base URL and authorization token for each feed
    #[arg(long, value_name = "FILE", default_value = "endpoints.json")]
    pub tokens: PathBuf,

    /// Settings file (default: ~/.config/mergefeeds/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path and query appended to each base URL for the first page
    #[arg(long, value_name = "SUFFIX")]
    pub path: Option<String>,

    /// Directory for the merged output and the error log
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Log file (truncated on start)
    #[arg(long, value_name = "FILE", default_value = "mergefeeds.log")]
    pub log_file: PathBuf,

    /// Per-feed counts, duplicate report, and debug-level logging
    #[arg(short, long)]
    pub debug: bool,

    /// Informational progress messages
    #[arg(short, long)]
    pub verbose: bool,

    /// No log output on stdout (the log file still gets everything)
    #[arg(short, long)]
    pub quiet: bool,

    /// Only one HTTP call at a time across all feeds
    #[arg(long, hide = true)]
    pub debugger: bool,

    /// Pause before every HTTP call (do not hammer the server)
    #[arg(long, hide = true)]
    pub slow: bool,

    /// Do not verify server certificates (dangerous)
    #[arg(long, hide = true)]
    pub insecure: bool,

    /// Stop each feed after this many pages (0 = no limit)
    #[arg(long, hide = true, default_value_t = 0)]
    pub maxcalls: usize,
}

fn after_help() -> String {
    format!(
        "Endpoints file format:\n{}\n\nExit status:\n  0    every feed drained\n  1    fatal error (configuration, endpoints, output files)\n  {}  interrupted by a signal; output holds the pages fetched so far",
        ENDPOINTS_EXAMPLE, INTERRUPTED_EXIT_STATUS
    )
}

impl Cli {
    /// Fold command-line overrides into the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.path {
            config.pipeline.path_suffix = path.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if self.debug {
            config.pipeline.diagnostics = true;
        }
        if self.maxcalls > 0 {
            config.pipeline.max_pages = self.maxcalls;
        }
        if self.debugger {
            config.fetch.serialize_requests = true;
        }
        if self.slow {
            config.fetch.slow_mode = true;
        }
        if self.insecure {
            config.fetch.insecure = true;
        }
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}

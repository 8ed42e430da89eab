use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, serde::Serialize)]
#[command(
    name = "srexport",
    version,
    about = "Export Twitch-hosted speedrun.com runs of a game to CSV",
    long_about = include_str!("help_examples.md")
)]
pub struct Cli {
    /// Game name to search for (prompted when omitted)
    #[arg(value_name = "GAME")]
    pub game: Option<String>,

    /// 1-based pick among search results when the name is ambiguous
    #[arg(long = "select", value_name = "N")]
    pub select: Option<usize>,

    /// Explicit CSV path; defaults to leaderboard_<slug>.csv in --output-dir
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Directory for the derived CSV file name
    #[arg(long = "output-dir", value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// API base URL (falls back to SRC_API_BASE, then the public API)
    #[arg(long = "api-base", value_name = "URL")]
    pub api_base: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long = "timeout", value_name = "SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Runs requested per page (the API caps this at 200)
    #[arg(long = "page-size", value_name = "N", default_value_t = 200)]
    pub page_size: u32,

    /// Pause after this many run-page requests
    #[arg(long = "rate-limit-every", value_name = "N", default_value_t = 100)]
    pub rate_limit_every: u32,

    /// Length of the rate-limit pause in seconds
    #[arg(long = "rate-limit-pause", value_name = "SECS", default_value_t = 60)]
    pub rate_limit_pause_secs: u64,

    /// Print the export summary JSON to stdout
    #[arg(long = "print-summary")]
    pub print_summary: bool,

    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,
}

use std::path::PathBuf;
use std::time::Duration;

use crate::api::{API_BASE_ENV, DEFAULT_API_BASE};
use crate::cli::Cli;
use crate::types::Game;

pub const MAX_PAGE_SIZE: u32 = 200;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Config {
    pub game: Option<String>,
    pub select: Option<usize>,
    pub output: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub api_base: String,
    pub timeout_secs: u64,
    pub page_size: u32,
    pub rate_limit_every: u32,
    pub rate_limit_pause_secs: u64,
    pub print_summary: bool,
    pub verbose: u8,
    pub quiet: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game: None,
            select: None,
            output: None,
            output_dir: PathBuf::from("."),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: 30,
            page_size: MAX_PAGE_SIZE,
            rate_limit_every: 100,
            rate_limit_pause_secs: 60,
            print_summary: false,
            verbose: 0,
            quiet: 0,
        }
    }
}

impl Config {
    fn validate_paging(&self) -> anyhow::Result<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            anyhow::bail!("page-size must be between 1 and {MAX_PAGE_SIZE}");
        }
        if self.rate_limit_every == 0 {
            anyhow::bail!("rate-limit-every must be greater than zero");
        }
        Ok(())
    }

    fn validate_network(&self) -> anyhow::Result<()> {
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout must be at least 1 second");
        }
        if self.api_base.trim().is_empty() {
            anyhow::bail!("api-base cannot be empty");
        }
        Ok(())
    }

    fn validate_selection(&self) -> anyhow::Result<()> {
        if self.select == Some(0) {
            anyhow::bail!("select is 1-based; 0 is not a valid choice");
        }
        Ok(())
    }

    fn validate_output(&self) -> anyhow::Result<()> {
        if self.output.is_none() && self.output_dir.as_os_str().is_empty() {
            anyhow::bail!("output-dir cannot be empty");
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_paging()?;
        self.validate_network()?;
        self.validate_selection()?;
        self.validate_output()?;
        Ok(())
    }

    /// 1 is normal operator output; each -v adds a level, each -q removes one.
    pub fn log_level(&self) -> u8 {
        1u8.saturating_add(self.verbose).saturating_sub(self.quiet)
    }

    pub fn rate_limit_pause(&self) -> Duration {
        Duration::from_secs(self.rate_limit_pause_secs)
    }

    pub fn output_path(&self, game: &Game) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => self
                .output_dir
                .join(format!("leaderboard_{}.csv", game.slug())),
        }
    }
}

/// `--api-base` wins over the environment, which wins over the public API.
fn api_base_from(flag: Option<String>, env: Option<String>) -> String {
    flag.or(env.filter(|base| !base.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
}

impl TryFrom<Cli> for Config {
    type Error = anyhow::Error;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let api_base = api_base_from(cli.api_base, std::env::var(API_BASE_ENV).ok());

        let config = Self {
            game: cli.game.map(|g| g.trim().to_string()).filter(|g| !g.is_empty()),
            select: cli.select,
            output: cli.output,
            output_dir: cli.output_dir,
            api_base,
            timeout_secs: cli.timeout_secs,
            page_size: cli.page_size,
            rate_limit_every: cli.rate_limit_every,
            rate_limit_pause_secs: cli.rate_limit_pause_secs,
            print_summary: cli.print_summary,
            verbose: cli.verbose,
            quiet: cli.quiet,
        };

        config.validate()?;

        Ok(config)
    }
}

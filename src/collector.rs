use std::fmt;
use std::thread::sleep;
use std::time::Duration;

use crate::api::{ApiError, SpeedrunApi};
use crate::config::Config;
use crate::progress::ProgressReporter;
use crate::types::Run;

/// Process-wide request budget for run paging. Before a request is issued,
/// if the number already issued is a positive multiple of `every`, the caller
/// is blocked for `pause`.
pub struct RateLimiter {
    every: u32,
    pause: Duration,
    issued: u64,
    pauses: u32,
}

impl RateLimiter {
    pub fn new(every: u32, pause: Duration) -> Self {
        Self {
            every: every.max(1),
            pause,
            issued: 0,
            pauses: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.rate_limit_every, config.rate_limit_pause())
    }

    fn due(&self) -> bool {
        self.issued > 0 && self.issued % u64::from(self.every) == 0
    }

    /// Wait out the pause if one is due, then count the request.
    /// Returns whether a pause was taken.
    pub fn acquire(&mut self) -> bool {
        let paused = self.due();
        if paused {
            self.pauses += 1;
            if !self.pause.is_zero() {
                sleep(self.pause);
            }
        }
        self.issued += 1;
        paused
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn pauses(&self) -> u32 {
        self.pauses
    }
}

#[derive(Debug)]
pub struct CollectError {
    pub category_id: String,
    pub offset: usize,
    pub source: ApiError,
}

impl fmt::Display for CollectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error: Unable to fetch run data for category {} at offset {}. {}",
            self.category_id, self.offset, self.source
        )
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Page through every run of a category until an empty page comes back.
/// A failed page abandons the category; pages already read are dropped.
pub fn collect_runs(
    api: &SpeedrunApi,
    category_id: &str,
    page_size: u32,
    limiter: &mut RateLimiter,
    progress: Option<&ProgressReporter>,
    log_level: u8,
) -> Result<Vec<Run>, CollectError> {
    let mut runs = Vec::new();
    let mut offset = 0usize;
    let mut pages = 0usize;

    loop {
        if limiter.due() {
            let secs = limiter.pause().as_secs();
            match progress {
                Some(p) => {
                    p.pausing(limiter.pause());
                    p.println(format!("Rate limit reached, waiting for {secs} seconds..."));
                }
                None => {
                    vprintln!(log_level, 1, "Rate limit reached, waiting for {} seconds...", secs)
                }
            }
        }
        limiter.acquire();

        let page = api
            .runs_page(category_id, offset, page_size)
            .map_err(|source| CollectError {
                category_id: category_id.to_string(),
                offset,
                source,
            })?;

        if page.is_empty() {
            break;
        }

        pages += 1;
        vprintln!(
            log_level,
            2,
            "runs {}: page {} at offset {} -> {} records",
            category_id,
            pages,
            offset,
            page.len()
        );
        runs.extend(page.into_iter().map(Run::from_value));
        if let Some(p) = progress {
            p.page_fetched(pages, runs.len());
        }
        offset += page_size as usize;
    }

    Ok(runs)
}

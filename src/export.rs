use std::path::PathBuf;

use serde::Serialize;

use crate::api::SpeedrunApi;
use crate::collector::{RateLimiter, collect_runs};
use crate::config::Config;
use crate::identity::ApiIdentityResolver;
use crate::placements::fetch_placements;
use crate::progress::ProgressReporter;
use crate::prompt::Prompter;
use crate::resolve::{list_categories, resolve_game};
use crate::rows::{SkipCounts, map_runs};
use crate::sink::append_category;

pub const GAME_NAME_PROMPT: &str = "Enter the Speedrun.com game name: ";

#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub id: String,
    pub name: String,
    pub collected: bool,
    pub placements: usize,
    pub runs: usize,
    pub kept_runs: usize,
    pub rows: usize,
    pub skipped: SkipCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub game_id: String,
    pub game_name: String,
    pub output: PathBuf,
    pub categories: Vec<CategoryReport>,
    /// Run-page requests only; search, category, leaderboard and user
    /// lookups are not rate limited and not counted.
    pub run_page_requests: u64,
    pub rate_limit_pauses: u32,
}

impl ExportSummary {
    pub fn rows_written(&self) -> usize {
        self.categories.iter().map(|c| c.rows).sum()
    }
}

fn log_step(progress: Option<&ProgressReporter>, log_level: u8, level: u8, message: String) {
    if log_level < level {
        return;
    }
    match progress {
        Some(p) => p.println(message),
        None => eprintln!("{message}"),
    }
}

fn game_name(config: &Config, prompter: &mut dyn Prompter) -> anyhow::Result<String> {
    let name = match &config.game {
        Some(name) => name.clone(),
        None => prompter.ask(GAME_NAME_PROMPT)?.trim().to_string(),
    };
    if name.is_empty() {
        anyhow::bail!("Invalid game name or not found.");
    }
    Ok(name)
}

pub fn run_export(config: &Config, prompter: &mut dyn Prompter) -> anyhow::Result<ExportSummary> {
    let api = SpeedrunApi::new(config)?;
    run_export_with_api(&api, config, prompter)
}

/// Same as `run_export` but accepts a prepared API client for test injection.
///
/// Game resolution and category listing happen before the output file is
/// touched, so their failures leave the filesystem alone. After that, every
/// category is handled in order; a category whose runs cannot be collected
/// is skipped and the rest still run.
pub fn run_export_with_api(
    api: &SpeedrunApi,
    config: &Config,
    prompter: &mut dyn Prompter,
) -> anyhow::Result<ExportSummary> {
    let log_level = config.log_level();
    let name = game_name(config, prompter)?;
    let game = resolve_game(api, &name, config.select, prompter, log_level)?;
    vprintln!(
        log_level,
        1,
        "Selected game: {} ({})",
        game.display_name(),
        game.id
    );

    let categories = list_categories(api, &game.id, log_level);
    if categories.is_empty() {
        anyhow::bail!("No categories found for this game.");
    }

    let output = config.output_path(&game);
    let identities = ApiIdentityResolver::new(api, log_level);
    let mut limiter = RateLimiter::from_config(config);
    let progress = ProgressReporter::maybe_new(config);
    let progress = progress.as_ref();
    let mut reports = Vec::with_capacity(categories.len());

    for category in &categories {
        log_step(
            progress,
            log_level,
            1,
            format!(
                "Fetching runs for category: {} ({})",
                category.name, category.id
            ),
        );
        let placements = fetch_placements(api, &game.id, &category.id, log_level);

        if let Some(p) = progress {
            p.begin_paging(&category.name);
        }
        let collected = collect_runs(
            api,
            &category.id,
            config.page_size,
            &mut limiter,
            progress,
            log_level,
        );
        if let Some(p) = progress {
            p.finish_paging();
        }

        let runs = match collected {
            Ok(runs) => runs,
            Err(e) => {
                log_step(progress, log_level, 1, e.to_string());
                log_step(
                    progress,
                    log_level,
                    1,
                    format!("No data to save for {}.", category.name),
                );
                reports.push(CategoryReport {
                    id: category.id.clone(),
                    name: category.name.clone(),
                    collected: false,
                    placements: placements.len(),
                    runs: 0,
                    kept_runs: 0,
                    rows: 0,
                    skipped: SkipCounts::default(),
                });
                continue;
            }
        };

        let mapped = map_runs(&category.name, &runs, &placements, &identities, progress);
        append_category(&output, &category.name, &mapped.rows)?;
        log_step(
            progress,
            log_level,
            1,
            format!("Runs for {} saved to {}", category.name, output.display()),
        );
        vprintln!(
            log_level,
            2,
            "{}: {} runs, {} kept, {} rows, {} skipped",
            category.name,
            runs.len(),
            mapped.kept_runs,
            mapped.rows.len(),
            mapped.skipped.total()
        );

        reports.push(CategoryReport {
            id: category.id.clone(),
            name: category.name.clone(),
            collected: true,
            placements: placements.len(),
            runs: runs.len(),
            kept_runs: mapped.kept_runs,
            rows: mapped.rows.len(),
            skipped: mapped.skipped,
        });
    }

    Ok(ExportSummary {
        game_id: game.id.clone(),
        game_name: game.display_name().to_string(),
        output,
        categories: reports,
        run_page_requests: limiter.issued(),
        rate_limit_pauses: limiter.pauses(),
    })
}

use std::fmt;

use crate::api::SpeedrunApi;
use crate::prompt::Prompter;
use crate::types::{Category, Game};

pub const SELECTION_PROMPT: &str = "Enter the number of the correct game: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    NoCandidates,
    NotANumber(String),
    OutOfRange { choice: usize, count: usize },
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::NoCandidates => f.write_str("Invalid choice: nothing to choose from"),
            SelectionError::NotANumber(raw) => write!(f, "Invalid choice: {raw:?} is not a number"),
            SelectionError::OutOfRange { choice, count } => {
                write!(f, "Invalid choice: {choice} is not between 1 and {count}")
            }
        }
    }
}

impl std::error::Error for SelectionError {}

/// Turn a 1-based answer into a 0-based index into `count` candidates.
pub fn select_candidate(count: usize, input: &str) -> Result<usize, SelectionError> {
    if count == 0 {
        return Err(SelectionError::NoCandidates);
    }
    let trimmed = input.trim();
    let choice: usize = trimmed
        .parse()
        .map_err(|_| SelectionError::NotANumber(trimmed.to_string()))?;
    if choice == 0 || choice > count {
        return Err(SelectionError::OutOfRange { choice, count });
    }
    Ok(choice - 1)
}

pub fn candidate_lines(games: &[Game]) -> Vec<String> {
    games
        .iter()
        .enumerate()
        .map(|(i, game)| format!("{}: {} ({})", i + 1, game.display_name(), game.id))
        .collect()
}

/// Search for `name` and settle on exactly one game. Ambiguous results are
/// settled by `preselect` when given, otherwise by asking `prompter`.
pub fn resolve_game(
    api: &SpeedrunApi,
    name: &str,
    preselect: Option<usize>,
    prompter: &mut dyn Prompter,
    log_level: u8,
) -> anyhow::Result<Game> {
    let mut games = api
        .search_games(name)
        .map_err(|e| anyhow::anyhow!("Error: Unable to fetch game ID. {e}"))?;

    if games.is_empty() {
        anyhow::bail!("No games found with that name.");
    }
    if games.len() == 1 {
        let game = games.remove(0);
        vprintln!(log_level, 2, "single match: {} ({})", game.display_name(), game.id);
        return Ok(game);
    }

    let index = match preselect {
        Some(choice) => {
            for line in candidate_lines(&games) {
                vprintln!(log_level, 2, "{}", line);
            }
            select_candidate(games.len(), &choice.to_string())?
        }
        None => {
            prompter.show("Multiple games found:");
            for line in candidate_lines(&games) {
                prompter.show(&line);
            }
            let answer = prompter.ask(SELECTION_PROMPT)?;
            select_candidate(games.len(), &answer)?
        }
    };

    Ok(games.swap_remove(index))
}

/// Categories of a game in API order. A failed request is reported and
/// treated as having no categories.
pub fn list_categories(api: &SpeedrunApi, game_id: &str, log_level: u8) -> Vec<Category> {
    match api.categories(game_id) {
        Ok(categories) => categories,
        Err(e) => {
            vprintln!(log_level, 1, "Error: Unable to fetch category IDs. {}", e);
            Vec::new()
        }
    }
}

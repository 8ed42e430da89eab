use crate::api::SpeedrunApi;
use crate::types::{Leaderboard, Place, Placements, RunStatus};

/// Only verified runs get a place; anything else is left out of the map.
pub fn placements_from(leaderboard: Leaderboard) -> Placements {
    let mut placements = Placements::new();
    for entry in leaderboard.runs {
        let Some(run) = entry.run else {
            continue;
        };
        if run.status() != RunStatus::Verified {
            continue;
        }
        let Some(id) = run.id else {
            continue;
        };
        let place = entry.place.map(Place::Rank).unwrap_or(Place::NotApplicable);
        placements.insert(id, place);
    }
    placements
}

/// Leaderboard placements for one category. A failed request degrades to an
/// empty map so every run of the category is written as `N/A`.
pub fn fetch_placements(
    api: &SpeedrunApi,
    game_id: &str,
    category_id: &str,
    log_level: u8,
) -> Placements {
    match api.leaderboard(game_id, category_id) {
        Ok(leaderboard) => {
            let placements = placements_from(leaderboard);
            vprintln!(
                log_level,
                2,
                "leaderboard {}: {} verified placements",
                category_id,
                placements.len()
            );
            placements
        }
        Err(e) => {
            vprintln!(log_level, 1, "Error: Unable to fetch leaderboard data. {}", e);
            Placements::new()
        }
    }
}

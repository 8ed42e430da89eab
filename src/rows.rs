use serde::Serialize;

use crate::identity::IdentityResolver;
use crate::progress::ProgressReporter;
use crate::types::{
    GUEST_RUNNER, OutputRow, Place, Placements, PlayerRef, Run, RunStatus, TWITCH_HOST_MARKER,
    UNKNOWN_RUNNER, VideoLink,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Rejected,
    NoVideos,
    NoTwitchLinks,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Kept(Vec<OutputRow>),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    pub rejected: usize,
    pub no_videos: usize,
    pub no_twitch_links: usize,
}

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Rejected => self.rejected += 1,
            SkipReason::NoVideos => self.no_videos += 1,
            SkipReason::NoTwitchLinks => self.no_twitch_links += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.rejected + self.no_videos + self.no_twitch_links
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedRuns {
    pub rows: Vec<OutputRow>,
    pub kept_runs: usize,
    pub skipped: SkipCounts,
}

fn reject_status(run: &Run) -> Result<(), SkipReason> {
    match run.status() {
        RunStatus::Rejected => Err(SkipReason::Rejected),
        _ => Ok(()),
    }
}

fn video_links(run: &Run) -> Result<&[VideoLink], SkipReason> {
    run.videos
        .as_ref()
        .and_then(|videos| videos.links.as_deref())
        .ok_or(SkipReason::NoVideos)
}

fn twitch_links(links: &[VideoLink]) -> Result<Vec<String>, SkipReason> {
    let twitch: Vec<String> = links
        .iter()
        .filter(|link| link.uri.contains(TWITCH_HOST_MARKER))
        .map(|link| link.uri.clone())
        .collect();
    if twitch.is_empty() {
        Err(SkipReason::NoTwitchLinks)
    } else {
        Ok(twitch)
    }
}

/// Only the first usable player is credited, so co-op runs carry one name.
fn runner_name(run: &Run, identities: &dyn IdentityResolver) -> String {
    match run.players().into_iter().next() {
        Some(PlayerRef::Guest { name }) => name.unwrap_or_else(|| GUEST_RUNNER.to_string()),
        Some(PlayerRef::User { id }) => identities.display_name(&id),
        None => UNKNOWN_RUNNER.to_string(),
    }
}

fn place_for(run: &Run, placements: &Placements) -> Place {
    run.id
        .as_deref()
        .and_then(|id| placements.get(id))
        .copied()
        .unwrap_or(Place::NotApplicable)
}

/// Decide whether a run is exported and build its rows, one per Twitch link.
/// The runner is only resolved once every filter has passed.
pub fn map_run(
    run: &Run,
    placements: &Placements,
    identities: &dyn IdentityResolver,
) -> RunOutcome {
    let twitch = match reject_status(run)
        .and_then(|()| video_links(run))
        .and_then(twitch_links)
    {
        Ok(links) => links,
        Err(reason) => return RunOutcome::Skipped(reason),
    };

    let runner = runner_name(run, identities);
    let run_link = run.permalink();
    let place = place_for(run, placements);

    RunOutcome::Kept(
        twitch
            .into_iter()
            .map(|video_link| OutputRow {
                place,
                runner: runner.clone(),
                run_link: run_link.clone(),
                video_link,
            })
            .collect(),
    )
}

pub fn map_runs(
    category: &str,
    runs: &[Run],
    placements: &Placements,
    identities: &dyn IdentityResolver,
    progress: Option<&ProgressReporter>,
) -> MappedRuns {
    let mut mapped = MappedRuns::default();
    if let Some(p) = progress {
        p.begin_saving(category, runs.len());
    }
    for (i, run) in runs.iter().enumerate() {
        match map_run(run, placements, identities) {
            RunOutcome::Kept(rows) => {
                mapped.kept_runs += 1;
                mapped.rows.extend(rows);
            }
            RunOutcome::Skipped(reason) => mapped.skipped.record(reason),
        }
        if let Some(p) = progress {
            p.advance_saving(i + 1, mapped.rows.len());
        }
    }
    if let Some(p) = progress {
        p.finish_saving();
    }
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    struct CountingResolver {
        calls: Cell<usize>,
    }

    impl CountingResolver {
        fn new() -> Self {
            Self { calls: Cell::new(0) }
        }
    }

    impl IdentityResolver for CountingResolver {
        fn display_name(&self, runner_id: &str) -> String {
            self.calls.set(self.calls.get() + 1);
            format!("name-of-{runner_id}")
        }
    }

    fn run(value: serde_json::Value) -> Run {
        Run::from_value(value)
    }

    fn placements(pairs: &[(&str, u64)]) -> Placements {
        pairs
            .iter()
            .map(|(id, rank)| (id.to_string(), Place::Rank(*rank)))
            .collect()
    }

    #[test]
    fn one_row_per_twitch_link() {
        let resolver = CountingResolver::new();
        let record = run(json!({
            "id": "r1",
            "status": {"status": "verified"},
            "players": {"data": [{"rel": "user", "id": "u1"}]},
            "videos": {"links": [
                {"uri": "https://www.twitch.tv/videos/1"},
                {"uri": "https://youtu.be/abc"},
                {"uri": "https://www.twitch.tv/videos/2"}
            ]}
        }));

        let RunOutcome::Kept(rows) = map_run(&record, &placements(&[("r1", 3)]), &resolver) else {
            panic!("run should be kept");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].video_link, "https://www.twitch.tv/videos/1");
        assert_eq!(rows[1].video_link, "https://www.twitch.tv/videos/2");
        for row in &rows {
            assert_eq!(row.place, Place::Rank(3));
            assert_eq!(row.runner, "name-of-u1");
            assert_eq!(row.run_link, "https://www.speedrun.com/run/r1");
        }
        assert_eq!(resolver.calls.get(), 1);
    }

    #[test]
    fn rejected_runs_are_skipped_before_videos_are_checked() {
        let resolver = CountingResolver::new();
        let record = run(json!({
            "id": "r1",
            "status": {"status": "rejected"},
            "players": {"data": [{"rel": "user", "id": "u1"}]},
            "videos": {"links": [{"uri": "https://www.twitch.tv/videos/1"}]}
        }));
        assert_eq!(
            map_run(&record, &Placements::new(), &resolver),
            RunOutcome::Skipped(SkipReason::Rejected)
        );
        assert_eq!(resolver.calls.get(), 0);
    }

    #[test]
    fn missing_videos_or_links_are_skipped() {
        let resolver = CountingResolver::new();
        for record in [
            json!({"id": "r1", "status": {"status": "verified"}}),
            json!({"id": "r1", "videos": null}),
            json!({"id": "r1", "videos": {"text": "see description"}}),
        ] {
            assert_eq!(
                map_run(&run(record), &Placements::new(), &resolver),
                RunOutcome::Skipped(SkipReason::NoVideos)
            );
        }
    }

    #[test]
    fn non_twitch_links_are_skipped() {
        let resolver = CountingResolver::new();
        let record = run(json!({
            "id": "r1",
            "videos": {"links": [{"uri": "https://youtu.be/abc"}, {}]}
        }));
        assert_eq!(
            map_run(&record, &Placements::new(), &resolver),
            RunOutcome::Skipped(SkipReason::NoTwitchLinks)
        );
        assert_eq!(resolver.calls.get(), 0);
    }

    #[test]
    fn malformed_link_does_not_hide_twitch_link() {
        let resolver = CountingResolver::new();
        let record = run(json!({
            "id": "r",
            "videos": {"links": [{"uri": "https://twitch.tv/a"}, {"uri": null}]}
        }));
        let RunOutcome::Kept(rows) = map_run(&record, &Placements::new(), &resolver) else {
            panic!("run should be kept");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].video_link, "https://twitch.tv/a");
    }

    #[test]
    fn only_malformed_links_count_as_no_twitch_links() {
        let resolver = CountingResolver::new();
        let record = run(json!({"id": "r", "videos": {"links": [{"uri": null}, 3]}}));
        assert_eq!(
            map_run(&record, &Placements::new(), &resolver),
            RunOutcome::Skipped(SkipReason::NoTwitchLinks)
        );
    }

    #[test]
    fn guest_without_name_is_guest() {
        let resolver = CountingResolver::new();
        let record = run(json!({
            "id": "r1",
            "players": {"data": [{"rel": "guest"}]},
            "videos": {"links": [{"uri": "https://twitch.tv/x"}]}
        }));
        let RunOutcome::Kept(rows) = map_run(&record, &Placements::new(), &resolver) else {
            panic!("run should be kept");
        };
        assert_eq!(rows[0].runner, "Guest");
        assert_eq!(resolver.calls.get(), 0);
    }

    #[test]
    fn only_first_player_is_credited() {
        let resolver = CountingResolver::new();
        let record = run(json!({
            "id": "r1",
            "players": {"data": [{"rel": "guest", "name": "alpha"}, {"rel": "user", "id": "u2"}]},
            "videos": {"links": [{"uri": "https://twitch.tv/x"}]}
        }));
        let RunOutcome::Kept(rows) = map_run(&record, &Placements::new(), &resolver) else {
            panic!("run should be kept");
        };
        assert_eq!(rows[0].runner, "alpha");
        assert_eq!(resolver.calls.get(), 0);
    }

    #[test]
    fn no_players_and_no_id_fall_back() {
        let resolver = CountingResolver::new();
        let record = run(json!({"videos": {"links": [{"uri": "https://twitch.tv/x"}]}}));
        let RunOutcome::Kept(rows) = map_run(&record, &placements(&[("r1", 1)]), &resolver) else {
            panic!("run should be kept");
        };
        assert_eq!(rows[0].runner, "Unknown");
        assert_eq!(rows[0].run_link, "N/A");
        assert_eq!(rows[0].place, Place::NotApplicable);
    }

    #[test]
    fn unverified_run_has_no_place() {
        let resolver = CountingResolver::new();
        let record = run(json!({
            "id": "pending1",
            "status": {"status": "new"},
            "videos": {"links": [{"uri": "https://twitch.tv/x"}]}
        }));
        let RunOutcome::Kept(rows) = map_run(&record, &placements(&[("r1", 1)]), &resolver) else {
            panic!("run should be kept");
        };
        assert_eq!(rows[0].place.to_string(), "N/A");
    }

    #[test]
    fn map_runs_tallies_outcomes() {
        let resolver = CountingResolver::new();
        let runs = vec![
            run(json!({"id": "a", "status": {"status": "rejected"}})),
            run(json!({"id": "b"})),
            run(json!({"id": "c", "videos": {"links": [{"uri": "https://youtu.be/c"}]}})),
            run(json!({"id": "d", "videos": {"links": [
                {"uri": "https://twitch.tv/d1"}, {"uri": "https://twitch.tv/d2"}
            ]}})),
        ];
        let mapped = map_runs("Any%", &runs, &placements(&[("d", 7)]), &resolver, None);
        assert_eq!(mapped.kept_runs, 1);
        assert_eq!(mapped.rows.len(), 2);
        assert_eq!(
            mapped.skipped,
            SkipCounts {
                rejected: 1,
                no_videos: 1,
                no_twitch_links: 1
            }
        );
        assert_eq!(mapped.skipped.total(), 3);
    }
}

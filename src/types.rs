use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Marker a video URI must contain to be exported.
pub const TWITCH_HOST_MARKER: &str = "twitch.tv";
pub const RUN_PERMALINK_BASE: &str = "https://www.speedrun.com/run";
pub const NOT_APPLICABLE: &str = "N/A";
pub const UNKNOWN_RUNNER: &str = "Unknown";
pub const GUEST_RUNNER: &str = "Guest";

/// Decode a field if it has the expected shape, otherwise treat it as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Like `lenient`, but a list keeps its well-formed elements and drops the rest.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Names {
    #[serde(default)]
    pub international: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Game {
    pub id: String,
    #[serde(default)]
    pub names: Names,
    #[serde(default)]
    pub weblink: String,
}

impl Game {
    pub fn display_name(&self) -> &str {
        self.names.international.as_deref().unwrap_or(&self.id)
    }

    /// Last path segment of the game's web URL, e.g. `sm64` for
    /// `https://www.speedrun.com/sm64`.
    pub fn slug(&self) -> String {
        let segment = self
            .weblink
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        if segment.is_empty() {
            self.id.clone()
        } else {
            segment.to_string()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Verified,
    Rejected,
    Other(String),
    Missing,
}

impl RunStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("new") | Some("pending") => RunStatus::Pending,
            Some("verified") => RunStatus::Verified,
            Some("rejected") => RunStatus::Rejected,
            Some(other) => RunStatus::Other(other.to_string()),
            None => RunStatus::Missing,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct StatusField {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct VideoLink {
    #[serde(default)]
    pub uri: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Videos {
    #[serde(default, deserialize_with = "lenient_list")]
    pub links: Option<Vec<VideoLink>>,
}

/// `players` is `{"data": [...]}` when embedded and a bare list otherwise.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum PlayersField {
    Embedded { data: Vec<serde_json::Value> },
    Plain(Vec<serde_json::Value>),
}

impl PlayersField {
    pub fn entries(&self) -> &[serde_json::Value] {
        match self {
            PlayersField::Embedded { data } => data,
            PlayersField::Plain(list) => list,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerRef {
    Guest { name: Option<String> },
    User { id: String },
}

impl PlayerRef {
    /// Entries that are neither guests nor carry a user id yield `None`.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        if obj.get("rel").and_then(|v| v.as_str()) == Some("guest") {
            let name = obj
                .get("name")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            return Some(PlayerRef::Guest { name });
        }
        obj.get("id")
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .map(|id| PlayerRef::User { id: id.to_string() })
    }
}

/// A run record as returned by `/runs`. Every field tolerates absence or an
/// unexpected shape.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Run {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<StatusField>,
    #[serde(default, deserialize_with = "lenient")]
    pub players: Option<PlayersField>,
    #[serde(default, deserialize_with = "lenient")]
    pub videos: Option<Videos>,
}

impl Run {
    /// Non-object records decode to an empty run, which the row pipeline skips.
    pub fn from_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    pub fn status(&self) -> RunStatus {
        RunStatus::parse(self.status.as_ref().and_then(|s| s.status.as_deref()))
    }

    pub fn players(&self) -> Vec<PlayerRef> {
        self.players
            .as_ref()
            .map(|p| p.entries().iter().filter_map(PlayerRef::from_value).collect())
            .unwrap_or_default()
    }

    pub fn permalink(&self) -> String {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => format!("{RUN_PERMALINK_BASE}/{id}"),
            _ => NOT_APPLICABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct LeaderboardEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub place: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub run: Option<Run>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Leaderboard {
    #[serde(default)]
    pub runs: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct User {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub names: Names,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Place {
    Rank(u64),
    NotApplicable,
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Rank(rank) => write!(f, "{rank}"),
            Place::NotApplicable => f.write_str(NOT_APPLICABLE),
        }
    }
}

/// Verified run id -> rank, for a single category.
pub type Placements = HashMap<String, Place>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    pub place: Place,
    pub runner: String,
    pub run_link: String,
    pub video_link: String,
}

impl OutputRow {
    pub fn to_record(&self) -> [String; 4] {
        [
            self.place.to_string(),
            self.runner.clone(),
            self.run_link.clone(),
            self.video_link.clone(),
        ]
    }
}

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::types::{Category, Game, Leaderboard, User};

pub const DEFAULT_API_BASE: &str = "https://www.speedrun.com/api/v1";
pub const API_BASE_ENV: &str = "SRC_API_BASE";
pub const RUN_EMBEDS: &str = "players,videos,status";
pub const LEADERBOARD_EMBEDS: &str = "players,run";

/// Every endpoint wraps its payload in a top-level `data` field.
#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    data: T,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Transport(String),
    Status(u16),
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(msg) => write!(f, "request failed: {msg}"),
            ApiError::Status(code) => write!(f, "status code: {code}"),
            ApiError::Decode(msg) => write!(f, "invalid response body: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Thin read-only client for the speedrun.com REST API.
pub struct SpeedrunApi {
    client: Client,
    base: String,
    log_level: u8,
}

impl SpeedrunApi {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("srexport/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, &config.api_base, config.log_level()))
    }

    /// Same as `new` but accepts a prepared blocking client for test injection.
    pub fn with_client(client: Client, base: &str, log_level: u8) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
            log_level,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn get_data<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Default,
    {
        let url = format!("{}{}", self.base, path);
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| {
                vprintln!(self.log_level, 3, "api: GET {} failed: {}", url, e);
                ApiError::Transport(e.to_string())
            })?;

        let status = resp.status();
        vprintln!(
            self.log_level,
            3,
            "api: GET {} {:?} status={}",
            url,
            query,
            status
        );
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        resp.json::<Envelope<T>>()
            .map(|envelope| envelope.data)
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn search_games(&self, name: &str) -> Result<Vec<Game>, ApiError> {
        self.get_data("/games", &[("name", name)])
    }

    pub fn categories(&self, game_id: &str) -> Result<Vec<Category>, ApiError> {
        self.get_data(&format!("/games/{game_id}/categories"), &[])
    }

    pub fn leaderboard(&self, game_id: &str, category_id: &str) -> Result<Leaderboard, ApiError> {
        self.get_data(
            &format!("/leaderboards/{game_id}/category/{category_id}"),
            &[("embed", LEADERBOARD_EMBEDS)],
        )
    }

    /// One page of raw run records; decoding into `Run` is left to the caller.
    pub fn runs_page(
        &self,
        category_id: &str,
        offset: usize,
        max: u32,
    ) -> Result<Vec<serde_json::Value>, ApiError> {
        let max = max.to_string();
        let offset = offset.to_string();
        self.get_data(
            "/runs",
            &[
                ("category", category_id),
                ("max", max.as_str()),
                ("embed", RUN_EMBEDS),
                ("offset", offset.as_str()),
            ],
        )
    }

    pub fn user(&self, user_id: &str) -> Result<User, ApiError> {
        self.get_data(&format!("/users/{user_id}"), &[])
    }
}

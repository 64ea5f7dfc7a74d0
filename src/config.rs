//! Application-level configuration loading: gameplay pacing and the country
//! feed endpoint.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FLAG_QUIZ_BACK_CONFIG_PATH";

const DEFAULT_QUESTION_SWAP_MS: u64 = 300;
const DEFAULT_ANSWER_SETTLE_MS: u64 = 1_000;
const DEFAULT_LIFE_LOST_SETTLE_MS: u64 = 1_200;
const DEFAULT_FEED_TIMEOUT_SECS: u64 = 8;
const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
const DEFAULT_COUNTRIES_URL: &str = "https://restcountries.com/v3.1/all?fields=name,flags,cca3";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    question_swap: Duration,
    answer_settle: Duration,
    life_lost_settle: Duration,
    feed_timeout: Duration,
    leaderboard_limit: usize,
    countries_url: String,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to the
    /// baked-in defaults when the file is absent or malformed.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Pause between opening a question transition and committing the draw.
    pub fn question_swap(&self) -> Duration {
        self.question_swap
    }

    /// Settle delay after an evaluated answer before the next question.
    pub fn answer_settle(&self) -> Duration {
        self.answer_settle
    }

    /// Settle delay after a lost life (wrong answer or timeout) before the
    /// next question.
    pub fn life_lost_settle(&self) -> Duration {
        self.life_lost_settle
    }

    /// Bounded timeout applied to the country feed fetch.
    pub fn feed_timeout(&self) -> Duration {
        self.feed_timeout
    }

    /// Number of records the ranking endpoint returns.
    pub fn leaderboard_limit(&self) -> usize {
        self.leaderboard_limit
    }

    /// Country feed endpoint.
    pub fn countries_url(&self) -> &str {
        &self.countries_url
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            question_swap: Duration::from_millis(DEFAULT_QUESTION_SWAP_MS),
            answer_settle: Duration::from_millis(DEFAULT_ANSWER_SETTLE_MS),
            life_lost_settle: Duration::from_millis(DEFAULT_LIFE_LOST_SETTLE_MS),
            feed_timeout: Duration::from_secs(DEFAULT_FEED_TIMEOUT_SECS),
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
            countries_url: DEFAULT_COUNTRIES_URL.to_owned(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at
/// [`DEFAULT_CONFIG_PATH`]. Every knob is optional.
struct RawConfig {
    question_swap_ms: Option<u64>,
    answer_settle_ms: Option<u64>,
    life_lost_settle_ms: Option<u64>,
    feed_timeout_secs: Option<u64>,
    leaderboard_limit: Option<usize>,
    countries_url: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            question_swap: value
                .question_swap_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.question_swap),
            answer_settle: value
                .answer_settle_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.answer_settle),
            life_lost_settle: value
                .life_lost_settle_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.life_lost_settle),
            feed_timeout: value
                .feed_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.feed_timeout),
            leaderboard_limit: value.leaderboard_limit.unwrap_or(defaults.leaderboard_limit),
            countries_url: value.countries_url.unwrap_or(defaults.countries_url),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

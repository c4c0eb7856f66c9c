//! Configuration for the turf scraper.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::scraper::BASE_URL;

/// Delays and timeouts threaded through the fetcher and the driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Lower bound of the random gap between two requests
    #[serde(default = "default_min_request_delay")]
    pub min_request_delay_secs: f64,
    #[serde(default = "default_max_request_delay")]
    pub max_request_delay_secs: f64,
    /// Pause after each race page
    #[serde(default = "default_race_delay")]
    pub race_delay_secs: f64,
    /// Pause after each date
    #[serde(default = "default_day_delay")]
    pub day_delay_secs: f64,
    /// How long to wait for a page's content signal
    #[serde(default = "default_render_timeout")]
    pub render_timeout_secs: f64,
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: f64,
}

fn default_base_url() -> String {
    BASE_URL.to_string()
}

fn default_min_request_delay() -> f64 {
    2.0
}

fn default_max_request_delay() -> f64 {
    5.0
}

fn default_race_delay() -> f64 {
    2.0
}

fn default_day_delay() -> f64 {
    5.0
}

fn default_render_timeout() -> f64 {
    10.0
}

fn default_navigation_timeout() -> f64 {
    30.0
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            min_request_delay_secs: default_min_request_delay(),
            max_request_delay_secs: default_max_request_delay(),
            race_delay_secs: default_race_delay(),
            day_delay_secs: default_day_delay(),
            render_timeout_secs: default_render_timeout(),
            navigation_timeout_secs: default_navigation_timeout(),
        }
    }
}

/// Negative or non-finite values count as zero.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

impl ScraperConfig {
    /// No pauses at all
    #[cfg(test)]
    pub fn without_delays() -> Self {
        Self {
            min_request_delay_secs: 0.0,
            max_request_delay_secs: 0.0,
            race_delay_secs: 0.0,
            day_delay_secs: 0.0,
            render_timeout_secs: 1.0,
            ..Self::default()
        }
    }

    pub fn min_request_delay(&self) -> Duration {
        secs(self.min_request_delay_secs)
    }

    pub fn max_request_delay(&self) -> Duration {
        secs(self.max_request_delay_secs)
    }

    pub fn race_delay(&self) -> Duration {
        secs(self.race_delay_secs)
    }

    pub fn day_delay(&self) -> Duration {
        secs(self.day_delay_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        secs(self.render_timeout_secs)
    }

    pub fn navigation_timeout(&self) -> Duration {
        secs(self.navigation_timeout_secs)
    }
}

/// Headless Chrome settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome executable; platform default when unset
    #[serde(default)]
    pub chrome_path: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_headless")]
    pub headless: bool,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_headless() -> bool {
    true
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            user_agent: default_user_agent(),
            headless: default_headless(),
        }
    }
}

/// SQLite storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/turf_stats.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load configuration: defaults, then `turf.toml`, then the environment
    /// (`TURF__SCRAPER__RACE_DELAY_SECS=1`, `TURF__DATABASE__PATH=...`).
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("turf").required(false))
            .add_source(
                config::Environment::with_prefix("TURF")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

//! Runtime configuration loaded from an optional YAML file.
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to override:
//!
//! ```yaml
//! homepage_url: "https://www.rbc.ru/"
//! news_api_timeout_secs: 15
//! log_dir: "/var/log/rbc_news_bot"
//! ```
//!
//! Secrets (the bot token and the NewsAPI key) are never read from this file;
//! they come from the CLI or the environment, see [`crate::cli::Cli`].

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BotConfig {
    /// News homepage scraped for the latest headlines.
    pub homepage_url: String,
    /// NewsAPI base URL; `/top-headlines` and `/everything` are appended.
    pub news_api_url: String,
    /// Telegram Bot API base URL; `/bot<token>/<method>` is appended.
    pub telegram_api_url: String,
    /// User-Agent sent to the homepage and article pages.
    pub user_agent: String,
    pub homepage_timeout_secs: u64,
    pub article_timeout_secs: u64,
    pub news_api_timeout_secs: u64,
    /// Long-poll timeout passed to `getUpdates`.
    pub poll_timeout_secs: u64,
    /// Directory holding one dialog log file per user.
    pub log_dir: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            homepage_url: "https://www.rbc.ru/".to_string(),
            news_api_url: "https://newsapi.org/v2".to_string(),
            telegram_api_url: "https://api.telegram.org".to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            homepage_timeout_secs: 10,
            article_timeout_secs: 5,
            news_api_timeout_secs: 10,
            poll_timeout_secs: 30,
            log_dir: "user_logs".to_string(),
        }
    }
}

impl BotConfig {
    pub fn homepage_timeout(&self) -> Duration {
        Duration::from_secs(self.homepage_timeout_secs)
    }

    pub fn article_timeout(&self) -> Duration {
        Duration::from_secs(self.article_timeout_secs)
    }

    pub fn news_api_timeout(&self) -> Duration {
        Duration::from_secs(self.news_api_timeout_secs)
    }
}

/// Load configuration from `path`, or the defaults when no path is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid YAML for
/// [`BotConfig`].
#[instrument(level = "info")]
pub async fn load_config(path: Option<&str>) -> Result<BotConfig, Box<dyn Error>> {
    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(BotConfig::default());
    };

    let raw = fs::read_to_string(path).await?;
    let config: BotConfig = serde_yaml::from_str(&raw)?;
    info!(path, homepage = %config.homepage_url, log_dir = %config.log_dir, "Loaded configuration");
    Ok(config)
}

//! Command-line interface definitions for the RBC news bot.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Secrets can be provided via command-line flags or environment variables.

use clap::Parser;

/// Command-line arguments for the RBC news bot.
///
/// # Examples
///
/// ```sh
/// # Tokens from the environment
/// TELEGRAM_BOT_TOKEN=123:abc NEWS_API_KEY=key rbc_news_bot
///
/// # With a config file and a custom dialog log directory
/// rbc_news_bot -c ./config.yaml -l /var/log/rbc_news_bot
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Telegram bot token issued by @BotFather
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_token: String,

    /// NewsAPI key used for category browse and keyword search
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    pub news_api_key: String,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory for per-user dialog logs (overrides the config file)
    #[arg(short, long)]
    pub log_dir: Option<String>,
}

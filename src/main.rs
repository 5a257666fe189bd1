//! # RBC News Bot
//!
//! A Telegram bot that relays news to chat users. It scrapes the latest
//! headlines from the RBC homepage and searches NewsAPI by category or
//! keyword, then replies with short formatted summaries.
//!
//! ## Features
//!
//! - 📰 Latest news: five fresh RBC stories with an excerpt and timestamp
//! - 🔍 Search news: up to three NewsAPI results for a keyword
//! - 📂 Categories: up to three NewsAPI top headlines per category
//! - Per-user dialog log of everything sent and received
//!
//! ## Usage
//!
//! ```sh
//! TELEGRAM_BOT_TOKEN=... NEWS_API_KEY=... rbc_news_bot -c config.yaml
//! ```
//!
//! ## Architecture
//!
//! Updates are processed strictly one after another:
//! 1. **Polling**: `getUpdates` long-polls Telegram for messages and callbacks
//! 2. **Relay**: each update is mapped to a retrieval operation or a fixed reply
//! 3. **Retrieval**: RBC scraping or a NewsAPI request, empty on any failure
//! 4. **Output**: replies are logged per user and sent back through the Bot API

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod models;
mod outputs;
mod relay;
mod scrapers;
mod utils;

use api::TelegramApi;
use cli::Cli;
use outputs::dialog_log::FileDialogLog;
use relay::Relay;
use scrapers::NewsClient;
use utils::ensure_writable_dir;

/// Pause after a failed `getUpdates` before polling again.
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(3);

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "rbc_news_bot starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.config, ?args.log_dir, "Parsed CLI arguments");

    // ---- Load config ----
    let mut config = config::load_config(args.config.as_deref()).await?;
    if let Some(log_dir) = args.log_dir {
        config.log_dir = log_dir;
    }

    // Early check: ensure the dialog log dir is writable
    if let Err(e) = ensure_writable_dir(&config.log_dir).await {
        error!(
            path = %config.log_dir,
            error = %e,
            "Dialog log directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Wire up the bot ----
    let telegram = TelegramApi::new(&config.telegram_api_url, &args.telegram_token)?;
    let me = telegram.get_me().await?;
    info!(bot_id = me.id, username = ?me.username, "Authenticated with Telegram");

    let poll_timeout_secs = config.poll_timeout_secs;
    let dialog_log = FileDialogLog::new(&config.log_dir);
    let news = NewsClient::new(config, args.news_api_key)?;
    let mut relay = Relay::new(news, telegram.clone(), dialog_log);

    // ---- Poll loop ----
    info!(poll_timeout_secs, "Polling for updates");
    let mut offset = 0i64;
    let mut handled = 0u64;
    loop {
        let polled = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            polled = telegram.get_updates(offset, poll_timeout_secs) => polled,
        };

        match polled {
            Ok(updates) => {
                if !updates.is_empty() {
                    debug!(count = updates.len(), offset, "Received updates");
                }
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    relay.handle(update).await;
                    handled += 1;
                }
            }
            Err(e) => {
                warn!(error = %e, pause = ?POLL_ERROR_PAUSE, "getUpdates failed; pausing before next poll");
                tokio::time::sleep(POLL_ERROR_PAUSE).await;
            }
        }
    }

    info!(handled, "Execution complete");
    Ok(())
}

//! Telegram Bot API client.
//!
//! Only the handful of methods the bot needs are implemented, as JSON `POST`s
//! to `{telegram_api_url}/bot<token>/<method>`:
//!
//! | Method | Used for |
//! |--------|----------|
//! | `getMe` | Token check at startup |
//! | `getUpdates` | Long polling for messages and button callbacks |
//! | `sendMessage` | Every reply, with keyboards and HTML formatting |
//! | `sendChatAction` | "typing…" indicator while news is fetched |
//! | `answerCallbackQuery` | Acknowledging inline-button presses |
//!
//! # Architecture
//!
//! - [`ChatApi`]: the outbound surface the relay talks to
//! - [`TelegramApi`]: the reqwest-backed implementation, plus polling
//!
//! The bot token is part of every request URL, so transport errors are
//! stripped of their URL before they are returned or logged.

use crate::models::{ApiResponse, OutgoingMessage, Update, User};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Timeout for every call except `getUpdates`.
const CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack added on top of the long-poll timeout for the HTTP request itself.
const POLL_SLACK: Duration = Duration::from_secs(10);

/// Outbound chat operations.
///
/// Implementors deliver the relay's replies to users. This abstraction keeps
/// the relay independent of the transport and lets tests record traffic.
pub trait ChatApi {
    /// Send a text message, optionally formatted and with a keyboard.
    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), Box<dyn Error>>;

    /// Show the "typing…" indicator in `chat_id`.
    async fn send_typing(&self, chat_id: i64) -> Result<(), Box<dyn Error>>;

    /// Acknowledge an inline-button press, optionally with a toast `text`.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), Box<dyn Error>>;
}

/// reqwest-backed Telegram Bot API client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct TelegramApi {
    client: Client,
    /// `{api_url}/bot<token>`, without a trailing slash.
    base_url: String,
}

impl TelegramApi {
    /// Create a client for `token` against `api_url` (normally
    /// `https://api.telegram.org`, or a mock server in tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying `reqwest::Client` cannot be built.
    pub fn new(api_url: &str, token: &str) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    /// Identify the bot; fails when the token is rejected.
    #[instrument(level = "info", skip_all)]
    pub async fn get_me(&self) -> Result<User, Box<dyn Error>> {
        self.call("getMe", &json!({}), CALL_TIMEOUT).await
    }

    /// Long-poll for updates with `update_id >= offset`.
    ///
    /// Blocks for up to `timeout_secs` when nothing is pending.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, Box<dyn Error>> {
        let params = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        let timeout = Duration::from_secs(timeout_secs) + POLL_SLACK;
        self.call("getUpdates", &params, timeout).await
    }

    async fn call<P, R>(&self, method: &str, params: &P, timeout: Duration) -> Result<R, Box<dyn Error>>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let t0 = Instant::now();
        let response: ApiResponse<R> = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(params)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| e.without_url())?
            .json()
            .await
            .map_err(|e| e.without_url())?;
        let dt = t0.elapsed();

        if !response.ok {
            let description = response.description.unwrap_or_default();
            warn!(method, elapsed_ms = dt.as_millis() as u64, %description, "Telegram call rejected");
            return Err(format!("Telegram {method} failed: {description}").into());
        }

        debug!(method, elapsed_ms = dt.as_millis() as u64, "Telegram call succeeded");
        response
            .result
            .ok_or_else(|| format!("Telegram {method} returned no result").into())
    }
}

impl fmt::Debug for TelegramApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramApi").finish_non_exhaustive()
    }
}

impl ChatApi for TelegramApi {
    #[instrument(level = "debug", skip_all, fields(chat_id = message.chat_id))]
    async fn send_message(&self, message: &OutgoingMessage) -> Result<(), Box<dyn Error>> {
        let _sent: serde_json::Value = self.call("sendMessage", message, CALL_TIMEOUT).await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn send_typing(&self, chat_id: i64) -> Result<(), Box<dyn Error>> {
        let params = json!({ "chat_id": chat_id, "action": "typing" });
        let _: bool = self.call("sendChatAction", &params, CALL_TIMEOUT).await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), Box<dyn Error>> {
        let mut params = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            params["text"] = json!(text);
        }
        let _: bool = self.call("answerCallbackQuery", &params, CALL_TIMEOUT).await?;
        Ok(())
    }
}

//! Data models shared by the scrapers, the relay and the Telegram client.
//!
//! This module defines:
//! - [`Article`]: a news item as produced by either retrieval path
//! - [`NewsApiResponse`]: the NewsAPI JSON envelope
//! - [`DialogEntry`]: one line of the per-user dialog log
//! - Telegram Bot API wire types ([`Update`], [`Message`], [`OutgoingMessage`], ...)
//!
//! Incoming wire types are lenient: missing fields fall back to defaults so a
//! partially populated payload still deserializes.

use serde::{Deserialize, Serialize};

/// A single news item summary.
///
/// Built once per request and discarded after rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Name of the originating publication.
    pub source: String,
    /// Headline text.
    pub title: String,
    /// Canonical link to the full story.
    pub url: String,
    /// API description or scraped excerpt (capped at 500 characters).
    pub summary: String,
    /// Publication timestamp as published by the source, scraped articles only.
    pub time: Option<String>,
}

/// NewsAPI response envelope for `/top-headlines` and `/everything`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewsApiResponse {
    pub status: String,
    pub articles: Vec<NewsApiArticle>,
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewsApiArticle {
    pub source: NewsApiSource,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewsApiSource {
    pub name: Option<String>,
}

impl From<NewsApiArticle> for Article {
    fn from(a: NewsApiArticle) -> Self {
        Article {
            source: a.source.name.unwrap_or_default(),
            title: a.title.unwrap_or_default(),
            url: a.url.unwrap_or_default(),
            summary: a.description.unwrap_or_default(),
            time: None,
        }
    }
}

/// One record of the per-user dialog log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogEntry {
    /// RFC 3339 UTC timestamp taken when the entry was created.
    pub timestamp: String,
    pub user_id: i64,
    pub username: Option<String>,
    pub message: String,
    /// `true` for messages sent by the bot.
    pub is_bot: bool,
}

impl DialogEntry {
    pub fn from_user(user_id: i64, username: Option<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            user_id,
            username,
            message: message.into(),
            is_bot: false,
        }
    }

    pub fn from_bot(chat_id: i64, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            user_id: chat_id,
            username: None,
            message: message.into(),
            is_bot: true,
        }
    }
}

// ---- Telegram Bot API ----

/// Envelope wrapping every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// Body of a `sendMessage` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_preview_options: Option<LinkPreviewOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

impl OutgoingMessage {
    pub fn plain(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: None,
            link_preview_options: None,
            reply_markup: None,
        }
    }

    pub fn html(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            parse_mode: Some("HTML".to_string()),
            ..Self::plain(chat_id, text)
        }
    }

    pub fn without_preview(mut self) -> Self {
        self.link_preview_options = Some(LinkPreviewOptions { is_disabled: true });
        self
    }

    pub fn with_markup(mut self, markup: ReplyMarkup) -> Self {
        self.reply_markup = Some(markup);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkPreviewOptions {
    pub is_disabled: bool,
}

/// Keyboards attached to outgoing messages.
///
/// Serialized untagged, so each variant produces exactly the object shape the
/// Bot API expects for `reply_markup`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Keyboard {
        keyboard: Vec<Vec<KeyboardButton>>,
        resize_keyboard: bool,
    },
    Remove {
        remove_keyboard: bool,
    },
    Inline {
        inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

//! Chat message content: fixed texts, article rendering and keyboards.
//!
//! Article messages use Telegram's HTML parse mode. Article fields come from
//! third parties, so they are escaped before being placed in markup.

use crate::models::{Article, InlineKeyboardButton, KeyboardButton, ReplyMarkup};
use crate::utils::upcase;
use html_escape::{encode_double_quoted_attribute, encode_text};
use itertools::Itertools;

pub const LATEST_BUTTON: &str = "📰 Latest news";
pub const SEARCH_BUTTON: &str = "🔍 Search news";
pub const CATEGORIES_BUTTON: &str = "📂 Categories";
pub const HELP_BUTTON: &str = "ℹ️ Help";

/// Prefix of inline-button callback data for category browse.
pub const CATEGORY_CALLBACK_PREFIX: &str = "cat_";

pub const WELCOME_TEXT: &str = "📰 <b>RBC news bot</b> 📰

Choose an action:
- 📰 Latest news: 5 fresh stories from rbc.ru
- 🔍 Search news: find news on a topic
- 📂 Categories: business, technology and more
- ℹ️ Help: how to use the bot";

pub const NEXT_ACTION_TEXT: &str = "Choose your next action:";
pub const LATEST_EMPTY_TEXT: &str = "😕 Could not load the news. Please try again later.";
pub const SEARCH_PROMPT_TEXT: &str = "🔍 Enter a keyword to search for:";
pub const KEYWORD_AS_TEXT: &str = "🔍 Please send the keyword as a text message:";
pub const SEARCH_CANCELLED_TEXT: &str = "Search cancelled.";
pub const CATEGORIES_PROMPT_TEXT: &str = "📂 Choose a news category:";

/// Help text; lists the categories offered in the inline keyboard.
pub fn help_text(categories: &[&str]) -> String {
    format!(
        "ℹ️ <b>How to use the bot</b>

<b>{LATEST_BUTTON}</b> - 5 fresh stories from rbc.ru
<b>{SEARCH_BUTTON}</b> - search by keyword (or send <code>/search terms</code>)
<b>{CATEGORIES_BUTTON}</b> - top headlines by category: {}

Send /cancel to abandon a search. After every answer the bot returns you to the main menu.",
        categories.iter().map(|c| upcase(c)).join(", ")
    )
}

pub fn nothing_found(keyword: &str) -> String {
    format!("Nothing found for '{keyword}'.")
}

pub fn category_empty(category: &str) -> String {
    format!("No news found in category '{category}'.")
}

pub fn category_loading(category: &str) -> String {
    format!("Loading {category}...")
}

/// Dialog log text recorded for a category button press.
pub fn selected_category(category: &str) -> String {
    format!("Selected category: {category}")
}

/// Main menu, two buttons per row.
pub fn main_keyboard() -> ReplyMarkup {
    let keyboard = [LATEST_BUTTON, SEARCH_BUTTON, CATEGORIES_BUTTON, HELP_BUTTON]
        .chunks(2)
        .map(|row| {
            row.iter()
                .map(|text| KeyboardButton {
                    text: text.to_string(),
                })
                .collect()
        })
        .collect();

    ReplyMarkup::Keyboard {
        keyboard,
        resize_keyboard: true,
    }
}

/// Hides the main menu while the bot waits for a keyword.
pub fn remove_keyboard() -> ReplyMarkup {
    ReplyMarkup::Remove {
        remove_keyboard: true,
    }
}

/// Inline keyboard with one button per category, two per row.
pub fn categories_keyboard(categories: &[&str]) -> ReplyMarkup {
    let inline_keyboard = categories
        .chunks(2)
        .map(|row| {
            row.iter()
                .map(|category| InlineKeyboardButton {
                    text: upcase(category),
                    callback_data: format!("{CATEGORY_CALLBACK_PREFIX}{category}"),
                })
                .collect()
        })
        .collect();

    ReplyMarkup::Inline { inline_keyboard }
}

/// Scraped headline: bold title, italic time, excerpt, link.
pub fn render_headline(article: &Article) -> String {
    let mut out = format!("<b>{}</b>\n", encode_text(&article.title));
    if let Some(time) = &article.time {
        out.push_str(&format!("<i>{}</i>\n", encode_text(time)));
    }
    out.push('\n');
    if !article.summary.is_empty() {
        out.push_str(&format!("{}\n", encode_text(&article.summary)));
    }
    out.push_str(&read_more(&article.url));
    out
}

/// API result: bold title, source in parentheses, description, link.
pub fn render_search_result(article: &Article) -> String {
    let mut out = format!(
        "<b>{}</b> ({})\n",
        encode_text(&article.title),
        encode_text(&article.source)
    );
    if !article.summary.is_empty() {
        out.push_str(&format!("{}\n", encode_text(&article.summary)));
    }
    out.push_str(&read_more(&article.url));
    out
}

fn read_more(url: &str) -> String {
    format!(r#"<a href="{}">Read more →</a>"#, encode_double_quoted_attribute(url))
}

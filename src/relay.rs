//! Conversation relay between chat updates and news retrieval.
//!
//! The relay maps menu buttons, commands, free text and inline-button
//! callbacks onto the three retrieval operations and renders the results.
//!
//! | Input | Action |
//! |-------|--------|
//! | `/start` | Welcome text and main menu |
//! | `/help`, *Help* | Help text and main menu |
//! | `/latest`, *Latest news* | Up to 5 scraped headlines |
//! | `/search`, *Search news* | Ask for a keyword, then up to 3 results |
//! | `/search <terms>` | Up to 3 results right away |
//! | `/categories`, *Categories* | Inline keyboard of categories |
//! | callback `cat_<name>` | Up to 3 top headlines for `<name>` |
//! | `/cancel` | Leave the keyword prompt |
//!
//! # Keyword State
//!
//! The only state is the set of users who pressed *Search news* and have not
//! sent their keyword yet. Their next text message is the keyword; a command
//! or menu button instead clears the state and is handled normally.
//!
//! # Logging
//!
//! Every inbound message is recorded in the dialog log before it is handled,
//! and every reply just before it is sent. Transport and log failures are
//! reported through `tracing` and never abort handling of an update.

use crate::api::ChatApi;
use crate::models::{Article, CallbackQuery, DialogEntry, Message, OutgoingMessage, Update};
use crate::outputs::dialog_log::DialogLog;
use crate::outputs::messages::{self, CATEGORY_CALLBACK_PREFIX};
use crate::scrapers::NewsSource;
use crate::scrapers::newsapi::RESULT_LIMIT;
use crate::scrapers::rbc::LATEST_LIMIT;
use crate::utils::truncate_for_log;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Start,
    Help,
    Latest,
    /// Keyword given inline with `/search`, if any.
    Search(Option<String>),
    Categories,
    Cancel,
}

/// Recognize a menu button or a bot command.
///
/// Commands may carry a `@botname` suffix as sent in group chats. Unknown
/// commands are not recognized and fall through to free-text handling.
fn parse_command(text: &str) -> Option<Command> {
    match text {
        messages::LATEST_BUTTON => return Some(Command::Latest),
        messages::SEARCH_BUTTON => return Some(Command::Search(None)),
        messages::CATEGORIES_BUTTON => return Some(Command::Categories),
        messages::HELP_BUTTON => return Some(Command::Help),
        _ => {}
    }

    let rest = text.strip_prefix('/')?;
    let (head, args) = rest
        .split_once(char::is_whitespace)
        .map(|(head, args)| (head, args.trim()))
        .unwrap_or((rest, ""));
    let name = head.split_once('@').map_or(head, |(name, _)| name);

    match name {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        "latest" => Some(Command::Latest),
        "search" => Some(Command::Search((!args.is_empty()).then(|| args.to_string()))),
        "categories" => Some(Command::Categories),
        "cancel" => Some(Command::Cancel),
        _ => None,
    }
}

/// Handles chat updates one at a time.
pub struct Relay<S, C, L> {
    news: S,
    chat: C,
    log: L,
    awaiting_keyword: HashSet<i64>,
}

impl<S, C, L> Relay<S, C, L>
where
    S: NewsSource,
    C: ChatApi,
    L: DialogLog,
{
    pub fn new(news: S, chat: C, log: L) -> Self {
        Self {
            news,
            chat,
            log,
            awaiting_keyword: HashSet::new(),
        }
    }

    /// Whether `user_id`'s next text message will be taken as a keyword.
    pub fn is_awaiting_keyword(&self, user_id: i64) -> bool {
        self.awaiting_keyword.contains(&user_id)
    }

    /// Handle a single update to completion.
    #[instrument(level = "info", skip_all, fields(update_id = update.update_id))]
    pub async fn handle(&mut self, update: Update) {
        if let Some(query) = update.callback_query {
            self.handle_callback(query).await;
        } else if let Some(message) = update.message {
            self.handle_message(message).await;
        } else {
            debug!("Ignoring update without message or callback");
        }
    }

    async fn handle_message(&mut self, message: Message) {
        let chat_id = message.chat.id;
        let (user_id, username) = match &message.from {
            Some(user) => (user.id, user.username.clone()),
            None => (chat_id, None),
        };
        let text = message.text.as_deref().map(str::trim);

        self.record(DialogEntry::from_user(user_id, username, text.unwrap_or_default()))
            .await;

        let awaiting = self.awaiting_keyword.remove(&user_id);
        match (text.and_then(parse_command), text) {
            (Some(command), _) => {
                info!(user_id, ?command, "Handling command");
                self.run_command(chat_id, user_id, command).await;
            }
            (None, Some(keyword)) if awaiting && !keyword.is_empty() => {
                self.search(chat_id, keyword).await;
            }
            (None, _) if awaiting => {
                self.awaiting_keyword.insert(user_id);
                self.say(OutgoingMessage::plain(chat_id, messages::KEYWORD_AS_TEXT)).await;
            }
            (None, _) => debug!(user_id, "Free text outside of a search; logged only"),
        }
    }

    async fn run_command(&mut self, chat_id: i64, user_id: i64, command: Command) {
        match command {
            Command::Start => {
                self.say(OutgoingMessage::html(chat_id, messages::WELCOME_TEXT).with_markup(messages::main_keyboard()))
                    .await;
            }
            Command::Help => {
                let help = messages::help_text(self.news.categories());
                self.say(OutgoingMessage::html(chat_id, help).with_markup(messages::main_keyboard()))
                    .await;
            }
            Command::Latest => self.latest(chat_id).await,
            Command::Search(Some(keyword)) => self.search(chat_id, &keyword).await,
            Command::Search(None) => {
                self.awaiting_keyword.insert(user_id);
                self.say(
                    OutgoingMessage::plain(chat_id, messages::SEARCH_PROMPT_TEXT)
                        .with_markup(messages::remove_keyboard()),
                )
                .await;
            }
            Command::Categories => {
                let keyboard = messages::categories_keyboard(self.news.categories());
                self.say(OutgoingMessage::plain(chat_id, messages::CATEGORIES_PROMPT_TEXT).with_markup(keyboard))
                    .await;
            }
            Command::Cancel => {
                self.say(
                    OutgoingMessage::plain(chat_id, messages::SEARCH_CANCELLED_TEXT)
                        .with_markup(messages::main_keyboard()),
                )
                .await;
            }
        }
    }

    async fn handle_callback(&mut self, query: CallbackQuery) {
        let category = query
            .data
            .as_deref()
            .and_then(|data| data.strip_prefix(CATEGORY_CALLBACK_PREFIX));
        let Some(category) = category else {
            debug!(data = ?query.data, "Unknown callback data; acknowledging only");
            self.acknowledge(&query.id, None).await;
            return;
        };

        let chat_id = query.message.as_ref().map_or(query.from.id, |m| m.chat.id);
        info!(user_id = query.from.id, category, "Category selected");
        self.record(DialogEntry::from_user(
            query.from.id,
            query.from.username.clone(),
            messages::selected_category(category),
        ))
        .await;
        self.acknowledge(&query.id, Some(&messages::category_loading(category)))
            .await;

        self.typing(chat_id).await;
        let articles = self.news.by_category(category).await;
        self.send_results(chat_id, &articles, messages::category_empty(category))
            .await;
    }

    async fn latest(&mut self, chat_id: i64) {
        self.typing(chat_id).await;
        let articles = self.news.latest_headlines().await;

        if articles.is_empty() {
            self.say(OutgoingMessage::plain(chat_id, messages::LATEST_EMPTY_TEXT).with_markup(messages::main_keyboard()))
                .await;
            return;
        }

        for article in articles.iter().take(LATEST_LIMIT) {
            self.say(OutgoingMessage::html(chat_id, messages::render_headline(article)).without_preview())
                .await;
        }
        self.next_action(chat_id).await;
    }

    async fn search(&mut self, chat_id: i64, keyword: &str) {
        self.typing(chat_id).await;
        let articles = self.news.by_keyword(keyword).await;
        self.send_results(chat_id, &articles, messages::nothing_found(keyword))
            .await;
    }

    async fn send_results(&mut self, chat_id: i64, articles: &[Article], empty_text: String) {
        if articles.is_empty() {
            self.say(OutgoingMessage::plain(chat_id, empty_text).with_markup(messages::main_keyboard()))
                .await;
            return;
        }

        for article in articles.iter().take(RESULT_LIMIT) {
            self.say(OutgoingMessage::html(chat_id, messages::render_search_result(article)).without_preview())
                .await;
        }
        self.next_action(chat_id).await;
    }

    async fn next_action(&mut self, chat_id: i64) {
        self.say(OutgoingMessage::plain(chat_id, messages::NEXT_ACTION_TEXT).with_markup(messages::main_keyboard()))
            .await;
    }

    /// Log then send a reply.
    async fn say(&mut self, message: OutgoingMessage) {
        self.record(DialogEntry::from_bot(message.chat_id, message.text.clone()))
            .await;

        if let Err(e) = self.chat.send_message(&message).await {
            warn!(
                chat_id = message.chat_id,
                error = %e,
                text = %truncate_for_log(&message.text, 80),
                "Failed to send message"
            );
        }
    }

    async fn typing(&mut self, chat_id: i64) {
        if let Err(e) = self.chat.send_typing(chat_id).await {
            debug!(chat_id, error = %e, "Failed to send typing action");
        }
    }

    async fn acknowledge(&mut self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self.chat.answer_callback(callback_id, text).await {
            warn!(callback_id, error = %e, "Failed to answer callback query");
        }
    }

    async fn record(&mut self, entry: DialogEntry) {
        if let Err(e) = self.log.record(&entry).await {
            warn!(user_id = entry.user_id, error = %e, "Failed to write dialog log");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Chat, ReplyMarkup, User};
    use std::error::Error;
    use std::sync::Mutex;

    const USER: i64 = 100;
    const CHAT: i64 = 200;

    #[derive(Default)]
    struct FakeNews {
        latest: Vec<Article>,
        results: Vec<Article>,
        calls: Mutex<Vec<String>>,
    }

    impl NewsSource for FakeNews {
        async fn latest_headlines(&self) -> Vec<Article> {
            self.calls.lock().unwrap().push("latest".to_string());
            self.latest.clone()
        }

        async fn by_category(&self, category: &str) -> Vec<Article> {
            self.calls.lock().unwrap().push(format!("category:{category}"));
            self.results.clone()
        }

        async fn by_keyword(&self, keyword: &str) -> Vec<Article> {
            self.calls.lock().unwrap().push(format!("keyword:{keyword}"));
            self.results.clone()
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Message(OutgoingMessage),
        Typing(i64),
        Answer(String, Option<String>),
    }

    #[derive(Default)]
    struct RecordingChat {
        sent: Mutex<Vec<Sent>>,
        fail: bool,
    }

    impl RecordingChat {
        fn push(&self, sent: Sent) -> Result<(), Box<dyn Error>> {
            self.sent.lock().unwrap().push(sent);
            if self.fail {
                return Err("transport down".into());
            }
            Ok(())
        }
    }

    impl ChatApi for RecordingChat {
        async fn send_message(&self, message: &OutgoingMessage) -> Result<(), Box<dyn Error>> {
            self.push(Sent::Message(message.clone()))
        }

        async fn send_typing(&self, chat_id: i64) -> Result<(), Box<dyn Error>> {
            self.push(Sent::Typing(chat_id))
        }

        async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), Box<dyn Error>> {
            self.push(Sent::Answer(callback_id.to_string(), text.map(str::to_string)))
        }
    }

    #[derive(Default)]
    struct MemoryLog {
        entries: Mutex<Vec<DialogEntry>>,
    }

    impl DialogLog for MemoryLog {
        async fn record(&self, entry: &DialogEntry) -> Result<(), Box<dyn Error>> {
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }
    }

    type TestRelay = Relay<FakeNews, RecordingChat, MemoryLog>;

    fn relay(news: FakeNews) -> TestRelay {
        Relay::new(news, RecordingChat::default(), MemoryLog::default())
    }

    fn articles(n: usize) -> Vec<Article> {
        (1..=n)
            .map(|i| Article {
                source: format!("Source {i}"),
                title: format!("Title {i}"),
                url: format!("https://news.example/{i}"),
                summary: format!("Summary {i}"),
                time: None,
            })
            .collect()
    }

    fn text_update(text: &str) -> Update {
        Update {
            update_id: 1,
            message: Some(Message {
                message_id: 1,
                chat: Chat { id: CHAT },
                from: Some(User {
                    id: USER,
                    is_bot: false,
                    first_name: "Ann".to_string(),
                    username: Some("ann".to_string()),
                }),
                text: Some(text.to_string()),
            }),
            callback_query: None,
        }
    }

    fn callback_update(data: &str) -> Update {
        Update {
            update_id: 2,
            message: None,
            callback_query: Some(CallbackQuery {
                id: "cb-1".to_string(),
                from: User {
                    id: USER,
                    is_bot: false,
                    first_name: "Ann".to_string(),
                    username: None,
                },
                message: Some(Message {
                    message_id: 5,
                    chat: Chat { id: CHAT },
                    from: None,
                    text: Some(messages::CATEGORIES_PROMPT_TEXT.to_string()),
                }),
                data: Some(data.to_string()),
            }),
        }
    }

    fn sent(relay: &TestRelay) -> Vec<Sent> {
        relay.chat.sent.lock().unwrap().clone()
    }

    fn sent_texts(relay: &TestRelay) -> Vec<String> {
        sent(relay)
            .into_iter()
            .filter_map(|s| match s {
                Sent::Message(m) => Some(m.text),
                _ => None,
            })
            .collect()
    }

    fn calls(relay: &TestRelay) -> Vec<String> {
        relay.news.calls.lock().unwrap().clone()
    }

    fn log(relay: &TestRelay) -> Vec<DialogEntry> {
        relay.log.entries.lock().unwrap().clone()
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/help@RbcNewsBot"), Some(Command::Help));
        assert_eq!(
            parse_command("/search  oil prices "),
            Some(Command::Search(Some("oil prices".to_string())))
        );
        assert_eq!(parse_command("/search"), Some(Command::Search(None)));
        assert_eq!(parse_command(messages::CATEGORIES_BUTTON), Some(Command::Categories));
        assert_eq!(parse_command("/unknown"), None);
        assert_eq!(parse_command("hello"), None);
    }

    #[tokio::test]
    async fn test_start_sends_welcome_and_logs_both_sides() {
        let mut relay = relay(FakeNews::default());
        relay.handle(text_update("/start")).await;

        let sent = sent(&relay);
        assert_eq!(sent.len(), 1);
        let Sent::Message(welcome) = &sent[0] else {
            panic!("expected a message");
        };
        assert_eq!(welcome.chat_id, CHAT);
        assert_eq!(welcome.text, messages::WELCOME_TEXT);
        assert_eq!(welcome.parse_mode.as_deref(), Some("HTML"));
        assert!(matches!(welcome.reply_markup, Some(ReplyMarkup::Keyboard { .. })));

        let log = log(&relay);
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].user_id, USER);
        assert_eq!(log[0].username.as_deref(), Some("ann"));
        assert_eq!(log[0].message, "/start");
        assert!(!log[0].is_bot);
        assert!(log[1].is_bot);
        assert_eq!(log[1].user_id, CHAT);
    }

    #[tokio::test]
    async fn test_latest_caps_at_five_and_ends_with_menu() {
        let mut relay = relay(FakeNews {
            latest: articles(7),
            ..FakeNews::default()
        });
        relay.handle(text_update(messages::LATEST_BUTTON)).await;

        let sent = sent(&relay);
        assert_eq!(sent[0], Sent::Typing(CHAT));
        let texts = sent_texts(&relay);
        assert_eq!(texts.len(), 6);
        assert!(texts[0].starts_with("<b>Title 1</b>"));
        assert!(texts[4].starts_with("<b>Title 5</b>"));
        assert_eq!(texts[5], messages::NEXT_ACTION_TEXT);
        assert_eq!(calls(&relay), vec!["latest"]);
    }

    #[tokio::test]
    async fn test_latest_empty_renders_fixed_message() {
        let mut relay = relay(FakeNews::default());
        relay.handle(text_update("/latest")).await;
        assert_eq!(sent_texts(&relay), vec![messages::LATEST_EMPTY_TEXT]);
    }

    #[tokio::test]
    async fn test_keyword_search_takes_one_extra_round_trip() {
        let mut relay = relay(FakeNews {
            results: articles(4),
            ..FakeNews::default()
        });

        relay.handle(text_update(messages::SEARCH_BUTTON)).await;
        assert!(relay.is_awaiting_keyword(USER));
        assert!(calls(&relay).is_empty());
        let Some(Sent::Message(prompt)) = sent(&relay).pop() else {
            panic!("expected a prompt");
        };
        assert_eq!(prompt.text, messages::SEARCH_PROMPT_TEXT);
        assert_eq!(prompt.reply_markup, Some(messages::remove_keyboard()));

        relay.handle(text_update("  bitcoin  ")).await;
        assert!(!relay.is_awaiting_keyword(USER));
        assert_eq!(calls(&relay), vec!["keyword:bitcoin"]);

        let texts = sent_texts(&relay);
        assert_eq!(texts.len(), 1 + 3 + 1);
        assert!(texts[1].starts_with("<b>Title 1</b> (Source 1)"));
        assert_eq!(texts[4], messages::NEXT_ACTION_TEXT);
    }

    #[tokio::test]
    async fn test_keyword_search_without_results() {
        let mut relay = relay(FakeNews::default());
        relay.handle(text_update("/search quantum gravity")).await;

        assert_eq!(calls(&relay), vec!["keyword:quantum gravity"]);
        assert_eq!(
            sent_texts(&relay),
            vec![messages::nothing_found("quantum gravity")]
        );
    }

    #[tokio::test]
    async fn test_command_while_awaiting_keyword_resets_state() {
        let mut relay = relay(FakeNews::default());
        relay.handle(text_update(messages::SEARCH_BUTTON)).await;
        relay.handle(text_update("/help")).await;

        assert!(!relay.is_awaiting_keyword(USER));
        assert!(calls(&relay).is_empty());
        assert!(sent_texts(&relay)[1].contains("How to use the bot"));
    }

    #[tokio::test]
    async fn test_cancel_leaves_keyword_prompt() {
        let mut relay = relay(FakeNews::default());
        relay.handle(text_update("/search")).await;
        relay.handle(text_update("/cancel")).await;
        relay.handle(text_update("bitcoin")).await;

        assert!(calls(&relay).is_empty());
        assert_eq!(sent_texts(&relay).last().unwrap(), messages::SEARCH_CANCELLED_TEXT);
    }

    #[tokio::test]
    async fn test_non_text_message_keeps_waiting() {
        let mut relay = relay(FakeNews::default());
        relay.handle(text_update(messages::SEARCH_BUTTON)).await;

        let mut sticker = text_update("");
        sticker.message.as_mut().unwrap().text = None;
        relay.handle(sticker).await;

        assert!(relay.is_awaiting_keyword(USER));
        assert_eq!(sent_texts(&relay).last().unwrap(), messages::KEYWORD_AS_TEXT);
    }

    #[tokio::test]
    async fn test_category_callback() {
        let mut relay = relay(FakeNews {
            results: articles(5),
            ..FakeNews::default()
        });
        relay.handle(callback_update("cat_science")).await;

        let sent = sent(&relay);
        assert_eq!(
            sent[0],
            Sent::Answer("cb-1".to_string(), Some("Loading science...".to_string()))
        );
        assert_eq!(sent[1], Sent::Typing(CHAT));
        assert_eq!(calls(&relay), vec!["category:science"]);
        assert_eq!(sent_texts(&relay).len(), 3 + 1);
        assert_eq!(log(&relay)[0].message, "Selected category: science");
    }

    #[tokio::test]
    async fn test_unlisted_category_is_still_requested() {
        let mut relay = relay(FakeNews::default());
        relay.handle(callback_update("cat_weather")).await;

        assert_eq!(calls(&relay), vec!["category:weather"]);
        assert_eq!(sent_texts(&relay), vec![messages::category_empty("weather")]);
    }

    #[tokio::test]
    async fn test_unknown_callback_is_only_acknowledged() {
        let mut relay = relay(FakeNews::default());
        relay.handle(callback_update("something_else")).await;

        assert_eq!(sent(&relay), vec![Sent::Answer("cb-1".to_string(), None)]);
        assert!(calls(&relay).is_empty());
        assert!(log(&relay).is_empty());
    }

    #[tokio::test]
    async fn test_categories_menu() {
        let mut relay = relay(FakeNews::default());
        relay.handle(text_update("/categories")).await;

        let Some(Sent::Message(menu)) = sent(&relay).pop() else {
            panic!("expected a message");
        };
        let Some(ReplyMarkup::Inline { inline_keyboard }) = menu.reply_markup else {
            panic!("expected inline keyboard");
        };
        let buttons: Vec<_> = inline_keyboard.into_iter().flatten().collect();
        assert_eq!(buttons.len(), 7);
        assert_eq!(buttons[0].callback_data, "cat_business");
    }

    #[tokio::test]
    async fn test_idle_free_text_is_logged_only() {
        let mut relay = relay(FakeNews::default());
        relay.handle(text_update("good morning")).await;

        assert!(sent(&relay).is_empty());
        assert_eq!(log(&relay).len(), 1);
        assert_eq!(log(&relay)[0].message, "good morning");
    }

    #[tokio::test]
    async fn test_send_failures_do_not_abort_handling() {
        let mut relay = Relay::new(
            FakeNews {
                latest: articles(2),
                ..FakeNews::default()
            },
            RecordingChat {
                fail: true,
                ..RecordingChat::default()
            },
            MemoryLog::default(),
        );
        relay.handle(text_update(messages::LATEST_BUTTON)).await;

        assert_eq!(sent_texts(&relay).len(), 3);
        assert_eq!(log(&relay).iter().filter(|e| e.is_bot).count(), 3);
    }
}

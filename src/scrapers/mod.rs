//! News retrieval for the bot.
//!
//! Two sources back the three retrieval operations:
//!
//! | Operation | Module | Method | Cap |
//! |-----------|--------|--------|-----|
//! | Latest headlines | [`rbc`] | HTML scraping of the RBC homepage and article pages | 5 |
//! | Category browse | [`newsapi`] | NewsAPI `/top-headlines?category=` | 3 |
//! | Keyword search | [`newsapi`] | NewsAPI `/everything?q=` | 3 |
//!
//! # Failure Policy
//!
//! Every operation returns a plain `Vec<Article>`. Network errors, non-2xx
//! statuses, markup changes and malformed JSON are logged and collapse into an
//! empty list, which the relay renders as a "nothing found" message. There is
//! no retry; each request carries a single timeout from [`BotConfig`].

use crate::config::BotConfig;
use crate::models::Article;
use reqwest::Client;
use std::error::Error;
use std::fmt;

pub mod newsapi;
pub mod rbc;

/// The retrieval surface the relay depends on.
pub trait NewsSource {
    /// Up to five latest headlines scraped from the news homepage.
    async fn latest_headlines(&self) -> Vec<Article>;

    /// Up to three top headlines for `category`.
    ///
    /// The category is sent upstream as-is, even when it is not one of
    /// [`NewsSource::categories`].
    async fn by_category(&self, category: &str) -> Vec<Article>;

    /// Up to three articles matching free-text `keyword`.
    async fn by_keyword(&self, keyword: &str) -> Vec<Article>;

    /// Category names offered to users.
    fn categories(&self) -> &'static [&'static str] {
        &newsapi::CATEGORIES
    }
}

/// [`NewsSource`] backed by the RBC homepage and NewsAPI.
pub struct NewsClient {
    client: Client,
    config: BotConfig,
    api_key: String,
}

impl NewsClient {
    /// Build a client with a shared connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying `reqwest::Client` cannot be built.
    pub fn new(config: BotConfig, api_key: impl Into<String>) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
        })
    }
}

impl fmt::Debug for NewsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsClient")
            .field("homepage_url", &self.config.homepage_url)
            .field("news_api_url", &self.config.news_api_url)
            .finish_non_exhaustive()
    }
}

impl NewsSource for NewsClient {
    async fn latest_headlines(&self) -> Vec<Article> {
        rbc::latest_headlines(&self.client, &self.config).await
    }

    async fn by_category(&self, category: &str) -> Vec<Article> {
        newsapi::by_category(&self.client, &self.config, &self.api_key, category).await
    }

    async fn by_keyword(&self, keyword: &str) -> Vec<Article> {
        newsapi::by_keyword(&self.client, &self.config, &self.api_key, keyword).await
    }
}

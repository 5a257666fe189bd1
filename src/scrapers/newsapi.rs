//! NewsAPI client for category browse and keyword search.
//!
//! Both operations hit [NewsAPI](https://newsapi.org/docs) with a page size of
//! three and map `articles[]` into [`Article`]s. The API key travels as the
//! `apiKey` query parameter, so request URLs are never logged.
//!
//! | Operation | Endpoint | Filter |
//! |-----------|----------|--------|
//! | [`by_category`] | `/top-headlines` | `category=<name>` |
//! | [`by_keyword`] | `/everything` | `q=<terms>` |

use crate::config::BotConfig;
use crate::models::{Article, NewsApiResponse};
use reqwest::Client;
use std::error::Error;
use tracing::{info, instrument, warn};
use url::Url;

/// Maximum number of articles returned by either operation.
pub const RESULT_LIMIT: usize = 3;

/// Categories accepted by `/top-headlines`.
pub const CATEGORIES: [&str; 7] = [
    "business",
    "entertainment",
    "general",
    "health",
    "science",
    "sports",
    "technology",
];

/// Top headlines for `category`, at most [`RESULT_LIMIT`].
///
/// The category is not checked against [`CATEGORIES`]; an unknown one is sent
/// as-is and whatever NewsAPI answers (usually nothing) is returned.
#[instrument(level = "info", skip(client, config, api_key))]
pub async fn by_category(client: &Client, config: &BotConfig, api_key: &str, category: &str) -> Vec<Article> {
    match fetch(client, config, api_key, "top-headlines", ("category", category)).await {
        Ok(articles) => articles,
        Err(e) => {
            warn!(error = %e, "NewsAPI category request failed");
            Vec::new()
        }
    }
}

/// Full-text search for `keyword`, at most [`RESULT_LIMIT`].
#[instrument(level = "info", skip(client, config, api_key))]
pub async fn by_keyword(client: &Client, config: &BotConfig, api_key: &str, keyword: &str) -> Vec<Article> {
    match fetch(client, config, api_key, "everything", ("q", keyword)).await {
        Ok(articles) => articles,
        Err(e) => {
            warn!(error = %e, "NewsAPI search request failed");
            Vec::new()
        }
    }
}

async fn fetch(
    client: &Client,
    config: &BotConfig,
    api_key: &str,
    endpoint: &str,
    filter: (&str, &str),
) -> Result<Vec<Article>, Box<dyn Error>> {
    let mut url = Url::parse(&format!("{}/{}", config.news_api_url.trim_end_matches('/'), endpoint))?;
    url.query_pairs_mut()
        .append_pair(filter.0, filter.1)
        .append_pair("apiKey", api_key)
        .append_pair("pageSize", &RESULT_LIMIT.to_string());

    let response: NewsApiResponse = client
        .get(url)
        .timeout(config.news_api_timeout())
        .send()
        .await
        .map_err(|e| e.without_url())?
        .error_for_status()
        .map_err(|e| e.without_url())?
        .json()
        .await
        .map_err(|e| e.without_url())?;

    if response.status != "ok" {
        return Err(format!(
            "NewsAPI returned status '{}' ({}): {}",
            response.status,
            response.code.unwrap_or_default(),
            response.message.unwrap_or_default()
        )
        .into());
    }

    let articles: Vec<Article> = response
        .articles
        .into_iter()
        .take(RESULT_LIMIT)
        .map(Article::from)
        .collect();

    info!(endpoint, count = articles.len(), "Fetched NewsAPI articles");
    Ok(articles)
}

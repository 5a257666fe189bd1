//! RBC homepage scraper for the latest headlines.
//!
//! The homepage carries a news feed (`.js-news-feed-list`) whose entries
//! (`a.news-feed__item`) link to full article pages. Only the first five
//! entries are used. Each article page is fetched in turn to build a short
//! excerpt and read the publication time.
//!
//! # Selectors
//!
//! | What | Selector |
//! |------|----------|
//! | Feed entry | `.js-news-feed-list a.news-feed__item` |
//! | Article text | `.article__text__overview, .article__text p` |
//! | Publication time | `.article__header__date` (`content` attribute) |

use crate::config::BotConfig;
use crate::models::Article;
use crate::utils::{collapse_whitespace, truncate_excerpt};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use scraper::{Html, Selector};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Publication name attached to scraped articles.
pub const SOURCE_NAME: &str = "RBC";

/// Number of feed entries turned into articles.
pub const LATEST_LIMIT: usize = 5;

static FEED_ITEM: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".js-news-feed-list a.news-feed__item").expect("valid feed selector")
});
static ARTICLE_TEXT: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".article__text__overview, .article__text p").expect("valid text selector")
});
static PUBLISHED_AT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".article__header__date").expect("valid date selector"));

/// A feed entry discovered on the homepage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedLink {
    pub title: String,
    pub url: String,
}

/// Scrape up to [`LATEST_LIMIT`] latest headlines.
///
/// Never fails: a homepage error yields an empty list, and an article page
/// that cannot be fetched is skipped without affecting the others.
#[instrument(level = "info", skip_all, fields(homepage = %config.homepage_url))]
pub async fn latest_headlines(client: &Client, config: &BotConfig) -> Vec<Article> {
    let links = match index_articles(client, config).await {
        Ok(links) => links,
        Err(e) => {
            warn!(error = %e, "RBC homepage fetch failed");
            return Vec::new();
        }
    };

    fetch_articles(client, config, links).await
}

/// Fetch the homepage and extract the first feed entries.
#[instrument(level = "info", skip_all)]
async fn index_articles(client: &Client, config: &BotConfig) -> Result<Vec<FeedLink>, Box<dyn Error>> {
    let base_url = Url::parse(&config.homepage_url)?;
    let html = get_page(client, base_url.as_str(), &config.user_agent, config.homepage_timeout()).await?;
    let links = parse_feed(&html, &base_url);

    info!(count = links.len(), "Indexed RBC feed entries");
    debug!(urls = ?links.iter().map(|l| &l.url).collect::<Vec<_>>(), "RBC URLs");
    Ok(links)
}

/// Fetch article pages one after another, dropping failures.
#[instrument(level = "info", skip_all, fields(count = links.len()))]
async fn fetch_articles(client: &Client, config: &BotConfig, links: Vec<FeedLink>) -> Vec<Article> {
    let articles: Vec<Article> = stream::iter(links)
        .then(|link| async move {
            match fetch_article(client, config, &link).await {
                Ok(article) => {
                    debug!(url = %link.url, "Fetched RBC article");
                    Some(article)
                }
                Err(e) => {
                    warn!(error = %e, url = %link.url, "RBC article fetch failed; skipping");
                    None
                }
            }
        })
        .filter_map(|opt| std::future::ready(opt))
        .collect()
        .await;

    info!(count = articles.len(), "Fetched RBC article contents");
    articles
}

/// Fetch a single article page
#[instrument(level = "debug", skip_all, fields(url = %link.url))]
async fn fetch_article(client: &Client, config: &BotConfig, link: &FeedLink) -> Result<Article, Box<dyn Error>> {
    let body = get_page(client, &link.url, &config.user_agent, config.article_timeout()).await?;
    let (summary, time) = parse_article(&body);

    debug!(chars = summary.chars().count(), has_time = time.is_some(), "Parsed RBC article");
    Ok(Article {
        source: SOURCE_NAME.to_string(),
        title: link.title.clone(),
        url: link.url.clone(),
        summary,
        time,
    })
}

async fn get_page(client: &Client, url: &str, user_agent: &str, timeout: Duration) -> Result<String, Box<dyn Error>> {
    let body = client
        .get(url)
        .header(USER_AGENT, user_agent)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(body)
}

/// Extract the first [`LATEST_LIMIT`] feed entries from homepage HTML.
///
/// Links are resolved against `base_url`; entries without a usable `href`
/// are skipped.
pub fn parse_feed(html: &str, base_url: &Url) -> Vec<FeedLink> {
    let document = Html::parse_document(html);

    document
        .select(&FEED_ITEM)
        .take(LATEST_LIMIT)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            let url = base_url.join(href).ok()?;
            Some(FeedLink {
                title: collapse_whitespace(&element.text().collect::<String>()),
                url: url.to_string(),
            })
        })
        .collect()
}

/// Extract the excerpt and publication time from an article page.
///
/// Paragraph fragments are trimmed and concatenated, whitespace is collapsed,
/// and the result is capped by [`truncate_excerpt`].
pub fn parse_article(html: &str) -> (String, Option<String>) {
    let document = Html::parse_document(html);

    let mut text = String::new();
    for node in document.select(&ARTICLE_TEXT) {
        let fragment: String = node.text().map(str::trim).collect();
        if !fragment.is_empty() {
            text.push_str(&fragment);
            text.push_str("\n\n");
        }
    }

    let time = document
        .select(&PUBLISHED_AT)
        .next()
        .and_then(|el| el.value().attr("content"))
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    (truncate_excerpt(&collapse_whitespace(&text)), time)
}

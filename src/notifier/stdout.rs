use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::{Result, TidingsError};
use crate::domain::{Article, Feed};

/// Prints each notification as a JSON document on standard output.
pub struct Stdout;

#[derive(Debug, Serialize)]
struct FeedSummary<'a> {
    id: &'a str,
    display_name: &'a str,
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct ArticleSummary<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    guid: &'a str,
    title: &'a str,
    link: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct ArticleNotification<'a> {
    feed: FeedSummary<'a>,
    article: ArticleSummary<'a>,
    timestamp: DateTime<Utc>,
}

impl Stdout {
    pub fn render(feed: &Feed, article: &Article, timestamp: DateTime<Utc>) -> Result<String> {
        let notification = ArticleNotification {
            feed: FeedSummary {
                id: &feed.id,
                display_name: &feed.display_name,
                url: &feed.url,
            },
            article: ArticleSummary {
                guid: &article.guid,
                title: &article.title,
                link: &article.link,
                description: article.summary.as_deref().filter(|s| !s.is_empty()),
                content: article.content.as_deref().filter(|s| !s.is_empty()),
                published: article.published_at,
                updated: article.updated_at,
            },
            timestamp,
        };

        serde_json::to_string_pretty(&notification)
            .map_err(|e| TidingsError::Notify(format!("failed to encode notification: {}", e)))
    }

    pub fn send(&self, feed: &Feed, article: &Article) -> Result<()> {
        let json = Self::render(feed, article, Utc::now())?;
        println!("{}", json);
        Ok(())
    }
}

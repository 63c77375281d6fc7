use chrono::Utc;
use feed_rs::model::Entry;
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{Result, TidingsError};
use crate::domain::Article;

/// Turns a raw RSS/Atom/JSON Feed document into [`Article`]s.
#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, body: &[u8]) -> Result<Vec<Article>> {
        // feed-rs would otherwise synthesize ids for entries lacking one,
        // hiding the link/title fallback used for dedup.
        let feed = parser::Builder::new()
            .id_generator(|_links, _title, _uri| String::new())
            .build()
            .parse(body)
            .map_err(|e| TidingsError::FeedParse(e.to_string()))?;

        Ok(feed.entries.into_iter().map(to_article).collect())
    }
}

fn decode(s: &str) -> String {
    decode_html_entities(s).trim().to_string()
}

fn to_article(entry: Entry) -> Article {
    Article {
        guid: entry.id.trim().to_string(),
        title: entry.title.map(|t| decode(&t.content)).unwrap_or_default(),
        link: entry
            .links
            .first()
            .map(|l| l.href.trim().to_string())
            .unwrap_or_default(),
        content: entry
            .content
            .and_then(|c| c.body)
            .map(|b| decode_html_entities(&b).to_string()),
        summary: entry.summary.map(|s| decode_html_entities(&s.content).to_string()),
        published_at: entry.published.map(|dt| dt.with_timezone(&Utc)),
        updated_at: entry.updated.map(|dt| dt.with_timezone(&Utc)),
    }
}

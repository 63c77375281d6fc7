use reqwest::{Client, StatusCode};

use crate::app::{Result, TidingsError};
use crate::config::PushoverSettings;
use crate::domain::{Article, Feed};

pub const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Sends push notifications through the Pushover API.
pub struct Pushover {
    client: Client,
    settings: PushoverSettings,
}

impl Pushover {
    pub fn new(client: Client, settings: PushoverSettings) -> Self {
        Self { client, settings }
    }

    pub fn form_fields<'a>(&'a self, feed: &'a Feed, article: &'a Article) -> [(&'static str, &'a str); 6] {
        [
            ("token", self.settings.app_token.as_str()),
            ("user", self.settings.user_key.as_str()),
            ("title", feed.display_name.as_str()),
            ("url", article.link.as_str()),
            ("url_title", "Open article"),
            ("message", article.display_title()),
        ]
    }

    pub async fn send(&self, feed: &Feed, article: &Article) -> Result<()> {
        let response = self
            .client
            .post(PUSHOVER_API_URL)
            .form(&self.form_fields(feed, article))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(TidingsError::Notify(format!(
                "Pushover API error: {}",
                response.status().as_u16()
            )));
        }

        Ok(())
    }
}

use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::app::{Result, TidingsError};
use crate::config::MattermostWebhookSettings;
use crate::domain::{Article, Feed};

const TEXT_WIDTH: usize = 120;

/// Posts article attachments to a Mattermost incoming webhook.
pub struct MattermostWebhook {
    client: Client,
    settings: MattermostWebhookSettings,
}

#[derive(Debug, Serialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fallback: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title_link: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub attachments: Vec<Attachment>,
}

impl MattermostWebhook {
    pub fn new(client: Client, settings: MattermostWebhookSettings) -> Self {
        Self { client, settings }
    }

    pub fn build_message(&self, feed: &Feed, article: &Article) -> Message {
        let mut title = article.display_title().to_string();
        if let Some(published) = article.published_at {
            title = format!("{} | {}", published.format("%b %-d, %Y"), title);
        }

        let mut text = match article.display_content() {
            c if c.trim().is_empty() => "(no content)".to_string(),
            c => c.to_string(),
        };

        if self.settings.html_to_markdown {
            match html2text::from_read(text.as_bytes(), TEXT_WIDTH) {
                Ok(converted) => text = converted.trim_end().to_string(),
                Err(e) => tracing::debug!(
                    "[{}] Converting HTML failed for {}: {}",
                    feed.notifier,
                    feed.display_name,
                    e
                ),
            }
        }

        Message {
            attachments: vec![Attachment {
                fallback: title.clone(),
                author_name: feed.display_name.clone(),
                title,
                title_link: article.link.clone(),
                text,
            }],
        }
    }

    pub async fn send(&self, feed: &Feed, article: &Article) -> Result<()> {
        let message = self.build_message(feed, article);

        let response = self
            .client
            .post(&self.settings.webhook)
            .json(&message)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(TidingsError::Notify(format!(
                "Mattermost webhook error: {}",
                response.status().as_u16()
            )));
        }

        Ok(())
    }
}

//! Delivery of new articles to notification channels.
//!
//! Channels are a closed set selected by the `type` of each configured
//! notifier. A [`NotifierRegistry`] maps channel ids to channels and is the
//! [`Dispatch`] implementation used by the scheduler.

pub mod mattermost;
pub mod pushover;
pub mod stdout;

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::{Result, TidingsError};
use crate::config::{
    Config, NotifierSettings, NOTIFIER_MATTERMOST_WEBHOOK, NOTIFIER_PUSHOVER, STDOUT_NOTIFIER,
};
use crate::domain::{Article, Feed};

pub use mattermost::MattermostWebhook;
pub use pushover::Pushover;
pub use stdout::Stdout;

/// Delivers one article for one feed.
#[async_trait]
pub trait Dispatch {
    async fn notify(&self, feed: &Feed, article: &Article) -> Result<()>;
}

pub enum Channel {
    MattermostWebhook(MattermostWebhook),
    Pushover(Pushover),
    Stdout(Stdout),
}

impl Channel {
    pub fn from_settings(settings: NotifierSettings, client: Client) -> Self {
        match settings {
            NotifierSettings::MattermostWebhook(s) => {
                Channel::MattermostWebhook(MattermostWebhook::new(client, s))
            }
            NotifierSettings::Pushover(s) => Channel::Pushover(Pushover::new(client, s)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Channel::MattermostWebhook(_) => NOTIFIER_MATTERMOST_WEBHOOK,
            Channel::Pushover(_) => NOTIFIER_PUSHOVER,
            Channel::Stdout(_) => STDOUT_NOTIFIER,
        }
    }

    pub async fn send(&self, feed: &Feed, article: &Article) -> Result<()> {
        match self {
            Channel::MattermostWebhook(n) => n.send(feed, article).await,
            Channel::Pushover(n) => n.send(feed, article).await,
            Channel::Stdout(n) => n.send(feed, article),
        }
    }
}

/// Lookup table from notifier id to channel.
pub struct NotifierRegistry {
    channels: HashMap<String, Channel>,
}

impl NotifierRegistry {
    /// Registry holding only the built-in stdout channel.
    pub fn new() -> Self {
        let mut channels = HashMap::new();
        channels.insert(STDOUT_NOTIFIER.to_string(), Channel::Stdout(Stdout));
        Self { channels }
    }

    pub fn from_config(config: &Config, client: Client) -> Result<Self> {
        let mut registry = Self::new();

        for notifier in &config.notifiers {
            let settings = notifier.typed_settings().map_err(|e| {
                TidingsError::Config(format!(
                    "failed to create notifier '{}': {}",
                    notifier.id, e
                ))
            })?;
            registry.insert(notifier.id.clone(), Channel::from_settings(settings, client.clone()));
        }

        Ok(registry)
    }

    pub fn insert(&mut self, id: impl Into<String>, channel: Channel) {
        self.channels.insert(id.into(), channel);
    }

    pub fn get(&self, id: &str) -> Option<&Channel> {
        self.channels.get(id)
    }

    /// Fail fast when any feed points at a channel that does not exist.
    pub fn ensure_resolves(&self, feeds: &[Feed]) -> Result<()> {
        for feed in feeds {
            if self.get(&feed.notifier).is_none() {
                return Err(TidingsError::UnknownNotifier(feed.notifier.clone()));
            }
        }
        Ok(())
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Dispatch for NotifierRegistry {
    async fn notify(&self, feed: &Feed, article: &Article) -> Result<()> {
        let channel = self
            .get(&feed.notifier)
            .ok_or_else(|| TidingsError::UnknownNotifier(feed.notifier.clone()))?;

        tracing::debug!(
            "[{}/{}] Sending notification for {}: {}",
            feed.notifier,
            channel.kind(),
            feed.display_name,
            article.display_title()
        );

        channel.send(feed, article).await
    }
}

//! Configuration for the notifier service.
//!
//! The configuration is a TOML file naming the feeds to watch and the
//! notification channels that receive new articles. It is read once at
//! startup; the feed list is static for the life of the process.

mod validate;

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::app::TidingsError;
use crate::domain::Feed;

/// Built-in notifier that prints JSON to standard output. Always available.
pub const STDOUT_NOTIFIER: &str = "stdout";
pub const DEFAULT_JOBS: usize = 3;
pub const MAX_JOBS: usize = 10;
pub const DEFAULT_INTERVAL_MINUTES: u32 = 60;

pub const NOTIFIER_MATTERMOST_WEBHOOK: &str = "mattermost_webhook";
pub const NOTIFIER_PUSHOVER: &str = "pushover";

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database path, defaults to the user data directory
    pub database: Option<PathBuf>,
    /// Enables debug logging when `RUST_LOG` is unset
    pub debug: bool,
    pub fetch: FetchConfig,
    pub notifiers: Vec<NotifierConfig>,
    pub default_notifier: Option<String>,
    pub feeds: Vec<FeedConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum concurrent fetches, 0 selects the default
    pub jobs: usize,
    /// Default poll interval in minutes, 0 selects the default
    pub interval: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub display_name: String,
    pub interval: Option<u32>,
    pub notifier: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub settings: toml::Table,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MattermostWebhookSettings {
    pub webhook: String,
    /// Convert HTML article content to plain text before posting
    pub html_to_markdown: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PushoverSettings {
    pub app_token: String,
    pub user_key: String,
}

/// Typed settings for a configured notifier.
#[derive(Debug, Clone)]
pub enum NotifierSettings {
    MattermostWebhook(MattermostWebhookSettings),
    Pushover(PushoverSettings),
}

impl NotifierConfig {
    /// Interpret the raw settings table according to the notifier type.
    pub fn typed_settings(&self) -> Result<NotifierSettings, ConfigError> {
        match self.kind.as_str() {
            NOTIFIER_MATTERMOST_WEBHOOK => {
                let s: MattermostWebhookSettings = self.decode_settings()?;
                if s.webhook.is_empty() {
                    return Err(ConfigError::invalid(format!(
                        "settings.webhook must be defined for notifier '{}'",
                        self.id
                    )));
                }
                Ok(NotifierSettings::MattermostWebhook(s))
            }
            NOTIFIER_PUSHOVER => {
                let s: PushoverSettings = self.decode_settings()?;
                if s.app_token.is_empty() {
                    return Err(ConfigError::invalid(format!(
                        "settings.app_token must be defined for notifier '{}'",
                        self.id
                    )));
                }
                if s.user_key.is_empty() {
                    return Err(ConfigError::invalid(format!(
                        "settings.user_key must be defined for notifier '{}'",
                        self.id
                    )));
                }
                Ok(NotifierSettings::Pushover(s))
            }
            "" => Err(ConfigError::invalid(format!(
                "type must be defined for notifier '{}'",
                self.id
            ))),
            other => Err(ConfigError::invalid(format!(
                "type '{}' is invalid for notifier '{}'",
                other, self.id
            ))),
        }
    }

    fn decode_settings<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        toml::Value::Table(self.settings.clone())
            .try_into()
            .map_err(|e| {
                ConfigError::invalid(format!(
                    "invalid settings for notifier '{}': {}",
                    self.id, e
                ))
            })
    }
}

impl Config {
    /// Load and validate the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn jobs(&self) -> usize {
        if self.fetch.jobs == 0 {
            DEFAULT_JOBS
        } else {
            self.fetch.jobs
        }
    }

    pub fn interval(&self) -> u32 {
        if self.fetch.interval == 0 {
            DEFAULT_INTERVAL_MINUTES
        } else {
            self.fetch.interval
        }
    }

    pub fn default_notifier(&self) -> &str {
        self.default_notifier
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(STDOUT_NOTIFIER)
    }

    /// Feeds with interval and notifier defaults applied.
    pub fn resolved_feeds(&self) -> Vec<Feed> {
        self.feeds
            .iter()
            .map(|f| Feed {
                id: f.id.clone(),
                url: f.url.clone(),
                display_name: f.display_name.clone(),
                interval: f.interval.filter(|i| *i > 0).unwrap_or(self.interval()),
                notifier: f
                    .notifier
                    .clone()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| self.default_notifier().to_string()),
            })
            .collect()
    }

    /// Database location: configured path (with `~/` and `$VAR` expanded)
    /// or `<data dir>/tidings/tidings.db`.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database {
            Some(path) => {
                let path = path.to_str().ok_or_else(|| {
                    ConfigError::invalid(format!("database path {:?} is not valid UTF-8", path))
                })?;
                expand_home(Path::new(&expand_env(path)))
            }
            None => {
                let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
                Ok(data_dir.join("tidings").join("tidings.db"))
            }
        }
    }
}

fn expand_home(path: &Path) -> Result<PathBuf, ConfigError> {
    match path.strip_prefix("~") {
        Ok(rest) => {
            let home = dirs::home_dir().ok_or(ConfigError::NoDataDir)?;
            Ok(home.join(rest))
        }
        Err(_) => Ok(path.to_path_buf()),
    }
}

/// Replace `$NAME` and `${NAME}` with environment values. Unset variables
/// expand to nothing; a `$` not followed by a name is kept.
fn expand_env(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

fn expand_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        if name.is_empty() {
            out.push('$');
            rest = after;
            continue;
        }

        out.push_str(&lookup(name).unwrap_or_default());
        rest = &after[consumed..];
    }

    out.push_str(rest);
    out
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine data directory")]
    NoDataDir,

    #[error("Failed to read config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

impl From<ConfigError> for TidingsError {
    fn from(e: ConfigError) -> Self {
        TidingsError::Config(e.to_string())
    }
}

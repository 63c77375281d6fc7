use std::collections::HashSet;

use url::Url;

use super::{Config, ConfigError, MAX_JOBS, STDOUT_NOTIFIER};

impl Config {
    /// Ensure the configuration is usable before anything starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_fetch()?;
        let notifier_ids = self.validate_notifiers()?;
        self.validate_default_notifier(&notifier_ids)?;
        self.validate_feeds(&notifier_ids)
    }

    fn validate_fetch(&self) -> Result<(), ConfigError> {
        if self.fetch.jobs > MAX_JOBS {
            return Err(ConfigError::invalid(format!(
                "fetch.jobs cannot be greater than {}",
                MAX_JOBS
            )));
        }
        Ok(())
    }

    fn validate_notifiers(&self) -> Result<HashSet<&str>, ConfigError> {
        let mut ids = HashSet::from([STDOUT_NOTIFIER]);

        for notifier in &self.notifiers {
            if notifier.id.is_empty() {
                return Err(ConfigError::invalid("notifiers must have an id"));
            }
            if notifier.id == STDOUT_NOTIFIER {
                return Err(ConfigError::invalid(format!(
                    "notifiers cannot have an id of '{}'",
                    STDOUT_NOTIFIER
                )));
            }
            if !ids.insert(notifier.id.as_str()) {
                return Err(ConfigError::invalid(format!(
                    "duplicate notifier id '{}'",
                    notifier.id
                )));
            }
            notifier.typed_settings()?;
        }

        Ok(ids)
    }

    fn validate_default_notifier(&self, ids: &HashSet<&str>) -> Result<(), ConfigError> {
        let default = self.default_notifier();
        if !ids.contains(default) {
            return Err(ConfigError::invalid(format!(
                "default_notifier '{}' does not match any notifiers",
                default
            )));
        }
        Ok(())
    }

    fn validate_feeds(&self, notifier_ids: &HashSet<&str>) -> Result<(), ConfigError> {
        let mut feed_ids = HashSet::new();

        for feed in &self.feeds {
            if feed.id.is_empty() {
                return Err(ConfigError::invalid("feeds must have an id"));
            }
            if feed.display_name.is_empty() {
                return Err(ConfigError::invalid(format!(
                    "display_name must be defined for feed '{}'",
                    feed.id
                )));
            }
            if !feed_ids.insert(feed.id.as_str()) {
                return Err(ConfigError::invalid(format!(
                    "duplicate feed id '{}'",
                    feed.id
                )));
            }
            if feed.url.is_empty() {
                return Err(ConfigError::invalid(format!(
                    "url must be defined for feed '{}'",
                    feed.id
                )));
            }
            match Url::parse(&feed.url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                Ok(url) => {
                    return Err(ConfigError::invalid(format!(
                        "url for feed '{}' has unsupported scheme '{}'",
                        feed.id,
                        url.scheme()
                    )))
                }
                Err(e) => {
                    return Err(ConfigError::invalid(format!(
                        "url for feed '{}' is invalid: {}",
                        feed.id, e
                    )))
                }
            }
            if let Some(notifier) = feed.notifier.as_deref().filter(|n| !n.is_empty()) {
                if !notifier_ids.contains(notifier) {
                    return Err(ConfigError::invalid(format!(
                        "notifier '{}' for feed '{}' does not match any notifiers",
                        notifier, feed.id
                    )));
                }
            }
        }

        Ok(())
    }
}

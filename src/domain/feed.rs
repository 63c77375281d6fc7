use serde::{Deserialize, Serialize};

/// A feed being watched, resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub id: String,
    pub url: String,
    pub display_name: String,
    /// Poll interval in minutes
    pub interval: u32,
    /// Identifier of the notifier channel that receives new articles
    pub notifier: String,
}

impl Feed {
    pub fn interval_secs(&self) -> i64 {
        i64::from(self.interval) * 60
    }
}

/// Conditional-fetch state persisted per feed.
///
/// A feed without a stored row has never been fetched successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedMetadata {
    pub feed_id: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    /// Server-declared freshness lifetime in seconds (Cache-Control max-age)
    pub max_age: u64,
    /// Unix timestamp of the last fetch attempt
    pub last_checked: i64,
}

impl FeedMetadata {
    pub fn new(feed_id: impl Into<String>) -> Self {
        Self {
            feed_id: feed_id.into(),
            ..Self::default()
        }
    }

    /// Seconds since epoch at which the cached copy stops being fresh.
    pub fn fresh_until(&self) -> i64 {
        self.last_checked
            .saturating_add(i64::try_from(self.max_age).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_secs() {
        let feed = Feed {
            id: "f".into(),
            url: "https://example.com/feed.xml".into(),
            display_name: "F".into(),
            interval: 15,
            notifier: "stdout".into(),
        };
        assert_eq!(feed.interval_secs(), 900);
    }

    #[test]
    fn test_new_metadata_is_blank() {
        let meta = FeedMetadata::new("f");
        assert_eq!(meta.feed_id, "f");
        assert!(meta.etag.is_none());
        assert!(meta.last_modified.is_none());
        assert_eq!(meta.max_age, 0);
        assert_eq!(meta.last_checked, 0);
    }

    #[test]
    fn test_fresh_until() {
        let meta = FeedMetadata {
            max_age: 3600,
            last_checked: 1_000,
            ..FeedMetadata::new("f")
        };
        assert_eq!(meta.fresh_until(), 4_600);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Article {
    /// Globally unique id from the feed document, empty when absent
    pub guid: String,
    pub title: String,
    pub link: String,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Article {
    /// Stable dedup key: guid, then link, then title.
    ///
    /// Returns `None` when all three are empty; such articles cannot be
    /// deduplicated and are never notified.
    pub fn identity(&self) -> Option<&str> {
        [&self.guid, &self.link, &self.title]
            .into_iter()
            .map(|s| s.as_str())
            .find(|s| !s.is_empty())
    }

    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "(no title)"
        } else {
            &self.title
        }
    }

    /// Get the best available content for display
    pub fn display_content(&self) -> &str {
        self.content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(self.summary.as_deref())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(guid: &str, link: &str, title: &str) -> Article {
        Article {
            guid: guid.into(),
            link: link.into(),
            title: title.into(),
            ..Article::default()
        }
    }

    #[test]
    fn test_identity_prefers_guid() {
        let a = article("urn:1", "https://example.com/1", "One");
        assert_eq!(a.identity(), Some("urn:1"));
    }

    #[test]
    fn test_identity_falls_back_to_link() {
        let a = article("", "https://example.com/1", "One");
        assert_eq!(a.identity(), Some("https://example.com/1"));
    }

    #[test]
    fn test_identity_falls_back_to_title() {
        let a = article("", "", "One");
        assert_eq!(a.identity(), Some("One"));
    }

    #[test]
    fn test_identity_absent_when_all_empty() {
        assert_eq!(article("", "", "").identity(), None);
    }

    #[test]
    fn test_display_title_placeholder() {
        assert_eq!(article("1", "", "  ").display_title(), "(no title)");
        assert_eq!(article("1", "", "Hello").display_title(), "Hello");
    }

    #[test]
    fn test_display_content_prefers_content() {
        let mut a = article("1", "", "");
        a.content = Some("Full content".into());
        a.summary = Some("Short summary".into());
        assert_eq!(a.display_content(), "Full content");
    }

    #[test]
    fn test_display_content_falls_back_to_summary() {
        let mut a = article("1", "", "");
        a.content = Some("   ".into());
        a.summary = Some("Short summary".into());
        assert_eq!(a.display_content(), "Short summary");
    }
}

pub mod sqlite;

use crate::app::Result;
use crate::domain::FeedMetadata;

pub use sqlite::SqliteStore;

/// Persistent dedup ledger and per-feed fetch metadata.
///
/// Implementations must tolerate concurrent calls for different feed ids.
/// Callers never issue concurrent writes for the same feed id.
pub trait Store {
    // Feed metadata
    fn get_feed_metadata(&self, feed_id: &str) -> Result<Option<FeedMetadata>>;
    fn upsert_feed_metadata(&self, metadata: &FeedMetadata) -> Result<()>;

    // Article ledger
    fn is_new(&self, feed_id: &str, article_id: &str) -> Result<bool>;
    /// Returns `true` when the pair was not already present.
    fn record(&self, feed_id: &str, article_id: &str) -> Result<bool>;
}

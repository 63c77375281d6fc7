use std::sync::Arc;

use chrono::Utc;

use crate::app::{Result, TidingsError};
use crate::domain::{Feed, FeedMetadata};
use crate::fetcher::{FetchResult, Fetcher};
use crate::normalizer::Normalizer;
use crate::notifier::Dispatch;
use crate::processor::{ArticleProcessor, ProcessSummary};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Server answered 304
    NotModified,
    /// First successful fetch; articles recorded without notifying
    Baseline(ProcessSummary),
    /// Regular fetch; unseen articles were dispatched
    Delivered(ProcessSummary),
}

/// Runs one fetch → process → persist cycle for a single feed.
///
/// The caller guarantees that no two cycles for the same feed overlap; the
/// metadata row is read before the fetch and written after it without a
/// transaction.
pub struct FeedWorker {
    store: Arc<dyn Store + Send + Sync>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    processor: ArticleProcessor,
}

impl FeedWorker {
    pub fn new(
        store: Arc<dyn Store + Send + Sync>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        dispatcher: Arc<dyn Dispatch + Send + Sync>,
    ) -> Self {
        let processor = ArticleProcessor::new(store.clone(), dispatcher);
        Self {
            store,
            fetcher,
            normalizer: Normalizer::new(),
            processor,
        }
    }

    /// Poll `feed` using the metadata loaded when it was judged due.
    pub async fn poll(&self, feed: &Feed, metadata: Option<FeedMetadata>) -> Result<PollOutcome> {
        tracing::debug!("Processing feed: {} ({})", feed.id, feed.url);

        let first_run = metadata.is_none();
        let mut metadata = metadata.unwrap_or_else(|| FeedMetadata::new(&feed.id));

        let fetched = self
            .fetcher
            .fetch(
                &feed.url,
                metadata.etag.as_deref(),
                metadata.last_modified.as_deref(),
            )
            .await;
        let checked_at = Utc::now().timestamp();

        let (body, etag, last_modified, max_age) = match fetched {
            Ok(FetchResult::Content {
                body,
                etag,
                last_modified,
                max_age,
            }) => (body, etag, last_modified, max_age),
            Ok(FetchResult::NotModified { max_age }) => {
                tracing::debug!("Feed {} not modified", feed.id);
                if let Some(max_age) = max_age {
                    metadata.max_age = max_age;
                }
                metadata.last_checked = checked_at;
                if !first_run {
                    self.store.upsert_feed_metadata(&metadata)?;
                }
                return Ok(PollOutcome::NotModified);
            }
            Err(e) => return Err(self.failed_attempt(metadata, checked_at, first_run, e)),
        };

        // A body that does not parse leaves the stored metadata untouched.
        let articles = self.normalizer.normalize(&body)?;

        let outcome = if first_run {
            PollOutcome::Baseline(self.processor.record_baseline(feed, &articles)?)
        } else {
            PollOutcome::Delivered(self.processor.deliver(feed, &articles).await?)
        };

        metadata.etag = etag;
        metadata.last_modified = last_modified;
        metadata.max_age = max_age;
        metadata.last_checked = checked_at;
        self.store.upsert_feed_metadata(&metadata)?;

        Ok(outcome)
    }

    /// Note a failed request so the feed is not retried on every tick,
    /// keeping the stored validators. A feed that has never been fetched
    /// keeps no row, so its first success still takes a silent baseline.
    fn failed_attempt(
        &self,
        mut metadata: FeedMetadata,
        checked_at: i64,
        first_run: bool,
        error: TidingsError,
    ) -> TidingsError {
        if !first_run {
            metadata.last_checked = checked_at;
            if let Err(e) = self.store.upsert_feed_metadata(&metadata) {
                tracing::error!("Failed to record check time for feed '{}': {}", metadata.feed_id, e);
            }
        }
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::testing::{feed, rss_with, FakeFetcher, RecordingDispatcher, Scripted};

    struct Fixture {
        store: Arc<SqliteStore>,
        fetcher: Arc<FakeFetcher>,
        dispatcher: Arc<RecordingDispatcher>,
        worker: FeedWorker,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let fetcher = Arc::new(FakeFetcher::new());
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let worker = FeedWorker::new(store.clone(), fetcher.clone(), dispatcher.clone());
        Fixture {
            store,
            fetcher,
            dispatcher,
            worker,
        }
    }

    fn stored(etag: &str, last_modified: &str, max_age: u64, last_checked: i64) -> FeedMetadata {
        FeedMetadata {
            feed_id: "blog".into(),
            etag: Some(etag.into()),
            last_modified: Some(last_modified.into()),
            max_age,
            last_checked,
        }
    }

    #[tokio::test]
    async fn test_first_run_takes_baseline() {
        let fx = fixture();
        let feed = feed("blog");
        fx.fetcher.script(
            &feed.url,
            Scripted::Content {
                body: rss_with(&["a", "b"]),
                etag: Some("\"v1\"".into()),
                last_modified: None,
                max_age: 300,
            },
        );

        let outcome = fx.worker.poll(&feed, None).await.unwrap();

        assert!(matches!(outcome, PollOutcome::Baseline(s) if s.recorded == 2));
        assert!(fx.dispatcher.sent().is_empty());
        assert!(!fx.store.is_new("blog", "a").unwrap());

        let meta = fx.store.get_feed_metadata("blog").unwrap().unwrap();
        assert_eq!(meta.etag.as_deref(), Some("\"v1\""));
        assert_eq!(meta.max_age, 300);
        assert!(meta.last_checked > 0);
    }

    #[tokio::test]
    async fn test_steady_state_notifies_new_articles() {
        let fx = fixture();
        let feed = feed("blog");
        fx.store.record("blog", "a").unwrap();
        fx.fetcher.script(&feed.url, Scripted::body(rss_with(&["c", "a", "b"])));

        let prior = stored("\"v1\"", "Mon, 01 Jan 2024 00:00:00 GMT", 600, 100);
        let outcome = fx.worker.poll(&feed, Some(prior)).await.unwrap();

        assert!(matches!(outcome, PollOutcome::Delivered(s) if s.notified == 2));
        assert_eq!(fx.dispatcher.sent(), vec!["c", "b"]);

        let request = &fx.fetcher.requests()[0];
        assert_eq!(request.etag.as_deref(), Some("\"v1\""));

        // A 200 without validators or Cache-Control resets them.
        let meta = fx.store.get_feed_metadata("blog").unwrap().unwrap();
        assert!(meta.etag.is_none());
        assert!(meta.last_modified.is_none());
        assert_eq!(meta.max_age, 0);
        assert!(meta.last_checked > 100);
    }

    #[tokio::test]
    async fn test_not_modified_only_touches_check_time() {
        let fx = fixture();
        let feed = feed("blog");
        let prior = stored("\"v1\"", "Mon, 01 Jan 2024 00:00:00 GMT", 600, 100);
        fx.store.upsert_feed_metadata(&prior).unwrap();
        fx.fetcher
            .script(&feed.url, Scripted::NotModified { max_age: None });

        let outcome = fx.worker.poll(&feed, Some(prior.clone())).await.unwrap();

        assert_eq!(outcome, PollOutcome::NotModified);
        assert!(fx.dispatcher.sent().is_empty());

        let meta = fx.store.get_feed_metadata("blog").unwrap().unwrap();
        assert_eq!(meta.etag, prior.etag);
        assert_eq!(meta.last_modified, prior.last_modified);
        assert_eq!(meta.max_age, 600);
        assert!(meta.last_checked > 100);
    }

    #[tokio::test]
    async fn test_not_modified_with_cache_control_updates_lifetime() {
        let fx = fixture();
        let feed = feed("blog");
        let prior = stored("\"v1\"", "", 600, 100);
        fx.fetcher
            .script(&feed.url, Scripted::NotModified { max_age: Some(1200) });

        fx.worker.poll(&feed, Some(prior)).await.unwrap();

        let meta = fx.store.get_feed_metadata("blog").unwrap().unwrap();
        assert_eq!(meta.max_age, 1200);
        assert_eq!(meta.etag.as_deref(), Some("\"v1\""));
    }

    #[tokio::test]
    async fn test_fetch_error_records_check_time_only() {
        let fx = fixture();
        let feed = feed("blog");
        let prior = stored("\"v1\"", "Mon, 01 Jan 2024 00:00:00 GMT", 600, 100);
        fx.fetcher.script(&feed.url, Scripted::Status(500));

        let result = fx.worker.poll(&feed, Some(prior.clone())).await;

        assert!(matches!(result, Err(TidingsError::HttpStatus(500))));
        let meta = fx.store.get_feed_metadata("blog").unwrap().unwrap();
        assert_eq!(meta.etag, prior.etag);
        assert_eq!(meta.last_modified, prior.last_modified);
        assert_eq!(meta.max_age, 600);
        assert!(meta.last_checked > 100);
    }

    #[tokio::test]
    async fn test_parse_error_leaves_ledger_alone() {
        let fx = fixture();
        let feed = feed("blog");
        let prior = stored("\"v1\"", "", 0, 100);
        fx.store.upsert_feed_metadata(&prior).unwrap();
        fx.fetcher.script(
            &feed.url,
            Scripted::Content {
                body: "<<not a feed".into(),
                etag: Some("\"broken\"".into()),
                last_modified: None,
                max_age: 60,
            },
        );

        let result = fx.worker.poll(&feed, Some(prior)).await;

        assert!(matches!(result, Err(TidingsError::FeedParse(_))));
        assert!(fx.dispatcher.sent().is_empty());
        let meta = fx.store.get_feed_metadata("blog").unwrap().unwrap();
        assert_eq!(meta.etag.as_deref(), Some("\"v1\""));
        assert_eq!(meta.max_age, 0);
        assert_eq!(meta.last_checked, 100);
    }

    #[tokio::test]
    async fn test_parse_error_writes_no_metadata() {
        let fx = fixture();
        let feed = feed("blog");
        fx.fetcher.script(&feed.url, Scripted::body("<<garbage"));

        let result = fx.worker.poll(&feed, Some(stored("\"v1\"", "", 600, 100))).await;

        assert!(result.is_err());
        assert!(fx.store.get_feed_metadata("blog").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_run_failure_keeps_first_run_state() {
        let fx = fixture();
        let feed = feed("blog");
        fx.fetcher.script(&feed.url, Scripted::Status(502));

        assert!(fx.worker.poll(&feed, None).await.is_err());
        assert!(fx.store.get_feed_metadata("blog").unwrap().is_none());

        // The next success is still treated as the first run.
        let outcome = fx.worker.poll(&feed, None).await.unwrap();
        assert!(matches!(outcome, PollOutcome::Baseline(_)));
        assert!(fx.dispatcher.sent().is_empty());
    }
}

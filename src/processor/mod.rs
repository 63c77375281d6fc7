use std::sync::Arc;

use crate::app::Result;
use crate::domain::{Article, Feed};
use crate::notifier::Dispatch;
use crate::store::Store;

/// Counts from one pass over a fetched feed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSummary {
    /// Identities newly written to the ledger
    pub recorded: usize,
    /// Successful notification calls
    pub notified: usize,
    /// Notification calls that failed; left eligible for a later fetch
    pub failed: usize,
    /// Articles without a usable identity
    pub skipped: usize,
}

pub struct ArticleProcessor {
    store: Arc<dyn Store + Send + Sync>,
    dispatcher: Arc<dyn Dispatch + Send + Sync>,
}

impl ArticleProcessor {
    pub fn new(
        store: Arc<dyn Store + Send + Sync>,
        dispatcher: Arc<dyn Dispatch + Send + Sync>,
    ) -> Self {
        Self { store, dispatcher }
    }

    /// Record every identifiable article without notifying.
    ///
    /// Used on a feed's first successful fetch so existing articles do not
    /// flood the channel.
    pub fn record_baseline(&self, feed: &Feed, articles: &[Article]) -> Result<ProcessSummary> {
        let mut summary = ProcessSummary::default();

        for article in articles {
            match article.identity() {
                Some(id) => {
                    if self.store.record(&feed.id, id)? {
                        summary.recorded += 1;
                    }
                }
                None => summary.skipped += 1,
            }
        }

        tracing::debug!(
            "First fetch for feed '{}', recorded {} articles without sending notifications",
            feed.id,
            summary.recorded
        );

        Ok(summary)
    }

    /// Notify unseen articles in fetch order, recording each one only after
    /// its notification succeeds.
    pub async fn deliver(&self, feed: &Feed, articles: &[Article]) -> Result<ProcessSummary> {
        let mut summary = ProcessSummary::default();

        for article in articles {
            let Some(id) = article.identity() else {
                summary.skipped += 1;
                continue;
            };

            if !self.store.is_new(&feed.id, id)? {
                continue;
            }

            if let Err(e) = self.dispatcher.notify(feed, article).await {
                tracing::warn!(
                    "Failed to send notification for '{}' in feed '{}': {}",
                    id,
                    feed.id,
                    e
                );
                summary.failed += 1;
                continue;
            }

            summary.notified += 1;
            if self.store.record(&feed.id, id)? {
                summary.recorded += 1;
            }
        }

        Ok(summary)
    }
}

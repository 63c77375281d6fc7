//! Periodic polling of every configured feed.
//!
//! A single background task ticks once at startup and then on a fixed
//! period. Each tick checks every feed for due-ness and fans the due ones
//! out as tasks that share one bounded pool of fetch slots. A tick ends
//! only when all of its tasks have finished, so two cycles for the same
//! feed never overlap.

pub mod worker;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::domain::{Feed, FeedMetadata};
use crate::fetcher::Fetcher;
use crate::notifier::Dispatch;
use crate::store::Store;

pub use worker::{FeedWorker, PollOutcome};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Whether `feed` should be fetched at `now` (unix seconds).
///
/// A server-declared cache lifetime that is still running wins over the
/// configured interval.
pub fn is_due(feed: &Feed, metadata: Option<&FeedMetadata>, now: i64) -> bool {
    let Some(metadata) = metadata else {
        return true;
    };

    if metadata.max_age > 0 && now < metadata.fresh_until() {
        return false;
    }

    now - metadata.last_checked >= feed.interval_secs()
}

/// Format a duration in seconds for display, e.g. `90s`, `30m`, `2h`.
pub fn format_interval(secs: u64) -> String {
    if secs >= 86400 && secs % 86400 == 0 {
        format!("{}d", secs / 86400)
    } else if secs >= 3600 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}

/// Tally of one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub started: usize,
    pub not_modified: usize,
    pub baselined: usize,
    pub notified: usize,
    pub errors: usize,
    pub cancelled: usize,
}

enum FeedRun {
    Finished(PollOutcome),
    Failed,
    Cancelled,
}

pub struct Scheduler {
    feeds: Arc<Vec<Feed>>,
    store: Arc<dyn Store + Send + Sync>,
    worker: Arc<FeedWorker>,
    slots: Arc<Semaphore>,
    jobs: usize,
    tick_interval: Duration,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(
        feeds: Vec<Feed>,
        store: Arc<dyn Store + Send + Sync>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        dispatcher: Arc<dyn Dispatch + Send + Sync>,
        jobs: usize,
    ) -> Self {
        let jobs = jobs.max(1);
        let worker = Arc::new(FeedWorker::new(store.clone(), fetcher, dispatcher));

        Self {
            feeds: Arc::new(feeds),
            store,
            worker,
            slots: Arc::new(Semaphore::new(jobs)),
            jobs,
            tick_interval: DEFAULT_TICK_INTERVAL,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Spawn the tick loop. The first tick runs immediately.
    pub fn start(self) -> SchedulerHandle {
        let cancel = self.cancel.clone();
        let task = tokio::spawn(self.run());
        SchedulerHandle { cancel, task }
    }

    async fn run(self) {
        tracing::info!(
            "Scheduler started ({} feeds, {} jobs, tick every {})",
            self.feeds.len(),
            self.jobs,
            format_interval(self.tick_interval.as_secs())
        );

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            self.run_tick().await;
        }

        tracing::info!("Scheduler stopped");
    }

    /// Run one pass over all feeds and wait for every started feed.
    pub async fn run_tick(&self) -> TickSummary {
        let start = Instant::now();
        let now = Utc::now().timestamp();
        let mut tasks = JoinSet::new();
        let mut summary = TickSummary::default();

        for feed in self.feeds.iter() {
            if self.cancel.is_cancelled() {
                break;
            }

            let metadata = match self.store.get_feed_metadata(&feed.id) {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::error!("Failed to load metadata for feed '{}': {}", feed.id, e);
                    summary.errors += 1;
                    continue;
                }
            };

            if !is_due(feed, metadata.as_ref(), now) {
                continue;
            }

            summary.started += 1;
            let feed = feed.clone();
            let worker = self.worker.clone();
            let slots = self.slots.clone();
            let cancel = self.cancel.clone();

            tasks.spawn(async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return FeedRun::Cancelled,
                    permit = slots.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return FeedRun::Cancelled,
                    },
                };

                if cancel.is_cancelled() {
                    return FeedRun::Cancelled;
                }

                match worker.poll(&feed, metadata).await {
                    Ok(outcome) => FeedRun::Finished(outcome),
                    Err(e) => {
                        tracing::warn!("Error processing feed '{}': {}", feed.id, e);
                        FeedRun::Failed
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(FeedRun::Finished(PollOutcome::NotModified)) => summary.not_modified += 1,
                Ok(FeedRun::Finished(PollOutcome::Baseline(_))) => summary.baselined += 1,
                Ok(FeedRun::Finished(PollOutcome::Delivered(s))) => {
                    summary.notified += s.notified;
                    summary.errors += s.failed;
                }
                Ok(FeedRun::Failed) => summary.errors += 1,
                Ok(FeedRun::Cancelled) => summary.cancelled += 1,
                Err(e) => {
                    tracing::error!("Feed task join error: {}", e);
                    summary.errors += 1;
                }
            }
        }

        if summary.started > 0 {
            tracing::info!(
                "Tick complete: {} feeds polled, {} notifications, {} errors ({:.1}s)",
                summary.started - summary.cancelled,
                summary.notified,
                summary.errors,
                start.elapsed().as_secs_f64()
            );
        } else {
            tracing::debug!("Tick complete: no feeds due");
        }

        summary
    }
}

/// Controls a running scheduler task.
pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop ticking, abandon feeds still waiting for a slot, and wait for
    /// feeds already fetching to finish.
    pub async fn shutdown(self) {
        tracing::debug!("Stopping scheduler...");
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!("Scheduler task failed: {}", e);
        }
    }
}

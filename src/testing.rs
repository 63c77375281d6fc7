//! Fakes shared by unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::app::{Result, TidingsError};
use crate::domain::{Article, Feed};
use crate::fetcher::{FetchResult, Fetcher};
use crate::notifier::Dispatch;

pub const RSS_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Fake</title>
    <item><title>A</title><link>https://example.com/a</link><guid>a</guid></item>
    <item><title>B</title><link>https://example.com/b</link><guid>b</guid></item>
  </channel>
</rss>"#;

pub fn feed(id: &str) -> Feed {
    Feed {
        id: id.to_string(),
        url: format!("https://example.com/{}.xml", id),
        display_name: id.to_uppercase(),
        interval: 60,
        notifier: "stdout".to_string(),
    }
}

/// Article identified by its guid; an empty id gives an unidentifiable one.
pub fn article(id: &str) -> Article {
    Article {
        guid: id.to_string(),
        ..Article::default()
    }
}

pub fn rss_with(guids: &[&str]) -> String {
    let items: String = guids
        .iter()
        .map(|g| format!("<item><title>{0}</title><guid>{0}</guid></item>", g))
        .collect();
    format!(
        r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Fake</title>{}</channel></rss>"#,
        items
    )
}

#[derive(Debug, Clone)]
pub enum Scripted {
    Content {
        body: String,
        etag: Option<String>,
        last_modified: Option<String>,
        max_age: u64,
    },
    NotModified {
        max_age: Option<u64>,
    },
    Status(u16),
}

impl Scripted {
    pub fn body(body: impl Into<String>) -> Self {
        Scripted::Content {
            body: body.into(),
            etag: None,
            last_modified: None,
            max_age: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// Fetcher that replays scripted responses and tracks concurrency.
///
/// URLs without a script receive [`RSS_BODY`].
#[derive(Default)]
pub struct FakeFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<Request>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    completed: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn script(&self, url: &str, response: Scripted) {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchResult> {
        self.requests.lock().unwrap().push(Request {
            url: url.to_string(),
            etag: etag.map(String::from),
            last_modified: last_modified.map(String::from),
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Scripted::body(RSS_BODY));

        match scripted {
            Scripted::Content {
                body,
                etag,
                last_modified,
                max_age,
            } => Ok(FetchResult::Content {
                body: body.into_bytes(),
                etag,
                last_modified,
                max_age,
            }),
            Scripted::NotModified { max_age } => Ok(FetchResult::NotModified { max_age }),
            Scripted::Status(code) => Err(TidingsError::HttpStatus(code)),
        }
    }
}

/// Dispatcher that records the identity of every delivered article.
#[derive(Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingDispatcher {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_on(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }
}

#[async_trait]
impl Dispatch for RecordingDispatcher {
    async fn notify(&self, _feed: &Feed, article: &Article) -> Result<()> {
        let id = article.identity().unwrap_or_default().to_string();
        if self.failing.lock().unwrap().contains(&id) {
            return Err(TidingsError::Notify(format!("refusing {}", id)));
        }
        self.sent.lock().unwrap().push(id);
        Ok(())
    }
}

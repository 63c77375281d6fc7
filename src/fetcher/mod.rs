pub mod cache_control;
pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

pub use cache_control::{parse_max_age, MAX_CACHE_LIFETIME_SECS};
pub use http_fetcher::HttpFetcher;

#[derive(Debug)]
pub enum FetchResult {
    /// New content fetched successfully (HTTP 200)
    Content {
        body: Vec<u8>,
        etag: Option<String>,
        last_modified: Option<String>,
        /// Capped Cache-Control max-age, 0 when absent
        max_age: u64,
    },
    /// Content not modified (HTTP 304)
    NotModified {
        /// Re-parsed max-age, only when the 304 carried Cache-Control
        max_age: Option<u64>,
    },
}

#[async_trait]
pub trait Fetcher {
    /// Fetch `url`, revalidating with `etag` or, failing that,
    /// `last_modified`. Never both.
    async fn fetch(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchResult>;
}

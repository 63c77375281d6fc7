use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderValue, CACHE_CONTROL, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use reqwest::{Client, StatusCode};

use crate::app::{Result, TidingsError};
use crate::fetcher::{parse_max_age, FetchResult, Fetcher, MAX_CACHE_LIFETIME_SECS};

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// Shared HTTP client used for feeds and notifier transports.
pub fn build_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(FETCH_TIMEOUT)
        .gzip(true)
        .brotli(true)
        .user_agent(concat!("tidings/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

fn header_string(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn conditional_headers(etag: Option<&str>, last_modified: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    // One validator only; the entity tag wins when both are stored.
    let (name, value) = match (
        etag.filter(|v| !v.is_empty()),
        last_modified.filter(|v| !v.is_empty()),
    ) {
        (Some(etag), _) => (IF_NONE_MATCH, etag),
        (None, Some(last_modified)) => (IF_MODIFIED_SINCE, last_modified),
        (None, None) => return headers,
    };

    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::debug!("Ignoring unusable stored validator {:?}", value),
    }

    headers
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchResult> {
        let headers = conditional_headers(etag, last_modified);
        let response = self.client.get(url).headers(headers).send().await?;

        let max_age = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .map(|v| parse_max_age(v, MAX_CACHE_LIFETIME_SECS));

        match response.status() {
            StatusCode::NOT_MODIFIED => Ok(FetchResult::NotModified { max_age }),
            StatusCode::OK => {
                let etag = header_string(response.headers(), ETAG);
                let last_modified = header_string(response.headers(), LAST_MODIFIED);
                let body = response.bytes().await?.to_vec();

                Ok(FetchResult::Content {
                    body,
                    etag,
                    last_modified,
                    max_age: max_age.unwrap_or(0),
                })
            }
            status => Err(TidingsError::HttpStatus(status.as_u16())),
        }
    }
}

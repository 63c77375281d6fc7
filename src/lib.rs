//! # Tidings
//!
//! A long-running feed notifier: polls RSS/Atom feeds and sends one
//! notification per article it has not seen before.
//!
//! ## Architecture
//!
//! ```text
//! Scheduler → Fetcher → Normalizer → Processor → Notifier
//!                 ↘                      ↘
//!                   Store (fetch metadata, dedup ledger)
//! ```
//!
//! The first successful fetch of a feed records its current articles
//! silently; only articles that appear afterwards are notified.
//!
//! ## Quick Start
//!
//! ```bash
//! # Validate the configuration
//! tidings --config tidings.toml check
//!
//! # Poll every due feed once
//! tidings --config tidings.toml once
//!
//! # Run until interrupted
//! tidings --config tidings.toml
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// store, fetcher, notifier registry and scheduler.
pub mod app;

/// Command-line interface using clap.
///
/// - `run` - Poll feeds until SIGINT/SIGTERM (default)
/// - `once` - Poll every due feed once
/// - `check` - Validate the configuration
pub mod cli;

/// TOML configuration: feeds, notifier channels and fetch limits.
pub mod config;

/// Core domain models.
///
/// - [`Feed`](domain::Feed): A configured feed
/// - [`FeedMetadata`](domain::FeedMetadata): Conditional-fetch state
/// - [`Article`](domain::Article): A normalized feed entry
pub mod domain;

/// HTTP fetching with conditional request support.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for feed fetching
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Feed parsing and normalization.
///
/// Converts RSS 0.9x/1.0/2.0, Atom 0.3/1.0, and JSON Feed 1.0
/// into unified [`Article`](domain::Article) structs.
pub mod normalizer;

/// Notification channels and the registry that dispatches to them.
pub mod notifier;

/// Dedup and delivery of fetched articles.
pub mod processor;

/// Periodic, bounded-concurrency polling of all feeds.
pub mod scheduler;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

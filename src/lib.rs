//! # mergefeeds
//!
//! Pulls paginated location records from several HTTP feeds of the same
//! dataset, drops records whose identity was already seen, and writes one
//! consolidated JSON document plus an error log.
//!
//! ## Architecture
//!
//! ```text
//! MergeCoordinator → FeedWalker (one per feed) → Fetcher → DedupFilter → Sink
//! ```
//!
//! - [`fetcher`]: HTTP client with retry/backoff and `Link` header pagination
//! - [`pipeline`]: feed walkers, the merge coordinator and the dedup filter
//! - [`sink`]: file writers at the end of the output and error channels
//!
//! ## Quick Start
//!
//! ```bash
//! # endpoints.json: { "endpoints": [ { "baseUrl": "...", "token": "..." } ] }
//! mergefeeds --tokens endpoints.json --output-dir .output
//!
//! # Two pages per feed, with per-feed counts and duplicate report
//! mergefeeds --maxcalls 2 --debug
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together configuration,
/// endpoints and the shared fetcher.
pub mod app;

/// Command-line interface using clap, and the command that runs a merge.
pub mod cli;

/// Configuration management.
///
/// Loads settings from `~/.config/mergefeeds/config.toml` and endpoints from
/// a JSON file.
pub mod config;

/// Core domain models.
///
/// - [`Endpoint`](domain::Endpoint): one feed's base URL and token
/// - [`Page`](domain::Page) / [`Record`](domain::Record): what flows through the pipeline
/// - [`FeedStats`](domain::FeedStats), [`RunStats`](domain::RunStats),
///   [`DedupReport`](domain::DedupReport): end-of-run counters
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for page fetching
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation with bounded retries
/// - [`PaginationStrategy`](fetcher::PaginationStrategy): where the next cursor comes from
pub mod fetcher;

/// Fan-out over feeds, fan-in into a single dedup consumer.
pub mod pipeline;

/// Byte and error sinks.
pub mod sink;

//! The concurrent ingestion pipeline.
//!
//! ```text
//! MergeCoordinator ─┬─ FeedWalker ─┐
//!                   ├─ FeedWalker ─┼─▶ page channel ─▶ DedupFilter ─▶ output channel
//!                   └─ FeedWalker ─┘          │               │
//!                                             └───────────────┴─▶ error channel
//! ```

pub mod dedup;
pub mod merge;
pub mod walker;

pub use dedup::DedupFilter;
pub use merge::MergeCoordinator;
pub use walker::FeedWalker;

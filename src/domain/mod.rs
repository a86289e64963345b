pub mod endpoint;
pub mod record;
pub mod report;
pub mod stats;

pub use endpoint::Endpoint;
pub use record::{LocationPage, Page, Record};
pub use report::ErrorReport;
pub use stats::{DedupReport, FeedStats, RunStats};

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{Endpoint, ErrorReport, FeedStats, Page};
use crate::fetcher::Fetcher;

/// Drives one feed from its first page to its last.
#[derive(Clone)]
pub struct FeedWalker {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    max_pages: Option<usize>,
    cancel: CancellationToken,
}

impl FeedWalker {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        max_pages: Option<usize>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            max_pages,
            cancel,
        }
    }

    /// Follow cursors from `start_url` until the feed runs dry, the page cap is
    /// hit, or the run is cancelled. Pages are strictly sequential.
    pub async fn walk(
        &self,
        endpoint: &Endpoint,
        start_url: String,
        pages: mpsc::Sender<Page>,
        errors: mpsc::Sender<ErrorReport>,
    ) -> FeedStats {
        let mut stats = FeedStats::new(endpoint.base_url.clone());
        let mut cursor = Some(start_url);

        while let Some(url) = cursor.take() {
            if self.cancel.is_cancelled() {
                info!(feed = endpoint.display_name(), "Run cancelled, feed stops here");
                break;
            }

            debug!(feed = endpoint.display_name(), url = %url, "Processing");

            match self.fetcher.fetch(&url, &endpoint.token).await {
                Ok(fetched) => {
                    if fetched.total_count.is_some() {
                        stats.total_count = fetched.total_count;
                    }
                    let page = Page::new(endpoint.base_url.clone(), fetched.body);
                    if pages.send(page).await.is_err() {
                        warn!(feed = endpoint.display_name(), "Page channel closed, feed stops");
                        break;
                    }
                    stats.pages += 1;
                    cursor = fetched.next_cursor;
                }
                Err(e) => {
                    stats.errors += 1;
                    cursor = e.next_cursor();
                    let report = ErrorReport::new(e.to_string(), e.body().to_vec());
                    if errors.send(report).await.is_err() {
                        warn!(feed = endpoint.display_name(), "Error channel closed, feed stops");
                        break;
                    }
                }
            }

            if let Some(max) = self.max_pages {
                if stats.pages >= max {
                    debug!(feed = endpoint.display_name(), max, "Page cap reached");
                    break;
                }
            }
        }

        stats
    }
}

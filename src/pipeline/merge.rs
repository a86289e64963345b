use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::app::{MergeError, Result};
use crate::domain::{Endpoint, ErrorReport, FeedStats, Page, RunStats};
use crate::fetcher::Fetcher;
use crate::pipeline::FeedWalker;

/// Fans out one [`FeedWalker`] per endpoint and waits for all of them.
pub struct MergeCoordinator {
    walker: FeedWalker,
    diagnostics: bool,
}

impl MergeCoordinator {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        max_pages: Option<usize>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            walker: FeedWalker::new(fetcher, max_pages, cancel),
            diagnostics: false,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Walk every feed concurrently into the shared channels.
    ///
    /// The channels are borrowed: each walker gets its own sender clone, and
    /// closing them is left to whoever created them. One feed failing never
    /// stops the others; only bad preconditions fail the run, before any
    /// request is made.
    pub async fn run(
        &self,
        endpoints: &[Endpoint],
        path_suffix: &str,
        pages: &mpsc::Sender<Page>,
        errors: &mpsc::Sender<ErrorReport>,
    ) -> Result<RunStats> {
        validate(endpoints, path_suffix, pages, errors)?;

        let started_at = Utc::now();
        let mut handles = Vec::with_capacity(endpoints.len());

        for endpoint in endpoints {
            let walker = self.walker.clone();
            let endpoint = endpoint.clone();
            let start_url = endpoint.start_url(path_suffix);
            let pages = pages.clone();
            let errors = errors.clone();

            handles.push(tokio::spawn(async move {
                walker.walk(&endpoint, start_url, pages, errors).await
            }));
        }

        let mut feeds = Vec::with_capacity(endpoints.len());
        for (endpoint, joined) in endpoints
            .iter()
            .zip(futures::future::join_all(handles).await)
        {
            match joined {
                Ok(stats) => feeds.push(stats),
                Err(e) => {
                    tracing::error!(feed = %endpoint.base_url, "Task join error: {}", e);
                    feeds.push(FeedStats::new(endpoint.base_url.clone()));
                }
            }
        }

        let stats = RunStats {
            feeds,
            started_at,
            finished_at: Utc::now(),
        };

        if self.diagnostics {
            for feed in &stats.feeds {
                tracing::info!(
                    feed = %feed.source,
                    pages = feed.pages,
                    errors = feed.errors,
                    total_count = ?feed.total_count,
                    "pages from feed"
                );
            }
            tracing::info!(
                pages = stats.total_pages(),
                errors = stats.total_errors(),
                elapsed_secs = stats.elapsed_secs(),
                "total pages (all feeds)"
            );
        }

        Ok(stats)
    }
}

fn validate(
    endpoints: &[Endpoint],
    path_suffix: &str,
    pages: &mpsc::Sender<Page>,
    errors: &mpsc::Sender<ErrorReport>,
) -> Result<()> {
    if endpoints.is_empty() {
        return Err(MergeError::Config("endpoint list must not be empty".into()));
    }
    for (ix, endpoint) in endpoints.iter().enumerate() {
        if endpoint.base_url.trim().is_empty() {
            return Err(MergeError::Config(format!("endpoint {} has no base URL", ix)));
        }
        if endpoint.token.trim().is_empty() {
            return Err(MergeError::Config(format!(
                "endpoint {} ({}) has no token",
                ix, endpoint.base_url
            )));
        }
    }
    if path_suffix.trim().is_empty() {
        return Err(MergeError::Config("url path suffix is not set".into()));
    }
    if pages.is_closed() {
        return Err(MergeError::Config("page output is not open".into()));
    }
    if errors.is_closed() {
        return Err(MergeError::Config("error output is not open".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::walker::tests::ScriptedFetcher;

    fn endpoints() -> Vec<Endpoint> {
        vec![
            Endpoint::new("https://one/", "t1"),
            Endpoint::new("https://two/", "t2"),
            Endpoint::new("https://three/", "t3"),
        ]
    }

    fn coordinator(fetcher: Arc<ScriptedFetcher>) -> MergeCoordinator {
        MergeCoordinator::new(fetcher, None, CancellationToken::new()).with_diagnostics(true)
    }

    #[tokio::test]
    async fn test_rejects_empty_endpoint_list() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let (page_tx, _page_rx) = mpsc::channel(4);
        let (err_tx, _err_rx) = mpsc::channel(4);

        let result = coordinator(fetcher.clone())
            .run(&[], "locations", &page_tx, &err_tx)
            .await;

        assert!(matches!(result, Err(MergeError::Config(_))));
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rejects_missing_token_and_suffix() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let (page_tx, _page_rx) = mpsc::channel(4);
        let (err_tx, _err_rx) = mpsc::channel(4);

        let no_token = vec![Endpoint::new("https://one/", "")];
        let result = coordinator(fetcher.clone())
            .run(&no_token, "locations", &page_tx, &err_tx)
            .await;
        assert!(matches!(result, Err(MergeError::Config(_))));

        let result = coordinator(fetcher.clone())
            .run(&endpoints(), "", &page_tx, &err_tx)
            .await;
        assert!(matches!(result, Err(MergeError::Config(_))));
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rejects_closed_channels() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let (page_tx, page_rx) = mpsc::channel(4);
        let (err_tx, _err_rx) = mpsc::channel(4);
        drop(page_rx);

        let result = coordinator(fetcher.clone())
            .run(&endpoints(), "locations", &page_tx, &err_tx)
            .await;
        assert!(matches!(result, Err(MergeError::Config(_))));
        assert_eq!(fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_feed_does_not_stop_others() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .page("https://one/locations", "one-1", Some("https://one/p2"))
                .page("https://one/p2", "one-2", None)
                .failing("https://two/locations", 500)
                .page("https://three/locations", "three-1", None),
        );
        let (page_tx, mut page_rx) = mpsc::channel(16);
        let (err_tx, mut err_rx) = mpsc::channel(16);

        let stats = coordinator(fetcher)
            .run(&endpoints(), "locations", &page_tx, &err_tx)
            .await
            .unwrap();

        assert_eq!(stats.feeds.len(), 3);
        assert_eq!(stats.feeds[0].pages, 2);
        assert_eq!(stats.feeds[1].pages, 0);
        assert_eq!(stats.feeds[1].errors, 1);
        assert_eq!(stats.feeds[2].pages, 1);
        assert_eq!(stats.total_pages(), 3);

        // The coordinator leaves the channels open for their creator
        assert!(!page_tx.is_closed());
        drop(page_tx);
        drop(err_tx);

        let mut bodies = Vec::new();
        while let Some(page) = page_rx.recv().await {
            bodies.push(String::from_utf8(page.body).unwrap());
        }
        bodies.sort();
        assert_eq!(bodies, vec!["one-1", "one-2", "three-1"]);

        let report = err_rx.recv().await.unwrap();
        assert!(report.message.contains("https://two/locations"));
        assert!(err_rx.recv().await.is_none());
    }
}

pub mod http_fetcher;
pub mod pagination;

use async_trait::async_trait;

use crate::app::FetchError;

pub use http_fetcher::HttpFetcher;
pub use pagination::{LinkHeaderPagination, PaginationStrategy};

/// One successfully fetched page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedPage {
    pub body: Vec<u8>,
    /// Where the next page lives; `None` once the feed is exhausted.
    pub next_cursor: Option<String>,
    /// `X-Total-Count` hint, when the server sent a parseable one.
    pub total_count: Option<u64>,
}

#[async_trait]
pub trait Fetcher {
    /// GET `url` with `token` as the `Authorization` header, retrying
    /// transient failures.
    async fn fetch(&self, url: &str, token: &str) -> Result<FetchedPage, FetchError>;
}

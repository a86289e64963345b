use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::app::{FetchError, Result};
use crate::config::FetchConfig;
use crate::fetcher::{FetchedPage, Fetcher, LinkHeaderPagination, PaginationStrategy};

const TOTAL_COUNT_HEADER: &str = "x-total-count";

pub struct HttpFetcher {
    client: Client,
    settings: FetchConfig,
    pagination: Box<dyn PaginationStrategy + Send + Sync>,
    /// Held for the whole of a fetch call when requests are serialized.
    gate: Option<Mutex<()>>,
}

/// Why a single attempt failed.
#[derive(Debug)]
enum AttemptError {
    Transport(reqwest::Error),
    Body(reqwest::Error),
    /// 2xx/3xx other than 200
    UnexpectedStatus(StatusCode),
    /// >= 400
    Status { status: StatusCode, body: Vec<u8> },
    TimedOut(Duration),
}

impl AttemptError {
    fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Transport(e) => !e.is_builder(),
            AttemptError::Body(_) => true,
            AttemptError::UnexpectedStatus(_) => true,
            AttemptError::Status { .. } => false,
            AttemptError::TimedOut(_) => true,
        }
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptError::Transport(e) => write!(f, "{}", e),
            AttemptError::Body(e) => write!(f, "reading response body: {}", e),
            AttemptError::UnexpectedStatus(s) => write!(f, "unexpected status code {}", s.as_u16()),
            AttemptError::Status { status, .. } => write!(f, "status code {}", status.as_u16()),
            AttemptError::TimedOut(d) => write!(f, "timed out after {}s", d.as_secs_f64()),
        }
    }
}

/// Wait before attempt `failed_attempts + 1`: grows linearly with the attempt number.
pub fn backoff_delay(base: Duration, failed_attempts: u32) -> Duration {
    base * failed_attempts
}

impl HttpFetcher {
    pub fn new(settings: FetchConfig) -> Result<Self> {
        Self::with_pagination(settings, Box::new(LinkHeaderPagination))
    }

    pub fn with_pagination(
        settings: FetchConfig,
        pagination: Box<dyn PaginationStrategy + Send + Sync>,
    ) -> Result<Self> {
        if settings.insecure {
            warn!("TLS certificate verification is disabled");
        }

        let client = Client::builder()
            .timeout(settings.client_timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("mergefeeds/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(settings.insecure)
            .build()?;

        let gate = settings.serialize_requests.then(|| Mutex::new(()));

        Ok(Self {
            client,
            settings,
            pagination,
            gate,
        })
    }

    async fn attempt(&self, url: &str, token: &str) -> std::result::Result<FetchedPage, AttemptError> {
        let response = self
            .client
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, token)
            .send()
            .await
            .map_err(AttemptError::Transport)?;

        let status = response.status();
        if status.as_u16() >= 400 {
            // Best effort: the body usually explains the failure
            let body = response.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            return Err(AttemptError::Status { status, body });
        }
        if status != StatusCode::OK {
            return Err(AttemptError::UnexpectedStatus(status));
        }

        let total_count = parse_total_count(response.headers());
        let next_cursor = self
            .pagination
            .next_cursor(response.url(), response.headers());

        let body = response.bytes().await.map_err(AttemptError::Body)?.to_vec();

        Ok(FetchedPage {
            body,
            next_cursor,
            total_count,
        })
    }
}

fn parse_total_count(headers: &HeaderMap) -> Option<u64> {
    let raw = headers.get(TOTAL_COUNT_HEADER)?.to_str().ok()?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<u64>() {
        Ok(count) => Some(count),
        Err(e) => {
            warn!(value = raw, error = %e, "Error parsing X-Total-Count header");
            None
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, token: &str) -> std::result::Result<FetchedPage, FetchError> {
        let _guard = match &self.gate {
            Some(gate) => Some(gate.lock().await),
            None => {
                if let Some(delay) = self.settings.slow_delay() {
                    tokio::time::sleep(delay).await;
                }
                None
            }
        };

        let max_attempts = self.settings.max_attempts.max(1);
        let attempt_timeout = self.settings.attempt_timeout();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = backoff_delay(self.settings.backoff_base(), attempt - 1);
                warn!(
                    url,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "error recovery: backing off http request"
                );
                tokio::time::sleep(delay).await;
            }

            let outcome = match tokio::time::timeout(attempt_timeout, self.attempt(url, token)).await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(AttemptError::TimedOut(attempt_timeout)),
            };

            match outcome {
                Ok(page) => {
                    if attempt > 1 {
                        debug!(url, attempts = attempt, "Request succeeded after retry");
                    }
                    return Ok(page);
                }
                Err(AttemptError::Status { status, body }) => {
                    warn!(url, status = status.as_u16(), "HTTP request failed");
                    return Err(FetchError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(e) if e.is_retryable() => {
                    warn!(url, attempt, error = %e, "Error performing HTTP request");
                    last_error = e.to_string();
                }
                Err(e) => {
                    warn!(url, error = %e, "Error creating HTTP request");
                    return Err(FetchError::Request {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(FetchError::AttemptsExhausted {
            url: url.to_string(),
            attempts: max_attempts,
            last_error,
        })
    }
}

use std::path::Path;
use std::sync::Arc;

use crate::app::error::Result;
use crate::config::{load_endpoints, Config};
use crate::domain::Endpoint;
use crate::fetcher::{Fetcher, HttpFetcher};

pub struct AppContext {
    pub config: Config,
    pub endpoints: Vec<Endpoint>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
}

impl AppContext {
    /// Load endpoints from `endpoints_path` and build the HTTP fetcher.
    pub fn new(config: Config, endpoints_path: &Path) -> Result<Self> {
        let endpoints = load_endpoints(endpoints_path)?;
        Self::with_endpoints(config, endpoints)
    }

    pub fn with_endpoints(config: Config, endpoints: Vec<Endpoint>) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::new(config.fetch.clone())?);
        Ok(Self::with_fetcher(config, endpoints, fetcher))
    }

    pub fn with_fetcher(
        config: Config,
        endpoints: Vec<Endpoint>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
    ) -> Self {
        Self {
            config,
            endpoints,
            fetcher,
        }
    }
}

use std::fs;
use std::path::Path;

use serde::Deserialize;
use url::Url;

use crate::config::ConfigError;
use crate::domain::Endpoint;

/// Example endpoints file, shown in `--help`.
pub const ENDPOINTS_EXAMPLE: &str = r#"{ "endpoints": [
    { "baseUrl": "https://ocpi.example.com/",
      "token": "ORG ==NA==PROD==DEN==" },
    { "baseUrl": "https://ocpi-ca.example.com/",
      "token": "ORG ==CA==PROD==DEN==",
      "region": "CA" }
] }"#;

#[derive(Debug, Deserialize)]
struct EndpointFile {
    endpoints: Vec<Endpoint>,
}

/// Load the endpoint list. Any problem here is fatal, before network activity.
pub fn load_endpoints(path: &Path) -> Result<Vec<Endpoint>, ConfigError> {
    let content = fs::read(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let file: EndpointFile =
        serde_json::from_slice(&content).map_err(|e| ConfigError::Endpoints {
            path: path.to_path_buf(),
            source: e,
        })?;

    if file.endpoints.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "no endpoints listed in {}",
            path.display()
        )));
    }

    for ep in &file.endpoints {
        Url::parse(&ep.base_url).map_err(|e| {
            ConfigError::Invalid(format!("endpoint base URL {:?}: {}", ep.base_url, e))
        })?;
    }

    tracing::debug!(
        count = file.endpoints.len(),
        path = %path.display(),
        "Loaded endpoints"
    );

    Ok(file.endpoints)
}

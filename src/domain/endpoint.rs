use std::fmt;

use serde::{Deserialize, Serialize};

/// One paginated source of location records.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    pub token: String,
    /// Descriptive only; has no effect on how the feed is walked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            region: None,
        }
    }

    /// URL of the first page: the base URL with the path suffix appended verbatim.
    pub fn start_url(&self, path_suffix: &str) -> String {
        format!("{}{}", self.base_url, path_suffix)
    }

    pub fn display_name(&self) -> &str {
        self.region.as_deref().unwrap_or(&self.base_url)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::LookupError;

/// Pwned Passwords range endpoint; the 5-character prefix is appended.
pub const HIBP_RANGE_URL: &str = "https://api.pwnedpasswords.com/range/";

/// Default timeout for a single range request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Default `User-Agent` sent with range requests. The API rejects requests without one.
pub const DEFAULT_USER_AGENT: &str = "identity-actions";

/// Header asking the range API to pad responses with zero-count decoys.
pub const ADD_PADDING_HEADER: &str = "Add-Padding";

/// Fetches the raw range body for a 5-character hash prefix.
#[async_trait]
pub trait RangeClient: Send + Sync {
    async fn fetch_range(&self, prefix: &str) -> Result<String, LookupError>;
}

#[async_trait]
impl<T: RangeClient + ?Sized> RangeClient for Arc<T> {
    async fn fetch_range(&self, prefix: &str) -> Result<String, LookupError> {
        (**self).fetch_range(prefix).await
    }
}

#[derive(Clone, Debug)]
pub struct RangeClientConfig {
    /// Base URL the prefix is appended to (default: Pwned Passwords).
    pub api_url: String,
    /// Request timeout (default: 3 seconds).
    pub timeout: Duration,
    pub user_agent: String,
    /// Request padded responses (default: true).
    pub add_padding: bool,
}

impl Default for RangeClientConfig {
    fn default() -> Self {
        Self {
            api_url: HIBP_RANGE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            add_padding: true,
        }
    }
}

impl RangeClientConfig {
    #[must_use]
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn add_padding(mut self, add_padding: bool) -> Self {
        self.add_padding = add_padding;
        self
    }
}

/// Range client backed by the Pwned Passwords HTTP API.
#[derive(Clone, Debug)]
pub struct HibpClient {
    config: RangeClientConfig,
    client: reqwest::Client,
}

impl HibpClient {
    pub fn new(config: RangeClientConfig) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(LookupError::Client)?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RangeClientConfig {
        &self.config
    }

    fn range_url(&self, prefix: &str) -> String {
        if self.config.api_url.ends_with('/') {
            format!("{}{}", self.config.api_url, prefix)
        } else {
            format!("{}/{}", self.config.api_url, prefix)
        }
    }
}

#[async_trait]
impl RangeClient for HibpClient {
    async fn fetch_range(&self, prefix: &str) -> Result<String, LookupError> {
        let url = self.range_url(prefix);

        let mut request = self.client.get(&url);
        if self.config.add_padding {
            request = request.header(ADD_PADDING_HEADER, "true");
        }

        let response = request
            .send()
            .await
            .map_err(|e| LookupError::HttpRequest { prefix: prefix.to_string(), source: e })?;

        if !response.status().is_success() {
            return Err(LookupError::HttpStatus {
                prefix: prefix.to_string(),
                status: response.status().as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| LookupError::HttpRequest { prefix: prefix.to_string(), source: e })
    }
}

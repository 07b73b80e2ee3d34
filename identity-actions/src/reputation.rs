//! IP reputation lookups against AbuseIPDB.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

/// AbuseIPDB check endpoint.
pub const ABUSEIPDB_CHECK_URL: &str = "https://api.abuseipdb.com/api/v2/check";

/// Default timeout for reputation requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ReputationError {
    #[error("no AbuseIPDB API key configured")]
    MissingApiKey,

    #[error("reputation request failed for {ip}: {source}")]
    HttpRequest {
        ip: IpAddr,
        #[source]
        source: reqwest::Error,
    },

    #[error("reputation API returned HTTP {status} for {ip}")]
    HttpStatus { ip: IpAddr, status: u16 },

    #[error("failed to build reputation client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Scores how likely an address is to be abusive, 0 (clean) to 100.
#[async_trait]
pub trait ReputationClient: Send + Sync {
    async fn abuse_confidence_score(&self, ip: IpAddr) -> Result<u32, ReputationError>;
}

#[derive(Debug, Default, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    data: Option<CheckData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckData {
    #[serde(default)]
    abuse_confidence_score: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct AbuseIpDbClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl AbuseIpDbClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ReputationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ReputationError::Client)?;

        Ok(Self { client, endpoint: endpoint.into(), api_key })
    }
}

#[async_trait]
impl ReputationClient for AbuseIpDbClient {
    async fn abuse_confidence_score(&self, ip: IpAddr) -> Result<u32, ReputationError> {
        let api_key = self.api_key.as_deref().ok_or(ReputationError::MissingApiKey)?;
        let url = format!("{}?ipAddress={}", self.endpoint, ip);

        let response = self
            .client
            .get(&url)
            .header("Key", api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ReputationError::HttpRequest { ip, source: e })?;

        if !response.status().is_success() {
            return Err(ReputationError::HttpStatus { ip, status: response.status().as_u16() });
        }

        let body: CheckResponse =
            response.json().await.map_err(|e| ReputationError::HttpRequest { ip, source: e })?;

        // A report with no score means nobody has flagged the address.
        Ok(body.data.and_then(|d| d.abuse_confidence_score).unwrap_or(0))
    }
}

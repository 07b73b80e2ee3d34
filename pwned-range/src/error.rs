#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("range request failed for prefix {prefix}: {source}")]
    HttpRequest {
        prefix: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("range API returned HTTP {status} for prefix {prefix}")]
    HttpStatus { prefix: String, status: u16 },

    #[error("failed to build range client: {0}")]
    Client(#[source] reqwest::Error),
}

impl LookupError {
    /// HTTP status the range API answered with, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            LookupError::HttpStatus { status, .. } => Some(*status),
            LookupError::HttpRequest { source, .. } => source.status().map(|s| s.as_u16()),
            LookupError::Client(_) => None,
        }
    }
}

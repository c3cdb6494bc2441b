use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Settings for the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// API root; relative endpoint paths and video links resolve against it.
    pub base_url: Url,
    /// Whole-request timeout, connect through body.
    pub request_timeout: Duration,
}

impl HttpClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Base URL with a trailing slash, so joins keep its last path segment.
    pub fn normalized_base_url(&self) -> Result<Url, ClientBuildError> {
        if self.base_url.cannot_be_a_base() {
            return Err(ClientBuildError::InvalidBaseUrl(self.base_url.to_string()));
        }
        let mut base_url = self.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(base_url)
    }
}

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("base url `{0}` cannot be used as an API root")]
    InvalidBaseUrl(String),
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}

use std::io;

use client_core::{ByteStream, ErrorBody, TransportResponse};
use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::{ClientBuildError, HttpClientConfig};

/// Failures raised before a response could be handed to the executor.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request url `{path}`: {source}")]
    InvalidUrl {
        path: String,
        #[source]
        source: url::ParseError,
    },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Shared `reqwest` client bound to one API root.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &HttpClientConfig) -> Result<Self, ClientBuildError> {
        let base_url = config.normalized_base_url()?;
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|source| TransportError::InvalidUrl {
                path: path.to_owned(),
                source,
            })
    }

    /// `GET` a JSON endpoint.
    ///
    /// An empty or `null` body on a successful response is reported as a
    /// missing body rather than a decode error.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<TransportResponse<T>, TransportError> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET json");
        let response = self.http.get(url).query(query).send().await?;
        let code = response.status().as_u16();

        if !response.status().is_success() {
            return Ok(failure_response(response).await);
        }

        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(TransportResponse::success(code, None));
        }
        let body = serde_json::from_slice::<Option<T>>(&bytes)?;
        Ok(TransportResponse::success(code, body))
    }

    /// `GET` an absolute URL and hand its body over as a byte stream.
    pub async fn get_bytes(&self, url: Url) -> Result<TransportResponse<ByteStream>, TransportError> {
        debug!(%url, "GET bytes");
        let response = self.http.get(url).send().await?;
        let code = response.status().as_u16();

        if !response.status().is_success() {
            return Ok(failure_response(response).await);
        }
        if response.content_length() == Some(0) {
            return Ok(TransportResponse::success(code, None));
        }

        let body = response.bytes_stream().map_err(io::Error::other).boxed();
        Ok(TransportResponse::success(code, Some(body)))
    }
}

async fn failure_response<T>(response: Response) -> TransportResponse<T> {
    let status = response.status();
    let status_message = status.canonical_reason().map(str::to_owned);
    let error_body = match response.text().await {
        Ok(text) => ErrorBody::Text(text),
        Err(err) => ErrorBody::Unreadable(err.to_string()),
    };
    debug!(code = status.as_u16(), "request failed with status");
    TransportResponse::failure(status.as_u16(), error_body, status_message)
}

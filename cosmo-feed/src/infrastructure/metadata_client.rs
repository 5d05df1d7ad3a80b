use async_trait::async_trait;
use reqwest::{Client, header};
use std::time::Duration;
use thiserror::Error;

use crate::domain::{FetchError, MetadataFetcher, TokenMetadata};

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Empty metadata document")]
    Empty,
}

/// Convert infrastructure HttpError to domain FetchError
impl From<HttpError> for FetchError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Http(e) if e.is_timeout() => FetchError::Timeout,
            HttpError::Http(e) => FetchError::Network(e.to_string()),
            HttpError::Status(code) => FetchError::Status(code),
            HttpError::Parse(msg) => FetchError::Parse(msg),
            HttpError::Empty => FetchError::Empty,
        }
    }
}

/// HTTP client for token metadata documents
/// Infrastructure component - handles HTTP communication
#[derive(Clone)]
pub struct HttpMetadataClient {
    client: Client,
}

impl HttpMetadataClient {
    /// Client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(HttpMetadataClient { client })
    }

    /// GET a metadata document
    pub async fn get_metadata(&self, uri: &str) -> Result<TokenMetadata, HttpError> {
        let resp = self
            .client
            .get(uri)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        self.handle_response(resp).await
    }

    async fn handle_response(&self, resp: reqwest::Response) -> Result<TokenMetadata, HttpError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(HttpError::Status(status.as_u16()));
        }

        let text = resp.text().await?;
        let document: Option<TokenMetadata> =
            serde_json::from_str(&text).map_err(|e| HttpError::Parse(e.to_string()))?;
        document.ok_or(HttpError::Empty)
    }
}

/// Implement MetadataFetcher trait for HttpMetadataClient (Dependency Inversion)
#[async_trait]
impl MetadataFetcher for HttpMetadataClient {
    async fn fetch(&self, uri: &str) -> Result<TokenMetadata, FetchError> {
        self.get_metadata(uri).await.map_err(FetchError::from)
    }
}

use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, InvalidHeaderName, InvalidHeaderValue};

/// Header the MTA developer portal expects keys in.
pub const MTA_API_KEY_HEADER: &str = "x-api-key";

/// Raised when an API key or its header name cannot go on the wire.
#[derive(Debug, thiserror::Error)]
pub enum InvalidApiKey {
    #[error("invalid API key header name: {0}")]
    HeaderName(#[from] InvalidHeaderName),

    #[error("API key is not a valid header value: {0}")]
    HeaderValue(#[from] InvalidHeaderValue),
}

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// Header name and value are validated once, at construction, so every
/// request goes out with the same pre-built header.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self, InvalidApiKey> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())?;
        let mut key = HeaderValue::from_str(key)?;
        key.set_sensitive(true);

        Ok(Self {
            inner,
            header_name,
            key,
        })
    }

    /// Uses the `x-api-key` header the MTA feeds accept.
    pub fn mta(inner: C, key: &str) -> Result<Self, InvalidApiKey> {
        Self::new(inner, MTA_API_KEY_HEADER, key)
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.key.clone());
        self.inner.execute(req).await
    }
}

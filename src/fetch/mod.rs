//! HTTP retrieval of realtime feeds.

mod client;
mod basic;
mod feeds;
pub mod auth;

pub use client::HttpClient;
pub use basic::BasicClient;
pub use feeds::{FeedSource, MtaFeeds};

use crate::error::FetchError;
use tracing::debug;

/// GETs `url` and returns the response body.
///
/// # Errors
///
/// Fails if the URL does not parse, the request errors, or the server
/// answers with a non-success status.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>, FetchError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::Url {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let bytes = resp.bytes().await?;
    debug!(url, status = status.as_u16(), bytes = bytes.len(), "Feed fetched");
    Ok(bytes.to_vec())
}

//! Error types for station lookups and feed fetches.

use std::path::PathBuf;

use crate::routes::InvalidRoute;

/// Errors raised while reading the station reference table.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// The station file could not be opened or read.
    #[error("could not read station file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The station table is not well-formed XML.
    #[error("error parsing the XML station table: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// Errors raised while fetching a realtime feed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// No feed serves the requested route.
    #[error(transparent)]
    InvalidRoute(#[from] InvalidRoute),

    /// The feed URL could not be parsed.
    #[error("invalid feed URL {url}: {message}")]
    Url { url: String, message: String },

    /// The request failed before a response arrived, or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed answered with a non-success status.
    #[error("feed returned status {status} for {url}")]
    Status { status: u16, url: String },
}

use async_trait::async_trait;
use tracing::info;

use super::HttpClient;
use super::fetch_bytes;
use crate::error::FetchError;
use crate::routes::FeedTable;

/// Produces the raw realtime feed serving a route.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_feed(&self, route_id: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetches subway feeds from the MTA endpoints listed in a [`FeedTable`].
pub struct MtaFeeds<C> {
    client: C,
    table: FeedTable,
}

impl<C: HttpClient> MtaFeeds<C> {
    pub fn new(client: C, table: FeedTable) -> Self {
        Self { client, table }
    }
}

#[async_trait]
impl<C: HttpClient> FeedSource for MtaFeeds<C> {
    #[tracing::instrument(skip(self))]
    async fn fetch_feed(&self, route_id: &str) -> Result<Vec<u8>, FetchError> {
        let group = self.table.resolve(route_id)?;
        info!(group = %group.key, url = %group.url, "Fetching feed");
        fetch_bytes(&self.client, &group.url).await
    }
}

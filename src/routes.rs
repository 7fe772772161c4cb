//! Route-group table mapping subway routes to their realtime feed endpoint.
//!
//! The MTA publishes one GTFS-RT feed per bundle of related routes. A route
//! resolves to the first bundle whose key contains it, so `"Z"` resolves to
//! the `"JZ"` feed and `"7"` to the numbered-lines feed.

/// Base URL shared by every subway feed endpoint.
pub const DEFAULT_FEED_BASE_URL: &str =
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2F";

/// Route-group keys and the endpoint suffix serving them, in lookup order.
static FEED_GROUPS: &[(&str, &str)] = &[
    ("ACE", "gtfs-ace"),
    ("BDFM", "gtfs-bdfm"),
    ("G", "gtfs-g"),
    ("JZ", "gtfs-jz"),
    ("NQRW", "gtfs-nqrw"),
    ("L", "gtfs-l"),
    ("1234567", "gtfs"),
];

/// A bundle of routes served by a single feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedGroup {
    pub key: String,
    pub url: String,
}

/// Raised when no feed group serves the requested route.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid route ID: {route_id}")]
pub struct InvalidRoute {
    pub route_id: String,
}

/// Immutable route-group table, built once at startup.
#[derive(Debug, Clone)]
pub struct FeedTable {
    groups: Vec<FeedGroup>,
}

impl FeedTable {
    /// The production table pointing at the MTA API endpoint.
    pub fn mta() -> Self {
        Self::with_base_url(DEFAULT_FEED_BASE_URL)
    }

    /// Builds the table against another host, e.g. a local mirror.
    pub fn with_base_url(base_url: &str) -> Self {
        let groups = FEED_GROUPS
            .iter()
            .map(|(key, suffix)| FeedGroup {
                key: key.to_string(),
                url: format!("{base_url}{suffix}"),
            })
            .collect();

        Self { groups }
    }

    pub fn groups(&self) -> &[FeedGroup] {
        &self.groups
    }

    /// Picks the feed group serving `route_id`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRoute`] if `route_id` is empty or is not a substring
    /// of any group key.
    pub fn resolve(&self, route_id: &str) -> Result<&FeedGroup, InvalidRoute> {
        if route_id.is_empty() {
            return Err(InvalidRoute {
                route_id: route_id.to_string(),
            });
        }

        self.groups
            .iter()
            .find(|g| g.key.contains(route_id))
            .ok_or_else(|| InvalidRoute {
                route_id: route_id.to_string(),
            })
    }
}

impl Default for FeedTable {
    fn default() -> Self {
        Self::mta()
    }
}

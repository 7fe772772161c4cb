//! Protobuf decoding for GTFS Realtime feeds.

use anyhow::{Context, Result};
use prost::Message;
use tracing::debug;

use crate::gtfs_rt::FeedMessage;

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid protobuf for a `FeedMessage`.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage> {
    let feed = FeedMessage::decode(bytes).context("feed is not a valid GTFS-RT message")?;
    debug!(
        bytes = bytes.len(),
        entity_count = feed.entity.len(),
        "Feed decoded"
    );
    Ok(feed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::trip_update::{StopTimeEvent, StopTimeUpdate};
    use crate::gtfs_rt::{FeedEntity, FeedHeader, TripDescriptor, TripUpdate};

    #[test]
    fn test_parse_empty_bytes_returns_default_feed() {
        // Protobuf treats an empty buffer as a message with every field unset.
        let feed = parse_feed(&[]).unwrap();
        assert_eq!(feed.header.gtfs_realtime_version, "");
        assert!(feed.entity.is_empty());
    }

    #[test]
    fn test_parse_invalid_bytes() {
        let invalid_bytes = vec![0xFF, 0xFE, 0x00, 0x01];
        assert!(parse_feed(&invalid_bytes).is_err());
    }

    #[test]
    fn test_parse_trip_update_feed() {
        let feed = FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "1.0".to_string(),
                timestamp: Some(1_700_000_000),
                ..Default::default()
            },
            entity: vec![FeedEntity {
                id: "000001F".to_string(),
                trip_update: Some(TripUpdate {
                    trip: TripDescriptor {
                        trip_id: Some("079350_F..N".to_string()),
                        route_id: Some("F".to_string()),
                        ..Default::default()
                    },
                    stop_time_update: vec![StopTimeUpdate {
                        stop_id: Some("F23N".to_string()),
                        arrival: Some(StopTimeEvent {
                            time: Some(1_700_000_300),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
                ..Default::default()
            }],
        };

        let parsed = parse_feed(&feed.encode_to_vec()).unwrap();

        assert_eq!(parsed, feed);
        let trip_update = parsed.entity[0].trip_update.as_ref().unwrap();
        assert_eq!(trip_update.trip.route_id(), "F");
        assert_eq!(trip_update.stop_time_update[0].stop_id(), "F23N");
    }
}

//! Upcoming arrivals at a stop, extracted from a decoded feed.

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

use crate::gtfs_rt::FeedMessage;
use crate::gtfs_rt::trip_update::StopTimeUpdate;

/// A predicted arrival of one trip at the target stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arrival {
    pub arrival_time: DateTime<Tz>,
    /// Whole minutes until arrival, rounded down from the millisecond
    /// difference. Negative once the predicted time has passed.
    pub minutes_remaining: i64,
    pub trip_id: String,
}

/// Collects every prediction for `stop_id` on trips of `route_id`, ordered by
/// arrival time.
///
/// `stop_id` already carries its direction suffix (`"F23N"`). Both ids are
/// compared exactly. Predictions sharing an arrival time keep feed order.
/// Arrival times are expressed in the time zone of `now`.
pub fn extract_arrivals(
    feed: &FeedMessage,
    route_id: &str,
    stop_id: &str,
    now: DateTime<Tz>,
) -> Vec<Arrival> {
    let tz = now.timezone();
    let now_millis = now.timestamp_millis();

    let mut arrivals = Vec::new();
    for tu in feed.entity.iter().filter_map(|e| e.trip_update.as_ref()) {
        if tu.trip.route_id() != route_id {
            continue;
        }

        for stu in tu.stop_time_update.iter().filter(|stu| stu.stop_id() == stop_id) {
            let Some(epoch) = predicted_time(stu) else {
                debug!(
                    trip_id = tu.trip.trip_id(),
                    stop_id,
                    "Prediction has no arrival or departure time, skipping"
                );
                continue;
            };
            let Some(arrival_time) = tz.timestamp_opt(epoch, 0).single() else {
                debug!(trip_id = tu.trip.trip_id(), epoch, "Prediction time out of range, skipping");
                continue;
            };

            arrivals.push(Arrival {
                arrival_time,
                minutes_remaining: epoch
                    .saturating_mul(1000)
                    .saturating_sub(now_millis)
                    .div_euclid(60_000),
                trip_id: tu.trip.trip_id().to_string(),
            });
        }
    }

    // sort_by_key is stable
    arrivals.sort_by_key(|a| a.arrival_time);
    arrivals
}

/// Arrival time of a prediction, falling back to its departure time.
fn predicted_time(stu: &StopTimeUpdate) -> Option<i64> {
    stu.arrival
        .as_ref()
        .and_then(|e| e.time)
        .or_else(|| stu.departure.as_ref().and_then(|e| e.time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::trip_update::StopTimeEvent;
    use crate::gtfs_rt::{FeedEntity, FeedHeader, TripDescriptor, TripUpdate};
    use chrono_tz::America::New_York;

    const T: i64 = 1_700_000_000;

    fn at(epoch: i64) -> StopTimeEvent {
        StopTimeEvent {
            time: Some(epoch),
            ..Default::default()
        }
    }

    fn arriving(stop_id: &str, epoch: i64) -> StopTimeUpdate {
        StopTimeUpdate {
            stop_id: Some(stop_id.to_string()),
            arrival: Some(at(epoch)),
            ..Default::default()
        }
    }

    fn trip(route_id: &str, trip_id: &str, stops: Vec<StopTimeUpdate>) -> FeedEntity {
        FeedEntity {
            id: trip_id.to_string(),
            trip_update: Some(TripUpdate {
                trip: TripDescriptor {
                    trip_id: Some(trip_id.to_string()),
                    route_id: Some(route_id.to_string()),
                    ..Default::default()
                },
                stop_time_update: stops,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn feed(entity: Vec<FeedEntity>) -> FeedMessage {
        FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "1.0".to_string(),
                timestamp: Some(T as u64),
                ..Default::default()
            },
            entity,
        }
    }

    fn now() -> DateTime<Tz> {
        New_York.timestamp_opt(T, 0).unwrap()
    }

    fn minutes(arrivals: &[Arrival]) -> Vec<i64> {
        arrivals.iter().map(|a| a.minutes_remaining).collect()
    }

    fn trip_ids(arrivals: &[Arrival]) -> Vec<&str> {
        arrivals.iter().map(|a| a.trip_id.as_str()).collect()
    }

    #[test]
    fn test_filters_by_stop_and_route() {
        let feed = feed(vec![
            trip("F", "f-1", vec![arriving("F22N", T + 200), arriving("F23N", T + 300)]),
            trip("F", "f-2", vec![arriving("F23N", T + 900)]),
            trip("F", "f-3", vec![arriving("F23S", T + 120)]),
        ]);

        let arrivals = extract_arrivals(&feed, "F", "F23N", now());

        assert_eq!(minutes(&arrivals), vec![5, 15]);
        assert_eq!(trip_ids(&arrivals), vec!["f-1", "f-2"]);
    }

    #[test]
    fn test_other_routes_at_same_stop_are_excluded() {
        let feed = feed(vec![
            trip("M", "m-1", vec![arriving("F23N", T + 60)]),
            trip("F", "f-1", vec![arriving("F23N", T + 120)]),
        ]);

        let arrivals = extract_arrivals(&feed, "F", "F23N", now());

        assert_eq!(trip_ids(&arrivals), vec!["f-1"]);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let feed = feed(vec![trip("F", "f-1", vec![arriving("F23N", T + 120)])]);

        assert!(extract_arrivals(&feed, "f", "F23N", now()).is_empty());
        assert!(extract_arrivals(&feed, "F", "f23n", now()).is_empty());
        assert!(extract_arrivals(&feed, "F", "F23", now()).is_empty());
    }

    #[test]
    fn test_sorted_by_arrival_time() {
        let feed = feed(vec![
            trip("F", "late", vec![arriving("F23N", T + 1200)]),
            trip("F", "early", vec![arriving("F23N", T + 60)]),
            trip("F", "middle", vec![arriving("F23N", T + 600)]),
        ]);

        let arrivals = extract_arrivals(&feed, "F", "F23N", now());

        assert_eq!(trip_ids(&arrivals), vec!["early", "middle", "late"]);
        assert!(arrivals.windows(2).all(|w| w[0].arrival_time <= w[1].arrival_time));
    }

    #[test]
    fn test_equal_times_keep_feed_order() {
        let feed = feed(vec![
            trip("F", "second-in-time", vec![arriving("F23N", T + 600)]),
            trip("F", "a", vec![arriving("F23N", T + 300)]),
            trip("F", "b", vec![arriving("F23N", T + 300)]),
            trip("F", "c", vec![arriving("F23N", T + 300)]),
        ]);

        let arrivals = extract_arrivals(&feed, "F", "F23N", now());

        assert_eq!(trip_ids(&arrivals), vec!["a", "b", "c", "second-in-time"]);
    }

    #[test]
    fn test_minutes_round_down_and_may_be_negative() {
        let feed = feed(vec![
            trip("F", "t+59", vec![arriving("F23N", T + 59)]),
            trip("F", "t+60", vec![arriving("F23N", T + 60)]),
            trip("F", "t-1", vec![arriving("F23N", T - 1)]),
            trip("F", "t-60", vec![arriving("F23N", T - 60)]),
            trip("F", "t-61", vec![arriving("F23N", T - 61)]),
        ]);

        let arrivals = extract_arrivals(&feed, "F", "F23N", now());

        assert_eq!(trip_ids(&arrivals), vec!["t-61", "t-60", "t-1", "t+59", "t+60"]);
        assert_eq!(minutes(&arrivals), vec![-2, -1, -1, 0, 1]);
    }

    #[test]
    fn test_minutes_count_from_sub_second_clock() {
        let feed = feed(vec![
            trip("F", "just-left", vec![arriving("F23N", T)]),
            trip("F", "f-1", vec![arriving("F23N", T + 300)]),
            trip("F", "f-2", vec![arriving("F23N", T + 361)]),
        ]);
        let now = New_York.timestamp_opt(T, 500_000_000).unwrap();

        // 299.5 s away is still under five minutes; 0.5 s ago is already past.
        assert_eq!(minutes(&extract_arrivals(&feed, "F", "F23N", now)), vec![-1, 4, 6]);

        let now = New_York.timestamp_opt(T, 999_000_000).unwrap();
        assert_eq!(minutes(&extract_arrivals(&feed, "F", "F23N", now)), vec![-1, 4, 6]);
    }

    #[test]
    fn test_departure_time_used_when_arrival_missing() {
        let origin = StopTimeUpdate {
            stop_id: Some("F23N".to_string()),
            departure: Some(at(T + 180)),
            ..Default::default()
        };
        let no_times = StopTimeUpdate {
            stop_id: Some("F23N".to_string()),
            ..Default::default()
        };
        let feed = feed(vec![
            trip("F", "origin", vec![origin]),
            trip("F", "unknown", vec![no_times]),
        ]);

        let arrivals = extract_arrivals(&feed, "F", "F23N", now());

        assert_eq!(trip_ids(&arrivals), vec!["origin"]);
        assert_eq!(minutes(&arrivals), vec![3]);
    }

    #[test]
    fn test_arrival_time_is_in_requested_zone() {
        let feed = feed(vec![trip("F", "f-1", vec![arriving("F23N", T + 300)])]);

        let arrivals = extract_arrivals(&feed, "F", "F23N", now());

        assert_eq!(arrivals[0].arrival_time.timezone(), New_York);
        assert_eq!(arrivals[0].arrival_time.timestamp(), T + 300);
        assert_eq!(
            arrivals[0].arrival_time.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
            "2023-11-14 17:18:20 EST"
        );
    }

    #[test]
    fn test_entities_without_trip_updates_are_ignored() {
        let feed = feed(vec![
            FeedEntity {
                id: "vehicle".to_string(),
                ..Default::default()
            },
            trip("F", "f-1", vec![arriving("F23N", T + 300)]),
        ]);

        assert_eq!(extract_arrivals(&feed, "F", "F23N", now()).len(), 1);
    }

    #[test]
    fn test_empty_feed_yields_nothing() {
        assert!(extract_arrivals(&feed(vec![]), "F", "F23N", now()).is_empty());
    }
}

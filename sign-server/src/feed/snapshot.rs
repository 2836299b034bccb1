//! Decoded feed model.
//!
//! Only the parts of a trip update the sign needs survive decoding: the
//! route, and per stop the stop ID and arrival instant. Arrival instants are
//! normalised to epoch seconds here, so nothing downstream cares how the
//! upstream encoded them.

use serde::Deserialize;

/// An arrival instant as encoded upstream.
///
/// Protobuf decoders yield a plain integer. JSON dumps of decoded feeds may
/// carry a 64-bit value as a decimal string, or as a
/// `{ "low": .., "high": .. }` pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawTime {
    Plain(i64),
    Text(String),
    Split { low: i64, high: i64 },
}

impl RawTime {
    /// Epoch seconds. Split pairs resolve to their low word; text that is
    /// not a decimal integer yields `None`.
    pub fn epoch_seconds(&self) -> Option<i64> {
        match self {
            RawTime::Plain(secs) => Some(*secs),
            RawTime::Text(text) => text.trim().parse().ok(),
            RawTime::Split { low, .. } => Some(*low),
        }
    }
}

/// One decoded feed: the trip updates it carried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub entities: Vec<TripUpdateEntity>,
}

/// A trip update for a single vehicle run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripUpdateEntity {
    pub route_id: Option<String>,
    pub stop_time_updates: Vec<StopTimeUpdate>,
}

/// Predicted arrival at one stop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopTimeUpdate {
    /// Direction-suffixed stop ID, e.g. `A22S`.
    pub stop_id: Option<String>,

    /// Arrival in epoch seconds.
    pub arrival: Option<i64>,
}

impl FeedSnapshot {
    /// Number of trip update entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl From<gtfs_rt::FeedMessage> for FeedSnapshot {
    fn from(message: gtfs_rt::FeedMessage) -> Self {
        let entities = message
            .entity
            .into_iter()
            .filter_map(|entity| entity.trip_update)
            .map(|update| TripUpdateEntity {
                route_id: update.trip.route_id,
                stop_time_updates: update
                    .stop_time_update
                    .into_iter()
                    .map(|stu| StopTimeUpdate {
                        stop_id: stu.stop_id,
                        arrival: stu.arrival.and_then(|event| event.time),
                    })
                    .collect(),
            })
            .collect();

        FeedSnapshot { entities }
    }
}

//! Mock feed source for running without network access.
//!
//! Serves feeds from JSON dumps of decoded feed messages. The file for a
//! URL is `<dir>/<key>.json`, where the key is the URL's last path segment
//! (after any `%2F`), so `.../mtagtfsfeeds/nyct%2Fgtfs-ace` reads
//! `gtfs-ace.json`. Files are re-read on every fetch.

use std::path::PathBuf;

use serde::Deserialize;

use super::client::FeedSource;
use super::error::FetchError;
use super::snapshot::{FeedSnapshot, RawTime, StopTimeUpdate, TripUpdateEntity};

#[derive(Debug, Deserialize)]
struct JsonFeed {
    #[serde(default)]
    entity: Vec<JsonEntity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonEntity {
    trip_update: Option<JsonTripUpdate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonTripUpdate {
    #[serde(default)]
    trip: JsonTrip,
    #[serde(default)]
    stop_time_update: Vec<JsonStopTimeUpdate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonTrip {
    route_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonStopTimeUpdate {
    stop_id: Option<String>,
    arrival: Option<JsonStopTimeEvent>,
}

#[derive(Debug, Deserialize)]
struct JsonStopTimeEvent {
    time: Option<RawTime>,
}

impl JsonFeed {
    fn into_snapshot(self) -> FeedSnapshot {
        let entities = self
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
                        arrival: stu
                            .arrival
                            .and_then(|event| event.time)
                            .and_then(|time| time.epoch_seconds()),
                    })
                    .collect(),
            })
            .collect();

        FeedSnapshot { entities }
    }
}

/// Feed source that reads JSON fixtures from a directory.
#[derive(Debug, Clone)]
pub struct MockFeedSource {
    dir: PathBuf,
}

impl MockFeedSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", feed_key(url)))
    }
}

impl FeedSource for MockFeedSource {
    async fn fetch(&self, url: &str) -> Result<FeedSnapshot, FetchError> {
        let path = self.path_for(url);

        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FetchError::Mock {
                message: format!("failed to read {}: {}", path.display(), e),
            })?;

        let feed: JsonFeed = serde_json::from_str(&json).map_err(|e| FetchError::Mock {
            message: format!("failed to parse {}: {}", path.display(), e),
        })?;

        Ok(feed.into_snapshot())
    }
}

/// Last path segment of a feed URL, ignoring any query string.
fn feed_key(url: &str) -> &str {
    let path = url.split('?').next().unwrap_or(url).trim_end_matches('/');
    let segment = path.rsplit('/').next().unwrap_or(path);
    segment.rsplit("%2F").next().unwrap_or(segment)
}

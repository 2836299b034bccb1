//! Sign board: arrivals for every configured row.
//!
//! Ties the feed cache, arrival extraction and station lookup together.
//! One board is built at startup and shared by all requests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::arrivals::{ArrivalRecord, DisplayLimits, extract_arrivals_at, reduce_for_display};
use crate::cache::{CacheConfig, FeedCache, FeedSet};
use crate::config::{ConfigError, SignConfig};
use crate::feed::FeedSource;
use crate::stations::{StationIndex, StationMatch};

/// Arrivals for one sign row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowArrivals {
    pub key: String,
    pub label: String,
    pub station_name: String,
    pub station_id: String,
    pub lines: Vec<String>,
    pub arrivals: Vec<ArrivalRecord>,
}

/// Arrivals for every row, with the feed set they came from.
#[derive(Debug, Clone)]
pub struct BoardArrivals {
    /// When the arrivals were computed
    pub at: DateTime<Utc>,
    pub feeds: Arc<FeedSet>,
    /// Rows in layout key order
    pub rows: Vec<RowArrivals>,
}

/// The sign's arrival service.
pub struct SignBoard<S> {
    config: SignConfig,
    feeds: FeedCache<S>,
    stations: StationIndex,
    limits: DisplayLimits,
}

impl<S: FeedSource + 'static> SignBoard<S> {
    /// Build a board from a validated config.
    pub fn new(
        config: SignConfig,
        source: S,
        stations: StationIndex,
        cache_config: &CacheConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let feeds = FeedCache::new(source, config.feeds.clone(), cache_config)?;

        Ok(Self {
            config,
            feeds,
            stations,
            limits: DisplayLimits::default(),
        })
    }

    /// Override how many arrivals each row shows.
    pub fn with_limits(mut self, limits: DisplayLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Display-ready arrivals for every row.
    pub async fn arrivals(&self) -> BoardArrivals {
        let feeds = self.feeds.snapshots().await;
        self.rows_at(feeds, Utc::now(), Some(&self.limits))
    }

    /// Every upcoming arrival for every row, without display limits.
    pub async fn raw_arrivals(&self) -> BoardArrivals {
        let feeds = self.feeds.snapshots().await;
        self.rows_at(feeds, Utc::now(), None)
    }

    /// Current feed set, refreshing if stale.
    pub async fn feed_set(&self) -> Arc<FeedSet> {
        self.feeds.snapshots().await
    }

    /// Station name for a stop ID; the ID itself if unknown.
    pub fn resolve_station(&self, id: &str) -> String {
        self.stations.resolve(id)
    }

    /// Stations whose name contains `term`.
    pub fn search_stations(&self, term: &str) -> Vec<StationMatch> {
        self.stations.search(term)
    }

    pub fn config(&self) -> &SignConfig {
        &self.config
    }

    /// Display name for a station key: configured name, else the index.
    pub fn station_name(&self, station_key: &str) -> String {
        match self.config.stations.get(station_key) {
            Some(station) if !station.name.is_empty() => station.name.clone(),
            Some(station) => self.stations.resolve(&station.id),
            None => station_key.to_string(),
        }
    }

    /// Evaluate every row against one feed set and one "now".
    fn rows_at(
        &self,
        feeds: Arc<FeedSet>,
        at: DateTime<Utc>,
        limits: Option<&DisplayLimits>,
    ) -> BoardArrivals {
        let now = at.timestamp();
        let direction = self.config.direction;

        let rows = self
            .config
            .layout
            .iter()
            .filter_map(|(key, row)| {
                let station = self.config.station_for(row)?;
                let extracted = extract_arrivals_at(
                    feeds.get(&row.feed),
                    &station.id,
                    direction,
                    &row.lines,
                    now,
                );

                debug!(
                    row = %key,
                    feed = %row.feed,
                    stop = %station.id,
                    arrivals = extracted.len(),
                    "Extracted arrivals"
                );

                let arrivals = match limits {
                    Some(limits) => reduce_for_display(extracted, limits),
                    None => extracted,
                };

                Some(RowArrivals {
                    key: key.clone(),
                    label: row.label.clone(),
                    station_name: self.station_name(&row.station),
                    station_id: station.id.clone(),
                    lines: row.lines.clone(),
                    arrivals,
                })
            })
            .collect();

        BoardArrivals { at, feeds, rows }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cache::tests::CountingSource;
    use crate::feed::{FeedSnapshot, StopTimeUpdate, TripUpdateEntity};

    pub(crate) const CONFIG: &str = r#"{
        "server": { "port": 3000 },
        "direction": "S",
        "feeds": {
            "north": "mock://north",
            "south": "mock://south"
        },
        "stations": {
            "fourteenth": { "id": "A31", "name": "14 St" },
            "jay": { "id": "A41", "name": "" }
        },
        "layout": {
            "row1": { "feed": "north", "station": "fourteenth", "lines": ["A", "C", "E"], "label": "8 Av" },
            "row2": { "feed": "south", "station": "jay", "lines": ["A", "C"], "label": "Fulton" },
            "row3": { "feed": "south", "station": "jay", "lines": [], "label": "All" }
        }
    }"#;

    fn trip(route: &str, stop: &str, arrival: i64) -> TripUpdateEntity {
        TripUpdateEntity {
            route_id: Some(route.to_string()),
            stop_time_updates: vec![StopTimeUpdate {
                stop_id: Some(stop.to_string()),
                arrival: Some(arrival),
            }],
        }
    }

    /// Board where `north` always fails and `south` serves A/C/F trips at A41S.
    pub(crate) fn board() -> SignBoard<CountingSource> {
        let now = Utc::now().timestamp();
        let south = FeedSnapshot {
            entities: vec![
                trip("A", "A41S", now + 60),
                trip("A", "A41S", now + 300),
                trip("A", "A41S", now + 420),
                trip("C", "A41S", now + 180),
                trip("F", "A41S", now + 240),
                trip("A", "A41N", now + 30),
                trip("C", "A41S", now - 60),
            ],
        };

        let source = CountingSource::new().with_feed("mock://south", south);
        let config = SignConfig::from_json(CONFIG).unwrap();
        let stations = StationIndex::from_entries([
            ("A41".to_string(), "Jay St-MetroTech".to_string()),
            ("A31".to_string(), "14 St".to_string()),
        ]);

        SignBoard::new(config, source, stations, &CacheConfig::default()).unwrap()
    }

    fn routes(row: &RowArrivals) -> Vec<&str> {
        row.arrivals.iter().map(|a| a.route.as_str()).collect()
    }

    #[tokio::test]
    async fn failed_feed_darkens_only_its_rows() {
        let board = board();
        let result = board.arrivals().await;

        let health = result.feeds.health();
        assert!(!health["north"]);
        assert!(health["south"]);

        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.rows[0].key, "row1");
        assert!(result.rows[0].arrivals.is_empty());
        assert!(!result.rows[1].arrivals.is_empty());
    }

    #[tokio::test]
    async fn rows_are_filtered_and_reduced() {
        let board = board();
        let result = board.arrivals().await;

        // A+C only, A capped at two
        assert_eq!(routes(&result.rows[1]), vec!["A", "C", "A"]);

        // All routes, capped at four overall
        assert_eq!(routes(&result.rows[2]), vec!["A", "C", "F", "A"]);
    }

    #[tokio::test]
    async fn raw_arrivals_are_unreduced() {
        let board = board();
        let result = board.raw_arrivals().await;

        assert_eq!(routes(&result.rows[2]), vec!["A", "C", "F", "A", "A"]);
        assert_eq!(result.feeds.status()["north"], "ERROR");
        assert_eq!(result.feeds.status()["south"], "OK (7 entities)");
    }

    #[tokio::test]
    async fn station_names_fall_back_to_index() {
        let board = board();
        let result = board.arrivals().await;

        assert_eq!(result.rows[0].station_name, "14 St");
        assert_eq!(result.rows[1].station_name, "Jay St-MetroTech");
        assert_eq!(result.rows[1].station_id, "A41");
    }

    #[tokio::test]
    async fn requests_share_cached_feeds() {
        let board = board();
        board.arrivals().await;
        board.raw_arrivals().await;
        board.feed_set().await;

        assert_eq!(board.feeds.source().calls("mock://south"), 1);
        assert_eq!(board.feeds.source().calls("mock://north"), 1);
    }

    #[tokio::test]
    async fn custom_limits() {
        let board = board().with_limits(DisplayLimits {
            max_per_route: 1,
            max_total: 2,
        });
        let result = board.arrivals().await;
        assert_eq!(routes(&result.rows[2]), vec!["A", "C"]);
    }

    #[test]
    fn station_lookup_delegates() {
        let board = board();
        assert_eq!(board.resolve_station("A41N"), "Jay St-MetroTech");
        assert_eq!(board.resolve_station("X01"), "X01");
        assert_eq!(board.search_stations("jay").len(), 1);
    }
}

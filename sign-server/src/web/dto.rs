//! Data transfer objects for web requests and responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::arrivals::ArrivalRecord;
use crate::board::{BoardArrivals, RowArrivals};
use crate::config::{Direction, RowConfig, SignConfig, StationConfig};

/// Endpoint descriptions listed on `/`.
pub const ENDPOINTS: [(&str, &str); 6] = [
    ("/api/arrivals", "Get formatted arrivals for display (main endpoint)"),
    ("/api/arrivals/raw", "Get raw arrival data for debugging"),
    ("/api/stations?search=<term>", "Search for stations by name"),
    ("/api/station/:id", "Get station name by ID"),
    ("/api/config", "Get current display configuration"),
    ("/api/health", "Health check with feed status"),
];

/// Service description served at `/`.
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
    pub config: IndexConfig,
}

/// Row summary on the index page.
#[derive(Debug, Serialize)]
pub struct IndexConfig {
    pub direction: Direction,
    pub rows: Vec<RowSummary>,
}

#[derive(Debug, Serialize)]
pub struct RowSummary {
    pub row: String,
    /// Comma-separated route IDs
    pub lines: String,
    /// Station key
    pub station: String,
}

impl IndexResponse {
    pub fn from_config(config: &SignConfig) -> Self {
        let rows = config
            .layout
            .iter()
            .map(|(key, row)| RowSummary {
                row: key.clone(),
                lines: row.lines.join(", "),
                station: row.station.clone(),
            })
            .collect();

        Self {
            name: "NYC Subway Sign API",
            version: env!("CARGO_PKG_VERSION"),
            endpoints: ENDPOINTS.into_iter().collect(),
            config: IndexConfig {
                direction: config.direction,
                rows,
            },
        }
    }
}

/// Response for `/api/arrivals`.
#[derive(Debug, Serialize)]
pub struct ArrivalsResponse {
    /// Milliseconds since the epoch
    pub timestamp: i64,
    pub direction: Direction,
    pub rows: BTreeMap<String, RowResponse>,
}

/// One row of `/api/arrivals`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowResponse {
    pub label: String,
    pub station: String,
    pub station_id: String,
    pub lines: Vec<String>,
    pub arrivals: Vec<ArrivalRecord>,
}

impl From<RowArrivals> for RowResponse {
    fn from(row: RowArrivals) -> Self {
        Self {
            label: row.label,
            station: row.station_name,
            station_id: row.station_id,
            lines: row.lines,
            arrivals: row.arrivals,
        }
    }
}

impl ArrivalsResponse {
    pub fn new(board: BoardArrivals, direction: Direction) -> Self {
        Self {
            timestamp: board.at.timestamp_millis(),
            direction,
            rows: board
                .rows
                .into_iter()
                .map(|row| (row.key.clone(), RowResponse::from(row)))
                .collect(),
        }
    }
}

/// Response for `/api/arrivals/raw`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArrivalsResponse {
    pub timestamp: i64,
    /// Feed name → `"OK (<n> entities)"` or `"ERROR"`
    pub feed_status: BTreeMap<String, String>,
    pub rows: BTreeMap<String, Vec<ArrivalRecord>>,
}

impl From<BoardArrivals> for RawArrivalsResponse {
    fn from(board: BoardArrivals) -> Self {
        Self {
            timestamp: board.at.timestamp_millis(),
            feed_status: board.feeds.status(),
            rows: board
                .rows
                .into_iter()
                .map(|row| (row.key, row.arrivals))
                .collect(),
        }
    }
}

/// Query for `/api/stations`.
#[derive(Debug, Deserialize)]
pub struct StationSearchRequest {
    #[serde(default)]
    pub search: String,
}

/// Response for `/api/station/:id`.
#[derive(Debug, Serialize)]
pub struct StationResponse {
    pub id: String,
    pub name: String,
}

/// Response for `/api/config`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub stations: BTreeMap<String, StationConfig>,
    pub direction: Direction,
    pub layout: BTreeMap<String, RowConfig>,
    pub display: serde_json::Value,
    /// Display poll interval in milliseconds
    pub refresh_interval: u64,
}

impl From<&SignConfig> for ConfigResponse {
    fn from(config: &SignConfig) -> Self {
        Self {
            stations: config.stations.clone(),
            direction: config.direction,
            layout: config.layout.clone(),
            display: config.display.clone(),
            refresh_interval: config.server.refresh_interval,
        }
    }
}

/// Response for `/api/health`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: i64,
    /// Milliseconds since the cached feeds were fetched
    pub cache_age: u64,
    /// When the cached feeds were fetched, epoch milliseconds
    pub fetched_at: i64,
    /// Feed name → whether it produced a snapshot in the last refresh
    pub feeds: BTreeMap<String, bool>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

//! Sign configuration file.
//!
//! The same `config.json` is read by the sign hardware client, so unknown
//! sections (like `display`) are carried through untouched.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default freshness window for cached feeds.
const DEFAULT_TTL_SECS: u64 = 15;

/// Default per-request feed timeout.
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// Config file is not valid JSON for [`SignConfig`]
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    /// No feeds configured
    #[error("at least one feed must be configured")]
    NoFeeds,

    /// A row names a feed that isn't configured
    #[error("row {row} references unknown feed {feed}")]
    UnknownFeed { row: String, feed: String },

    /// A row names a station that isn't configured
    #[error("row {row} references unknown station {station}")]
    UnknownStation { row: String, station: String },
}

/// Travel direction; doubles as the stop ID suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "S")]
    South,
}

impl Direction {
    /// Stop ID suffix for this direction.
    pub fn suffix(self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::South => "S",
        }
    }

    /// Human-readable description for startup logs.
    pub fn describe(self) -> &'static str {
        match self {
            Direction::North => "Uptown (Northbound)",
            Direction::South => "Downtown (Southbound)",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    pub port: u16,

    /// How often the display client polls, in milliseconds
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_refresh_interval() -> u64 {
    30_000
}

/// A monitored station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationConfig {
    /// Base stop ID without direction suffix (e.g. `A22`)
    pub id: String,

    /// Display name; looked up from the station table when empty
    #[serde(default)]
    pub name: String,
}

/// One sign row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowConfig {
    /// Key into [`SignConfig::feeds`]
    pub feed: String,

    /// Key into [`SignConfig::stations`]
    pub station: String,

    /// Routes to show; empty shows every route at the stop
    #[serde(default)]
    pub lines: Vec<String>,

    #[serde(default)]
    pub label: String,
}

/// Feed cache tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSettings {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// The whole sign configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignConfig {
    pub server: ServerConfig,

    pub direction: Direction,

    /// Feed name → URL
    pub feeds: BTreeMap<String, String>,

    /// Station key → station
    pub stations: BTreeMap<String, StationConfig>,

    /// Row key → row, displayed in key order
    pub layout: BTreeMap<String, RowConfig>,

    /// Display hardware settings, passed through to the client
    #[serde(default)]
    pub display: serde_json::Value,

    #[serde(default)]
    pub cache: CacheSettings,
}

impl SignConfig {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Parse and validate config JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SignConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every row points at a configured feed and station.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feeds.is_empty() {
            return Err(ConfigError::NoFeeds);
        }

        for (key, row) in &self.layout {
            if !self.feeds.contains_key(&row.feed) {
                return Err(ConfigError::UnknownFeed {
                    row: key.clone(),
                    feed: row.feed.clone(),
                });
            }
            if !self.stations.contains_key(&row.station) {
                return Err(ConfigError::UnknownStation {
                    row: key.clone(),
                    station: row.station.clone(),
                });
            }
        }

        Ok(())
    }

    /// Station for a row. Rows are validated at load, so this only misses
    /// for rows that were never part of the config.
    pub fn station_for(&self, row: &RowConfig) -> Option<&StationConfig> {
        self.stations.get(&row.station)
    }
}

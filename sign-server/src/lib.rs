//! Subway arrival sign server.
//!
//! Fetches GTFS-realtime feeds, extracts upcoming arrivals for a handful
//! of monitored platforms, and serves them as a compact list for an LED
//! sign to display.

pub mod arrivals;
pub mod board;
pub mod cache;
pub mod config;
pub mod feed;
pub mod stations;
pub mod web;

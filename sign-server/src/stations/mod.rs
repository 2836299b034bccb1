//! Station name lookup.
//!
//! Maps stop IDs to station names using the GTFS `stops.txt` table,
//! loaded once on first use and kept for the life of the process.

mod error;
mod index;

pub use error::StationError;
pub use index::{StationIndex, StationMatch};

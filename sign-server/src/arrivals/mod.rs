//! Upcoming arrivals at a monitored stop.
//!
//! Extraction turns a feed snapshot into a time-ordered list of arrivals at
//! one platform; reduction trims that list to what fits on a sign row.
//! Both are pure and synchronous.

mod extract;
mod reduce;

pub use extract::extract_arrivals_at;
pub use reduce::{DisplayLimits, reduce_for_display};

use serde::Serialize;

/// One upcoming arrival.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalRecord {
    /// Route ID (e.g. `A`); empty when the trip carried none
    pub route: String,

    /// Direction-suffixed stop ID (e.g. `A22S`)
    pub stop_id: String,

    /// Arrival in epoch seconds
    pub arrival_time: i64,

    /// Minutes from extraction time, rounded to nearest
    pub minutes_until: i64,
}

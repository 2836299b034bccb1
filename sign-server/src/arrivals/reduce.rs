//! Trimming arrivals to fit a sign row.

use std::collections::HashMap;

use super::ArrivalRecord;

/// How many arrivals a row shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayLimits {
    /// Most arrivals kept for any one route.
    pub max_per_route: usize,

    /// Most arrivals kept overall.
    pub max_total: usize,
}

impl Default for DisplayLimits {
    fn default() -> Self {
        Self {
            max_per_route: 2,
            max_total: 4,
        }
    }
}

/// Reduce time-sorted arrivals to a display list.
///
/// Each route keeps only its first `max_per_route` arrivals, so a frequent
/// route cannot crowd out the others. The survivors are re-sorted by arrival
/// time and cut to `max_total`.
pub fn reduce_for_display(
    arrivals: Vec<ArrivalRecord>,
    limits: &DisplayLimits,
) -> Vec<ArrivalRecord> {
    let mut buckets: Vec<Vec<ArrivalRecord>> = Vec::new();
    let mut bucket_of: HashMap<String, usize> = HashMap::new();

    for arrival in arrivals {
        let idx = *bucket_of.entry(arrival.route.clone()).or_insert_with(|| {
            buckets.push(Vec::new());
            buckets.len() - 1
        });

        let bucket = &mut buckets[idx];
        if bucket.len() < limits.max_per_route {
            bucket.push(arrival);
        }
    }

    let mut result: Vec<ArrivalRecord> = buckets.into_iter().flatten().collect();
    result.sort_by_key(|a| a.arrival_time);
    result.truncate(limits.max_total);
    result
}

//! Arrival extraction.

use crate::config::Direction;
use crate::feed::FeedSnapshot;

use super::ArrivalRecord;

/// Arrivals at `stop_base_id` + `direction` as seen at `now` (epoch seconds).
///
/// A missing snapshot yields no arrivals. Trips whose route is not in
/// `routes` are skipped unless `routes` is empty. Stop IDs must match
/// exactly. Updates without an arrival time, or arriving before `now`, are
/// dropped. The result is sorted by arrival time; equal times keep feed
/// order.
pub fn extract_arrivals_at(
    snapshot: Option<&FeedSnapshot>,
    stop_base_id: &str,
    direction: Direction,
    routes: &[String],
    now: i64,
) -> Vec<ArrivalRecord> {
    let Some(snapshot) = snapshot else {
        return Vec::new();
    };

    let full_stop_id = format!("{stop_base_id}{}", direction.suffix());
    let mut arrivals = Vec::new();

    for entity in &snapshot.entities {
        let route = entity.route_id.as_deref().unwrap_or_default();
        if !routes.is_empty() && !routes.iter().any(|r| r == route) {
            continue;
        }

        for update in &entity.stop_time_updates {
            if update.stop_id.as_deref() != Some(full_stop_id.as_str()) {
                continue;
            }

            let Some(arrival_time) = update.arrival else {
                continue;
            };
            if arrival_time < now {
                continue;
            }

            arrivals.push(ArrivalRecord {
                route: route.to_string(),
                stop_id: full_stop_id.clone(),
                arrival_time,
                minutes_until: minutes_until(arrival_time - now),
            });
        }
    }

    arrivals.sort_by_key(|a| a.arrival_time);
    arrivals
}

/// Non-negative seconds to whole minutes, halves rounding up.
fn minutes_until(secs: i64) -> i64 {
    (secs + 30) / 60
}

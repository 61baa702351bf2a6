//! Noise filtering for implausible tower hand-offs.
//!
//! A jump whose implied speed is far beyond anything a vehicle reaches is
//! much more likely a hand-off artifact than genuine travel. The filter
//! drops the earlier sighting of any pair that is both far apart and close
//! in time; without coordinates for both towers no judgement is possible
//! and the pair passes through.

use log::debug;

use crate::geo_utils::{haversine_km, minutes_between};
use crate::{CoordinateMap, InferenceConfig, Sighting};

/// Drop sightings that imply a physically implausible jump.
///
/// For each consecutive pair `(a, b)`, `a` is discarded when the towers are
/// more than `config.max_jump_km` apart and less than
/// `config.min_travel_minutes` elapsed between them. The final sighting is
/// always retained; surviving sightings keep their original order.
pub fn drop_implausible_jumps(
    sightings: &[Sighting],
    coords: &CoordinateMap,
    config: &InferenceConfig,
) -> Vec<Sighting> {
    if sightings.len() < 2 {
        return sightings.to_vec();
    }

    let mut clean = Vec::with_capacity(sightings.len());
    let mut dropped = 0usize;

    for pair in sightings.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);

        let distance_km = match (coords.get(&a.tower_id), coords.get(&b.tower_id)) {
            (Some(ca), Some(cb)) => haversine_km(ca, cb),
            _ => 0.0,
        };
        let gap_minutes = minutes_between(a.timestamp, b.timestamp);

        if distance_km > config.max_jump_km && gap_minutes < config.min_travel_minutes {
            dropped += 1;
            continue;
        }
        clean.push(a.clone());
    }

    // Last sighting is never a pair's earlier element; keep it unconditionally.
    clean.push(sightings[sightings.len() - 1].clone());

    if dropped > 0 {
        debug!(
            "noise filter dropped {} of {} sightings",
            dropped,
            sightings.len()
        );
    }
    clean
}

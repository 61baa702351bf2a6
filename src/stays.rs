//! Stay-point detection.
//!
//! A stay point is a maximal run of sightings at one tower whose span meets
//! the significance threshold: presence, not transit. Simplified variant of
//! Li et al.'s stay-point algorithm over discrete location identifiers; the
//! scan window for one run is bounded at five times the threshold.

use serde::{Deserialize, Serialize};

use crate::{InferenceConfig, Sighting};

/// A location the device meaningfully stayed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StayPoint {
    pub tower_id: String,
    /// First sighting of the run (epoch seconds).
    pub start: i64,
    /// Last sighting of the run (epoch seconds).
    pub end: i64,
}

impl StayPoint {
    /// Span of the stay in seconds.
    pub fn duration_secs(&self) -> i64 {
        self.end - self.start
    }
}

/// Detect stay points in a cleaned, time-sorted sighting sequence.
///
/// A run extends while the tower stays the same and the span from the run's
/// first sighting remains within `5 * config.min_stay_secs`; it is emitted
/// when its span reaches `config.min_stay_secs`.
pub fn detect_stay_points(sightings: &[Sighting], config: &InferenceConfig) -> Vec<StayPoint> {
    let mut stays = Vec::new();
    let window_secs = config.min_stay_secs * 5.0;

    let mut i = 0;
    while i < sightings.len() {
        let mut j = i + 1;
        while j < sightings.len()
            && sightings[j].tower_id == sightings[i].tower_id
            && (sightings[j].timestamp - sightings[i].timestamp) as f64 <= window_secs
        {
            j += 1;
        }

        let start = sightings[i].timestamp;
        let end = sightings[j - 1].timestamp;
        if (end - start) as f64 >= config.min_stay_secs {
            stays.push(StayPoint {
                tower_id: sightings[i].tower_id.clone(),
                start,
                end,
            });
        }
        i = j;
    }

    stays
}

//! Composite per-tower relevance scoring.
//!
//! Each tower a device dwelt at accumulates evidence across all in-session
//! transitions where it is the origin: total dwell, visit count, night
//! presence, merchant hits and last-seen time. The composite score blends
//! those factors through the configured weight vector; ranking is by
//! descending score with ascending tower id as the deterministic tie-break.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::geo_utils::is_night;
use crate::sessions::Session;
use crate::{InferenceConfig, ScoreWeights};

/// Accumulated evidence and final score for one tower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerScore {
    pub tower_id: String,
    /// Cumulative dwell seconds with this tower as origin.
    pub total_duration: f64,
    /// Number of in-session transitions originating here.
    pub visit_count: u32,
    /// Transitions whose origin fell in the night window.
    pub night_count: u32,
    /// Transitions whose origin sighting was merchant-flagged.
    pub merchant_hits: u32,
    /// Latest origin timestamp (epoch seconds).
    pub last_seen: i64,
    /// Composite score; populated once accumulation finishes.
    pub score: f64,
}

/// Ranked scoring result for one device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBoard {
    /// All scored towers, descending by score (ties: tower id ascending).
    pub ranked: Vec<TowerScore>,
}

impl ScoreBoard {
    /// The best-scored tower, if any tower was ever dwelt at.
    pub fn best(&self) -> Option<&TowerScore> {
        self.ranked.first()
    }

    /// Ids of the top `n` towers.
    pub fn top_ids(&self, n: usize) -> Vec<String> {
        self.ranked
            .iter()
            .take(n)
            .map(|s| s.tower_id.clone())
            .collect()
    }
}

/// Score every origin tower across the given sessions.
///
/// `now` is the reference time for the recency term, conventionally the last
/// cleaned sighting's timestamp. Deterministic: identical input yields an
/// identical ranking.
pub fn score_towers(sessions: &[Session], now: i64, config: &InferenceConfig) -> ScoreBoard {
    let mut stats: HashMap<String, TowerScore> = HashMap::new();

    for session in sessions {
        for pair in session.sightings().windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let dwell = (b.timestamp - a.timestamp) as f64;

            let entry = stats
                .entry(a.tower_id.clone())
                .or_insert_with(|| TowerScore {
                    tower_id: a.tower_id.clone(),
                    total_duration: 0.0,
                    visit_count: 0,
                    night_count: 0,
                    merchant_hits: 0,
                    last_seen: a.timestamp,
                    score: 0.0,
                });

            entry.total_duration += dwell;
            entry.visit_count += 1;
            if is_night(a.timestamp, config.night_start_hour, config.night_end_hour) {
                entry.night_count += 1;
            }
            if a.merchant {
                entry.merchant_hits += 1;
            }
            entry.last_seen = a.timestamp;
        }
    }

    let mut ranked: Vec<TowerScore> = stats
        .into_values()
        .map(|mut s| {
            s.score = composite_score(&s, now, &config.weights, config.recency_decay_secs);
            s
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.tower_id.cmp(&b.tower_id))
    });

    ScoreBoard { ranked }
}

fn composite_score(stat: &TowerScore, now: i64, weights: &ScoreWeights, decay_secs: f64) -> f64 {
    let recency_secs = (now - stat.last_seen) as f64;
    weights.duration * (stat.total_duration + 1.0).ln()
        + weights.frequency * stat.visit_count as f64
        + weights.recency * (-recency_secs / decay_secs).exp()
        + weights.night * stat.night_count as f64
        + weights.merchant * stat.merchant_hits as f64
}

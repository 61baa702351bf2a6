//! Session segmentation.
//!
//! A session is a maximal run of sightings with no internal gap beyond the
//! configured threshold. Runs that are too short, or too brief in span, are
//! discarded rather than emitted; the retained sessions therefore form a
//! subsequence partition of the input, not a cover.

use crate::geo_utils::minutes_between;
use crate::{InferenceConfig, Sighting};

/// An ordered, non-empty run of temporally coherent sightings.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    sightings: Vec<Sighting>,
}

impl Session {
    /// The sightings of this session, in original order.
    pub fn sightings(&self) -> &[Sighting] {
        &self.sightings
    }

    /// Number of sightings.
    pub fn len(&self) -> usize {
        self.sightings.len()
    }

    /// Sessions are never empty; provided for clippy symmetry.
    pub fn is_empty(&self) -> bool {
        self.sightings.is_empty()
    }

    /// Timestamp of the first sighting.
    pub fn start(&self) -> i64 {
        self.sightings[0].timestamp
    }

    /// Timestamp of the last sighting.
    pub fn end(&self) -> i64 {
        self.sightings[self.sightings.len() - 1].timestamp
    }

    /// Span between first and last sighting in seconds.
    pub fn duration_secs(&self) -> f64 {
        (self.end() - self.start()) as f64
    }
}

/// Split a cleaned sighting sequence into retained sessions.
///
/// A new run starts whenever the gap to the previous sighting exceeds
/// `config.session_gap_minutes`. A completed run is kept only when it has at
/// least `config.min_session_len` sightings and spans at least
/// `config.min_session_secs`; the trailing run is judged by the same rule.
pub fn build_sessions(sightings: &[Sighting], config: &InferenceConfig) -> Vec<Session> {
    let mut sessions = Vec::new();
    let mut current: Vec<Sighting> = Vec::new();

    for sighting in sightings {
        match current.last() {
            None => current.push(sighting.clone()),
            Some(last) => {
                let gap = minutes_between(last.timestamp, sighting.timestamp);
                if gap > config.session_gap_minutes {
                    finish_run(&mut sessions, std::mem::take(&mut current), config);
                    current.push(sighting.clone());
                } else {
                    current.push(sighting.clone());
                }
            }
        }
    }
    finish_run(&mut sessions, current, config);

    sessions
}

fn finish_run(sessions: &mut Vec<Session>, run: Vec<Sighting>, config: &InferenceConfig) {
    if run.len() < config.min_session_len {
        return;
    }
    let span = (run[run.len() - 1].timestamp - run[0].timestamp) as f64;
    if span < config.min_session_secs {
        return;
    }
    sessions.push(Session { sightings: run });
}

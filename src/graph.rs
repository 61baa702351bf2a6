//! Tower-to-tower transition graph.
//!
//! Every observed transition inserts the directed edge and its mirror, so
//! the graph is symmetric by construction: movement is modelled as
//! undirected for simulation purposes. Edges carry both an observation
//! count and the cumulative dwell seconds spent at the origin before the
//! hand-off; the simulator picks one of the two as its weight source.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::Sighting;

/// Weights of one undirected transition edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStats {
    /// Number of observed transitions.
    pub count: u32,
    /// Cumulative dwell seconds at the origin before each transition.
    pub dwell_secs: f64,
}

/// Weighted, symmetric graph of observed tower-to-tower movements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionGraph {
    edges: HashMap<String, HashMap<String, EdgeStats>>,
}

impl TransitionGraph {
    /// Build the graph from a cleaned, time-sorted sighting sequence.
    ///
    /// Self-transitions contribute no edge but do not break the sequence.
    pub fn from_sightings(sightings: &[Sighting]) -> Self {
        let mut graph = Self::default();
        for pair in sightings.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.tower_id == b.tower_id {
                continue;
            }
            let dwell = (b.timestamp - a.timestamp) as f64;
            graph.record(&a.tower_id, &b.tower_id, dwell);
            graph.record(&b.tower_id, &a.tower_id, dwell);
        }
        graph
    }

    fn record(&mut self, from: &str, to: &str, dwell_secs: f64) {
        let entry = self
            .edges
            .entry(from.to_string())
            .or_default()
            .entry(to.to_string())
            .or_default();
        entry.count += 1;
        entry.dwell_secs += dwell_secs;
    }

    /// Outgoing edges of a tower, if it was ever observed transitioning.
    pub fn neighbors(&self, tower_id: &str) -> Option<&HashMap<String, EdgeStats>> {
        self.edges.get(tower_id)
    }

    /// Stats of a specific edge.
    pub fn edge(&self, from: &str, to: &str) -> Option<&EdgeStats> {
        self.edges.get(from).and_then(|m| m.get(to))
    }

    /// All towers that appear as an edge origin.
    pub fn towers(&self) -> impl Iterator<Item = &String> {
        self.edges.keys()
    }

    /// Number of towers with at least one edge.
    pub fn tower_count(&self) -> usize {
        self.edges.len()
    }

    /// True when no transition was ever recorded.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// The neighbor reached by the heaviest outgoing edge (by count, ties by
    /// tower id for determinism).
    pub fn heaviest_neighbor(&self, tower_id: &str) -> Option<&str> {
        let neighbors = self.edges.get(tower_id)?;
        neighbors
            .iter()
            .max_by(|(ta, ea), (tb, eb)| {
                ea.count
                    .cmp(&eb.count)
                    .then_with(|| tb.as_str().cmp(ta.as_str()))
            })
            .map(|(tower, _)| tower.as_str())
    }
}

//! Monte Carlo movement simulation.
//!
//! Repeated weighted random walks over the transition graph give a
//! law-of-large-numbers estimate of where the device plausibly moves next,
//! smoothing out the sparsity of the raw graph. All randomness flows from a
//! caller-supplied `StdRng`, so a fixed seed reproduces the outcome
//! bit for bit.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::graph::TransitionGraph;
use crate::{InferenceConfig, TransitionWeighting};

/// Terminal tally for one tower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TowerVisits {
    pub tower: String,
    pub count: u32,
}

/// Aggregated simulation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationOutcome {
    /// Tower where the most trials ended.
    pub most_likely_tower: String,
    /// All terminal tallies, descending by count (ties: tower id ascending).
    pub distribution: Vec<TowerVisits>,
}

/// Run weighted random walks from `start` and tally where they end.
///
/// Each of `config.simulation_trials` trials takes up to
/// `config.simulation_steps` steps; at every step the current tower's
/// outgoing edge weights are normalized into a distribution and sampled by
/// inverse CDF. A tower without recorded neighbors ends the trial where it
/// stands. The sum of all tallies always equals the trial count.
pub fn simulate_movement(
    graph: &TransitionGraph,
    start: &str,
    config: &InferenceConfig,
    rng: &mut StdRng,
) -> SimulationOutcome {
    let mut terminals: HashMap<String, u32> = HashMap::new();

    for _ in 0..config.simulation_trials {
        let mut current = start.to_string();

        for _ in 0..config.simulation_steps {
            match step(graph, &current, config.weighting, rng) {
                Some(next) => current = next,
                None => break,
            }
        }

        *terminals.entry(current).or_insert(0) += 1;
    }

    let mut distribution: Vec<TowerVisits> = terminals
        .into_iter()
        .map(|(tower, count)| TowerVisits { tower, count })
        .collect();
    distribution.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tower.cmp(&b.tower)));

    SimulationOutcome {
        most_likely_tower: distribution[0].tower.clone(),
        distribution,
    }
}

/// Sample the next tower, or `None` at a dead end.
fn step(
    graph: &TransitionGraph,
    current: &str,
    weighting: TransitionWeighting,
    rng: &mut StdRng,
) -> Option<String> {
    let neighbors = graph.neighbors(current)?;
    if neighbors.is_empty() {
        return None;
    }

    // Deterministic iteration order so a fixed seed fixes the outcome.
    let mut edges: Vec<(&String, f64)> = neighbors
        .iter()
        .map(|(tower, stats)| {
            let w = match weighting {
                TransitionWeighting::Count => stats.count as f64,
                TransitionWeighting::Dwell => stats.dwell_secs,
            };
            (tower, w)
        })
        .collect();
    edges.sort_by(|(ta, _), (tb, _)| ta.cmp(tb));

    let total: f64 = edges.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return None;
    }

    let draw: f64 = rng.gen_range(0.0..1.0);
    let mut cumulative = 0.0;
    for (tower, weight) in &edges {
        cumulative += weight / total;
        if draw <= cumulative {
            return Some((*tower).clone());
        }
    }

    // Floating-point shortfall at the top of the CDF; take the last edge.
    edges.last().map(|(tower, _)| (*tower).clone())
}

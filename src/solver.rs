//! Constrained optimal path inference.
//!
//! Every sighting becomes a node of a forward-only event graph. An edge
//! `i -> j` exists when the elapsed time fits inside the gap window and the
//! implied speed between the two towers is physically reachable; its cost,
//! `1 / (transition_frequency * average_dwell_at_origin)`, makes
//! well-established, long-dwelling transitions cheap. A binary-heap Dijkstra
//! from the first sighting then yields the cheapest plausible explanation of
//! the device's movement, and the cheapest node inside the final time window
//! is taken as the refined terminal location.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::geo_utils::haversine_km;
use crate::{CoordinateMap, InferenceConfig, Sighting};

/// Reconstructed route and terminal estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEstimate {
    /// Tower of the chosen terminal node.
    pub terminal_tower: String,
    /// Tower ids along the reconstructed path, chronological.
    pub path: Vec<String>,
    /// Cumulative cost at the terminal.
    pub total_cost: f64,
    /// Edge count of the path.
    pub hops: usize,
    /// Timestamp of the terminal sighting (epoch seconds).
    pub timestamp: i64,
}

/// Candidate edge of the event graph.
#[derive(Debug, Clone, Copy)]
struct Edge {
    to: usize,
    weight: f64,
}

/// Min-heap entry keyed by cumulative cost.
#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    cost: f64,
    node: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.node == other.node
    }
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the std max-heap pops the cheapest entry first.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Solve for the cheapest physically-plausible route through the sightings.
///
/// Returns `None` only for an empty input. With at least one sighting the
/// solver always produces a route; when the event graph has no viable edge
/// from the source it degenerates to the first sighting alone at cost 0.
pub fn solve_constrained_path(
    sightings: &[Sighting],
    coords: &CoordinateMap,
    config: &InferenceConfig,
) -> Option<RouteEstimate> {
    if sightings.is_empty() {
        return None;
    }
    let n = sightings.len();

    let adjacency = build_event_graph(sightings, coords, config);

    // Dijkstra from node 0.
    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    dist[0] = 0.0;
    heap.push(HeapEntry { cost: 0.0, node: 0 });

    while let Some(HeapEntry { cost, node }) = heap.pop() {
        if cost > dist[node] {
            continue;
        }
        for edge in &adjacency[node] {
            let next_cost = cost + edge.weight;
            if next_cost < dist[edge.to] {
                dist[edge.to] = next_cost;
                prev[edge.to] = Some(node);
                heap.push(HeapEntry {
                    cost: next_cost,
                    node: edge.to,
                });
            }
        }
    }

    // Terminal candidates: nodes inside the gap window of the last sighting.
    // Scanning backwards with a strict `<` prefers the later index on ties.
    let last_ts = sightings[n - 1].timestamp;
    let mut best = n - 1;
    for i in (0..n - 1).rev() {
        let dt = (last_ts - sightings[i].timestamp) as f64;
        if dt > config.max_edge_gap_secs {
            break;
        }
        if dist[i] < dist[best] {
            best = i;
        }
    }

    // Every candidate unreachable: degenerate single-node route at the
    // source rather than an infinite-cost path.
    if dist[best].is_infinite() {
        return Some(RouteEstimate {
            terminal_tower: sightings[0].tower_id.clone(),
            path: vec![sightings[0].tower_id.clone()],
            total_cost: 0.0,
            hops: 0,
            timestamp: sightings[0].timestamp,
        });
    }

    // Reconstruct by predecessor links, then flip to chronological order.
    let mut path = Vec::new();
    let mut cursor = Some(best);
    while let Some(node) = cursor {
        path.push(sightings[node].tower_id.clone());
        cursor = prev[node];
    }
    path.reverse();

    Some(RouteEstimate {
        terminal_tower: sightings[best].tower_id.clone(),
        hops: path.len() - 1,
        path,
        total_cost: dist[best],
        timestamp: sightings[best].timestamp,
    })
}

/// Build the gap- and speed-gated event graph.
fn build_event_graph(
    sightings: &[Sighting],
    coords: &CoordinateMap,
    config: &InferenceConfig,
) -> Vec<Vec<Edge>> {
    let n = sightings.len();

    // Directed transition frequencies and per-tower average dwell from the
    // observed sequence.
    let mut frequency: HashMap<(&str, &str), u32> = HashMap::new();
    let mut dwell_sum: HashMap<&str, f64> = HashMap::new();
    let mut dwell_count: HashMap<&str, u32> = HashMap::new();

    for pair in sightings.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        *frequency
            .entry((a.tower_id.as_str(), b.tower_id.as_str()))
            .or_insert(0) += 1;
        *dwell_sum.entry(a.tower_id.as_str()).or_insert(0.0) +=
            (b.timestamp - a.timestamp) as f64;
        *dwell_count.entry(a.tower_id.as_str()).or_insert(0) += 1;
    }

    let avg_dwell = |tower: &str| -> f64 {
        match (dwell_sum.get(tower), dwell_count.get(tower)) {
            (Some(sum), Some(count)) if *count > 0 && *sum > 0.0 => sum / *count as f64,
            _ => 1.0,
        }
    };

    let mut adjacency: Vec<Vec<Edge>> = vec![Vec::new(); n];

    for i in 0..n {
        let from = &sightings[i];
        let coord_from = coords.get(&from.tower_id);

        for j in i + 1..n {
            let to_sighting = &sightings[j];
            let dt = (to_sighting.timestamp - from.timestamp) as f64;
            // Later nodes only have larger gaps; stop extending from i.
            if dt < 0.0 || dt > config.max_edge_gap_secs {
                break;
            }

            let (coord_a, coord_b) = match (coord_from, coords.get(&to_sighting.tower_id)) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };

            let dist_km = haversine_km(coord_a, coord_b);
            let speed_kmh = if dist_km == 0.0 {
                0.0
            } else if dt > 0.0 {
                dist_km / (dt / 3600.0)
            } else {
                f64::INFINITY
            };
            if speed_kmh > config.max_speed_kmh {
                continue;
            }

            let freq = frequency
                .get(&(from.tower_id.as_str(), to_sighting.tower_id.as_str()))
                .copied()
                .unwrap_or(1)
                .max(1) as f64;
            let weight = 1.0 / (freq * avg_dwell(&from.tower_id));

            adjacency[i].push(Edge { to: j, weight });
        }
    }

    adjacency
}

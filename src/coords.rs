//! Coordinate inference for towers that never carried a fix.
//!
//! Two towers are considered adjacent when one sighting is immediately
//! followed by a sighting at the other (self-transitions ignored). A tower
//! without a coordinate inherits the inverse-distance-weighted centroid of
//! its located neighbors. Propagation runs in passes over an index arena
//! until a full pass adds nothing; since a pass can only add entries, the
//! loop terminates and the outcome does not depend on discovery order.

use log::debug;
use std::collections::HashMap;

use crate::geo_utils::haversine_km;
use crate::{Coordinate, CoordinateMap, Sighting};

/// One tower in the adjacency arena.
struct TowerNode {
    tower_id: String,
    coord: Option<Coordinate>,
    /// Arena indices of co-occurring towers.
    neighbors: Vec<usize>,
}

/// Smoothing weight of a neighbor: a decreasing function of its haversine
/// distance from the (0, 0) reference, not a physical distance.
fn neighbor_weight(coord: &Coordinate) -> f64 {
    let origin = Coordinate::new(0.0, 0.0);
    1.0 / (1.0 + haversine_km(&origin, coord)).sqrt()
}

/// Infer coordinates for unlocated towers from their co-occurrence
/// neighbors.
///
/// Returns the input map extended with inferred entries. Towers whose
/// neighborhood never gains a coordinate remain absent.
pub fn infer_missing_coords(coords: &CoordinateMap, sightings: &[Sighting]) -> CoordinateMap {
    infer_missing_coords_multi(coords, &[sightings])
}

/// Multi-device variant: adjacency is built within each sequence, and the
/// fixed point runs once over the union, so the shared map can be computed
/// before per-device work is dispatched.
pub fn infer_missing_coords_multi(
    coords: &CoordinateMap,
    sequences: &[&[Sighting]],
) -> CoordinateMap {
    // Build the arena: one node per distinct tower.
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut arena: Vec<TowerNode> = Vec::new();

    for sighting in sequences.iter().flat_map(|s| s.iter()) {
        if !index.contains_key(&sighting.tower_id) {
            index.insert(sighting.tower_id.clone(), arena.len());
            arena.push(TowerNode {
                tower_id: sighting.tower_id.clone(),
                coord: coords.get(&sighting.tower_id).copied(),
                neighbors: Vec::new(),
            });
        }
    }

    // Adjacency from immediate succession, self-transitions ignored. Pairs
    // never span two sequences.
    for sightings in sequences {
        for pair in sightings.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.tower_id == b.tower_id {
                continue;
            }
            let ia = index[&a.tower_id];
            let ib = index[&b.tower_id];
            if !arena[ia].neighbors.contains(&ib) {
                arena[ia].neighbors.push(ib);
            }
            if !arena[ib].neighbors.contains(&ia) {
                arena[ib].neighbors.push(ia);
            }
        }
    }

    // Iterate to a fixed point: each pass resolves towers whose neighborhood
    // already has at least one coordinate, direct or inferred.
    let mut passes = 0usize;
    loop {
        passes += 1;
        let mut added = 0usize;

        for i in 0..arena.len() {
            if arena[i].coord.is_some() {
                continue;
            }

            let mut lat_sum = 0.0;
            let mut lon_sum = 0.0;
            let mut weight_sum = 0.0;
            for &n in &arena[i].neighbors {
                if let Some(c) = arena[n].coord {
                    let w = neighbor_weight(&c);
                    lat_sum += c.lat * w;
                    lon_sum += c.lon * w;
                    weight_sum += w;
                }
            }

            if weight_sum > 0.0 {
                arena[i].coord = Some(Coordinate::new(lat_sum / weight_sum, lon_sum / weight_sum));
                added += 1;
            }
        }

        if added == 0 {
            break;
        }
    }

    let mut out = coords.clone();
    for node in &arena {
        if let Some(c) = node.coord {
            out.entry(node.tower_id.clone()).or_insert(c);
        }
    }

    debug!(
        "coordinate inference: {} towers located ({} direct) after {} passes",
        out.len(),
        coords.len(),
        passes
    );
    out
}

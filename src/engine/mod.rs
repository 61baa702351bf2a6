//! # Inference Engine
//!
//! Per-device pipeline and batch orchestration.
//!
//! One device's inference is a pure function of its own sighting list and a
//! read-only shared coordinate map, so the batch entry points compute the
//! coordinate map once up front and then fan out, one task per device, with
//! nothing shared but immutable reads. A failure mode in one device (no
//! sightings, no coordinates, a disconnected event graph) is reported in
//! that device's record and never disturbs another device's run.

pub mod normalizer;

pub use normalizer::{normalize_records, NormalizedBatch, RawRecord};

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

use crate::coords::infer_missing_coords_multi;
use crate::filtering::drop_implausible_jumps;
use crate::graph::TransitionGraph;
use crate::scoring::score_towers;
use crate::sessions::build_sessions;
use crate::simulation::simulate_movement;
use crate::solver::solve_constrained_path;
use crate::stays::detect_stay_points;
use crate::{
    CoordinateMap, DeviceReport, InferenceConfig, LocationEstimate, Result, Sighting, Strategy,
};

/// Trajectory inference engine.
///
/// Holds a validated configuration; carries no per-run state, so one engine
/// can serve any number of concurrent inference runs.
pub struct InferenceEngine {
    config: InferenceConfig,
}

impl InferenceEngine {
    /// Create an engine, validating the configuration.
    pub fn new(config: InferenceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The engine's configuration.
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Infer the probable location of one device.
    ///
    /// `sightings` must be time-sorted (the normalizer guarantees this for
    /// batch input). Never fails: degenerate inputs produce the matching
    /// marker in the report instead.
    pub fn infer_device(
        &self,
        device_id: &str,
        sightings: &[Sighting],
        coords: &CoordinateMap,
    ) -> DeviceReport {
        if sightings.is_empty() {
            return DeviceReport::no_data(device_id);
        }

        let cleaned = drop_implausible_jumps(sightings, coords, &self.config);
        let last = &cleaned[cleaned.len() - 1];

        let mut report = DeviceReport::no_data(device_id);
        report.stay_points = detect_stay_points(&cleaned, &self.config);

        let run_heuristic = matches!(self.config.strategy, Strategy::Heuristic | Strategy::Both);
        let run_path = matches!(
            self.config.strategy,
            Strategy::ConstrainedPath | Strategy::Both
        );

        if run_heuristic {
            let sessions = build_sessions(&cleaned, &self.config);
            let board = score_towers(&sessions, last.timestamp, &self.config);
            let graph = TransitionGraph::from_sightings(&cleaned);

            let seed = self
                .config
                .simulation_seed
                .unwrap_or_else(rand::random::<u64>);
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = simulate_movement(&graph, &last.tower_id, &self.config, &mut rng);

            report.session_count = sessions.len();
            report.top_towers = board.top_ids(5);
            report.next_likely_tower = graph.heaviest_neighbor(&last.tower_id).map(String::from);
            report.simulated_likely_tower = Some(outcome.most_likely_tower.clone());
            report.simulation_stats = outcome.distribution;

            if let Some(best) = board.best() {
                report.estimate = LocationEstimate::Heuristic {
                    tower: best.tower_id.clone(),
                    score: best.score,
                };
            }
            report.scored = board.ranked;
        }

        if run_path {
            let any_located = cleaned.iter().any(|s| coords.contains_key(&s.tower_id));
            if any_located {
                if let Some(route) = solve_constrained_path(&cleaned, coords, &self.config) {
                    report.estimate = LocationEstimate::ConstrainedPath {
                        tower: route.terminal_tower.clone(),
                        cost: route.total_cost,
                        timestamp: route.timestamp,
                    };
                    report.route = Some(route);
                }
            } else {
                debug!(
                    "device '{}': no located towers, path solver skipped",
                    device_id
                );
            }
        }

        // Neither branch produced an estimate: fall back to the most recent
        // sighting, tagged as such.
        if report.estimate == LocationEstimate::NoData {
            report.estimate = LocationEstimate::LastSighting {
                tower: last.tower_id.clone(),
                timestamp: last.timestamp,
            };
        }

        report
    }

    /// Normalize raw records and compute the shared coordinate map.
    ///
    /// The map is fully resolved (direct + inferred entries) before any
    /// device-level task runs.
    fn prepare_batch(&self, records: &[RawRecord]) -> (NormalizedBatch, CoordinateMap) {
        let batch = normalize_records(records);

        let mut device_ids: Vec<&String> = batch.devices.keys().collect();
        device_ids.sort();
        let sequences: Vec<&[Sighting]> = device_ids
            .iter()
            .map(|id| batch.devices[*id].as_slice())
            .collect();
        let coords = infer_missing_coords_multi(&batch.coords, &sequences);

        info!(
            "batch: {} flagged devices, {} located towers, {} records skipped",
            batch.devices.len(),
            coords.len(),
            batch.skipped
        );
        (batch, coords)
    }

    /// Infer every flagged device in a batch of raw records, serially.
    pub fn infer_batch(&self, records: &[RawRecord]) -> HashMap<String, DeviceReport> {
        let (batch, coords) = self.prepare_batch(records);
        batch
            .devices
            .iter()
            .map(|(id, sightings)| (id.clone(), self.infer_device(id, sightings, &coords)))
            .collect()
    }

    /// Infer every flagged device in parallel, one task per device.
    ///
    /// Same results as [`InferenceEngine::infer_batch`]; rayon bounds the
    /// worker pool to the available cores.
    #[cfg(feature = "parallel")]
    pub fn infer_batch_parallel(&self, records: &[RawRecord]) -> HashMap<String, DeviceReport> {
        use rayon::prelude::*;

        let (batch, coords) = self.prepare_batch(records);
        batch
            .devices
            .par_iter()
            .map(|(id, sightings)| (id.clone(), self.infer_device(id, sightings, &coords)))
            .collect()
    }
}

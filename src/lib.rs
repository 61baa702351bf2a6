//! # towertrace
//!
//! Trajectory inference for sparse, noisy cell-tower sighting logs.
//!
//! Given a time-ordered list of sightings for one flagged device, this
//! library produces:
//! - a ranked set of candidate "home" towers (composite heuristic scoring)
//! - a Monte Carlo estimate of short-horizon movement over the observed
//!   transition graph
//! - a physically-constrained shortest-path reconstruction of the most
//!   plausible route, with a refined terminal location
//!
//! The engine is a pure function of its input: no I/O, no network, no
//! persistence. Upload handling, storage and rendering are external
//! collaborators that call in with already-parsed records and serialize the
//! plain result structure themselves.
//!
//! ## Features
//!
//! - **`parallel`** (default) - Parallel per-device batch inference with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use towertrace::{InferenceConfig, InferenceEngine, Sighting};
//! use std::collections::HashMap;
//!
//! let sightings = vec![
//!     Sighting::new("T1", 0),
//!     Sighting::new("T1", 300),
//!     Sighting::new("T2", 600),
//!     Sighting::new("T1", 900),
//! ];
//!
//! let engine = InferenceEngine::new(InferenceConfig::default()).unwrap();
//! let report = engine.infer_device("device-1", &sightings, &HashMap::new());
//! assert_eq!(report.top_towers.first().map(String::as_str), Some("T1"));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Unified error handling
pub mod error;
pub use error::{InferenceError, OptionExt, Result};

// Geographic and time utilities (haversine, gap arithmetic, night hours)
pub mod geo_utils;

// Implausible-jump noise filtering
pub mod filtering;
pub use filtering::drop_implausible_jumps;

// Missing-coordinate inference from co-occurrence neighbors
pub mod coords;
pub use coords::{infer_missing_coords, infer_missing_coords_multi};

// Session segmentation
pub mod sessions;
pub use sessions::{build_sessions, Session};

// Tower-to-tower transition graph
pub mod graph;
pub use graph::{EdgeStats, TransitionGraph};

// Composite per-tower relevance scoring
pub mod scoring;
pub use scoring::{score_towers, ScoreBoard, TowerScore};

// Monte Carlo movement simulation
pub mod simulation;
pub use simulation::{simulate_movement, SimulationOutcome, TowerVisits};

// Constrained optimal path inference (per-event Dijkstra)
pub mod solver;
pub use solver::{solve_constrained_path, RouteEstimate};

// Stay-point detection
pub mod stays;
pub use stays::{detect_stay_points, StayPoint};

// Per-device inference pipeline and batch orchestration
pub mod engine;
pub use engine::normalizer::{normalize_records, NormalizedBatch, RawRecord};
pub use engine::InferenceEngine;

// Synthetic sighting generator for tests and tooling
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A tower coordinate with latitude and longitude in degrees.
///
/// # Example
/// ```
/// use towertrace::Coordinate;
/// let c = Coordinate::new(51.5074, -0.1278); // London
/// assert!(c.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Check that both components are finite and in range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.lat >= -90.0
            && self.lat <= 90.0
            && self.lon >= -180.0
            && self.lon <= 180.0
    }
}

/// Partial mapping from tower id to coordinate.
///
/// Entries are either observed directly on input records or inferred from
/// co-occurring towers by [`infer_missing_coords`]. Towers may be absent.
pub type CoordinateMap = HashMap<String, Coordinate>;

/// One timestamped observation of a device at a tower.
///
/// Timestamps are epoch seconds. Sightings for a device are expected to be
/// non-decreasing in timestamp; the normalizer sorts raw records before the
/// engine ever sees them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    pub tower_id: String,
    pub timestamp: i64,
    /// Whether this observation came from a merchant terminal.
    pub merchant: bool,
}

impl Sighting {
    /// Create a non-merchant sighting.
    pub fn new(tower_id: &str, timestamp: i64) -> Self {
        Self {
            tower_id: tower_id.to_string(),
            timestamp,
            merchant: false,
        }
    }

    /// Create a sighting with an explicit merchant flag.
    pub fn with_merchant(tower_id: &str, timestamp: i64, merchant: bool) -> Self {
        Self {
            tower_id: tower_id.to_string(),
            timestamp,
            merchant,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Weighting source for simulated transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionWeighting {
    /// Weight each neighbor by observed transition count.
    Count,
    /// Weight each neighbor by cumulative dwell seconds.
    Dwell,
}

/// Which result-producing branches to run for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Scoring + simulation only.
    Heuristic,
    /// Constrained path solving only.
    ConstrainedPath,
    /// Both branches (the path estimate wins when available).
    Both,
}

/// Weights of the composite tower score.
///
/// `score = duration * ln(total_duration + 1) + frequency * visits
///        + recency * exp(-recency_secs / recency_decay_secs)
///        + night * night_count + merchant * merchant_hits`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub duration: f64,
    pub frequency: f64,
    pub recency: f64,
    pub night: f64,
    pub merchant: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            duration: 0.30,
            frequency: 0.20,
            recency: 0.15,
            night: 0.15,
            merchant: 0.20,
        }
    }
}

/// Configuration for the inference pipeline.
///
/// All thresholds are explicit so runs are reproducible under varied
/// parameters. [`InferenceConfig::validate`] rejects non-positive thresholds;
/// [`InferenceEngine::new`] calls it for you.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Jump distance above which a short-gap transition is treated as noise.
    /// Default: 50 km
    pub max_jump_km: f64,

    /// Minimum travel time that makes a long jump plausible.
    /// Default: 5 minutes
    pub min_travel_minutes: f64,

    /// Gap that splits two sightings into separate sessions.
    /// Default: 30 minutes
    pub session_gap_minutes: f64,

    /// Minimum number of sightings for a session to be kept.
    /// Default: 2
    pub min_session_len: usize,

    /// Minimum span (last - first) for a session to be kept.
    /// Default: 60 seconds
    pub min_session_secs: f64,

    /// Maximum elapsed time for a path-solver edge, and the width of the
    /// terminal candidate window. Default: 1800 seconds (30 minutes)
    pub max_edge_gap_secs: f64,

    /// Maximum realistic travel speed for a path-solver edge.
    /// Default: 120 km/h
    pub max_speed_kmh: f64,

    /// Number of independent simulation trials. Default: 100
    pub simulation_trials: u32,

    /// Maximum random-walk steps per trial. Default: 5
    pub simulation_steps: u32,

    /// Seed for the simulation RNG. `None` seeds from entropy; fix it for
    /// reproducible output.
    pub simulation_seed: Option<u64>,

    /// Transition weighting used by the simulator. Default: `Count`
    pub weighting: TransitionWeighting,

    /// First hour (inclusive) of the night window. Default: 20
    pub night_start_hour: u32,

    /// Last hour (inclusive, past midnight) of the night window. Default: 6
    pub night_end_hour: u32,

    /// Decay constant of the recency score term. Default: 3600 seconds
    pub recency_decay_secs: f64,

    /// Minimum span of a same-tower run to count as a stay point.
    /// Default: 600 seconds
    pub min_stay_secs: f64,

    /// Which result branches to run. Default: `Both`
    pub strategy: Strategy,

    /// Composite score weights.
    pub weights: ScoreWeights,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_jump_km: 50.0,
            min_travel_minutes: 5.0,
            session_gap_minutes: 30.0,
            min_session_len: 2,
            min_session_secs: 60.0,
            max_edge_gap_secs: 1800.0,
            max_speed_kmh: 120.0,
            simulation_trials: 100,
            simulation_steps: 5,
            simulation_seed: None,
            weighting: TransitionWeighting::Count,
            night_start_hour: 20,
            night_end_hour: 6,
            recency_decay_secs: 3600.0,
            min_stay_secs: 600.0,
            strategy: Strategy::Both,
            weights: ScoreWeights::default(),
        }
    }
}

impl InferenceConfig {
    /// Validate thresholds. Every distance, duration and count must be
    /// positive; score weights must be non-negative.
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, value: f64) -> Result<()> {
            if value > 0.0 {
                Ok(())
            } else {
                Err(InferenceError::ConfigError {
                    message: format!("{} must be positive, got {}", name, value),
                })
            }
        }

        positive("max_jump_km", self.max_jump_km)?;
        positive("min_travel_minutes", self.min_travel_minutes)?;
        positive("session_gap_minutes", self.session_gap_minutes)?;
        positive("min_session_secs", self.min_session_secs)?;
        positive("max_edge_gap_secs", self.max_edge_gap_secs)?;
        positive("max_speed_kmh", self.max_speed_kmh)?;
        positive("recency_decay_secs", self.recency_decay_secs)?;
        positive("min_stay_secs", self.min_stay_secs)?;

        if self.min_session_len == 0 {
            return Err(InferenceError::ConfigError {
                message: "min_session_len must be at least 1".to_string(),
            });
        }
        if self.simulation_trials == 0 {
            return Err(InferenceError::ConfigError {
                message: "simulation_trials must be at least 1".to_string(),
            });
        }
        if self.simulation_steps == 0 {
            return Err(InferenceError::ConfigError {
                message: "simulation_steps must be at least 1".to_string(),
            });
        }
        if self.night_start_hour > 23 || self.night_end_hour > 23 {
            return Err(InferenceError::ConfigError {
                message: "night hours must be in 0..=23".to_string(),
            });
        }

        let w = &self.weights;
        for (name, value) in [
            ("weights.duration", w.duration),
            ("weights.frequency", w.frequency),
            ("weights.recency", w.recency),
            ("weights.night", w.night),
            ("weights.merchant", w.merchant),
        ] {
            if !(value >= 0.0) {
                return Err(InferenceError::ConfigError {
                    message: format!("{} must be non-negative, got {}", name, value),
                });
            }
        }

        Ok(())
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// The single best location estimate for a device, tagged by how it was
/// produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum LocationEstimate {
    /// Top-ranked tower from the composite heuristic score.
    #[serde(rename_all = "camelCase")]
    Heuristic { tower: String, score: f64 },
    /// Terminal of the constrained shortest-path reconstruction.
    #[serde(rename_all = "camelCase")]
    ConstrainedPath {
        tower: String,
        cost: f64,
        timestamp: i64,
    },
    /// Fallback: the most recent sighting's tower (no usable coordinates).
    #[serde(rename_all = "camelCase")]
    LastSighting { tower: String, timestamp: i64 },
    /// No usable sightings for this device.
    NoData,
}

impl LocationEstimate {
    /// The estimated tower id, if any.
    pub fn tower(&self) -> Option<&str> {
        match self {
            LocationEstimate::Heuristic { tower, .. }
            | LocationEstimate::ConstrainedPath { tower, .. }
            | LocationEstimate::LastSighting { tower, .. } => Some(tower),
            LocationEstimate::NoData => None,
        }
    }
}

/// Complete inference result for one device.
///
/// Plain data: callers serialize it to their own transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceReport {
    pub device_id: String,
    /// Best single estimate, tagged by producing branch.
    pub estimate: LocationEstimate,
    /// Up to five top-scored tower ids ("probable set").
    pub top_towers: Vec<String>,
    /// All dwelt-at towers, ranked by descending score.
    pub scored: Vec<TowerScore>,
    /// Number of retained sessions.
    pub session_count: usize,
    /// Most frequent terminal of the movement simulation.
    pub simulated_likely_tower: Option<String>,
    /// Terminal-tower tallies, descending by count.
    pub simulation_stats: Vec<TowerVisits>,
    /// Heaviest outgoing transition from the last observed tower.
    pub next_likely_tower: Option<String>,
    /// Constrained path reconstruction, when coordinates allowed one.
    pub route: Option<RouteEstimate>,
    /// Same-tower runs long enough to indicate meaningful presence.
    pub stay_points: Vec<StayPoint>,
}

impl DeviceReport {
    /// An empty "no data" report for a device without usable sightings.
    pub fn no_data(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            estimate: LocationEstimate::NoData,
            top_towers: Vec::new(),
            scored: Vec::new(),
            session_count: 0,
            simulated_likely_tower: None,
            simulation_stats: Vec::new(),
            next_likely_tower: None,
            route: None,
            stay_points: Vec::new(),
        }
    }
}

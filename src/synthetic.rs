//! Synthetic sighting generator for tests and tooling.
//!
//! Generates realistic per-device sighting logs with known ground truth
//! (each device's home tower), a commute rhythm, and optional injected
//! hand-off noise, so pipeline behavior can be validated end to end.
//!
//! # Example
//!
//! ```rust
//! use towertrace::synthetic::SyntheticScenario;
//!
//! let scenario = SyntheticScenario {
//!     device_count: 3,
//!     days: 2,
//!     ..SyntheticScenario::default()
//! };
//! let dataset = scenario.generate();
//! assert_eq!(dataset.homes.len(), 3);
//! assert!(!dataset.records.is_empty());
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use crate::engine::normalizer::{RawRecord, RawTimestamp};
use crate::{Coordinate, CoordinateMap};

// ============================================================================
// Types
// ============================================================================

/// Scenario configuration for generating synthetic sighting data.
#[derive(Debug, Clone)]
pub struct SyntheticScenario {
    /// Number of flagged devices to generate.
    pub device_count: usize,
    /// Number of towers in the grid.
    pub tower_count: usize,
    /// Days of activity per device.
    pub days: u32,
    /// Grid origin.
    pub origin: Coordinate,
    /// Spacing between neighboring towers in degrees (~0.02 is ~2 km).
    pub tower_spacing_deg: f64,
    /// Epoch of the first day's midnight.
    pub start_epoch: i64,
    /// Probability per day of injecting an implausible far-tower sighting.
    pub noise_jump_probability: f64,
    /// Probability that a daytime sighting is merchant-flagged.
    pub merchant_probability: f64,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

impl Default for SyntheticScenario {
    fn default() -> Self {
        Self {
            device_count: 5,
            tower_count: 12,
            days: 3,
            origin: Coordinate::new(19.0760, 72.8777),
            tower_spacing_deg: 0.02,
            start_epoch: 1_700_000_000,
            noise_jump_probability: 0.3,
            merchant_probability: 0.15,
            seed: 42,
        }
    }
}

/// A complete synthetic dataset with ground truth.
pub struct SyntheticDataset {
    /// Raw records, shuffled across devices, ready for the normalizer.
    pub records: Vec<RawRecord>,
    /// Ground truth: device id to home tower id.
    pub homes: HashMap<String, String>,
    /// Coordinates of every grid tower.
    pub tower_coords: CoordinateMap,
    /// Tower id used for injected noise jumps (far outside the grid).
    pub noise_tower: String,
}

// ============================================================================
// Generation
// ============================================================================

const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: i64 = 3_600;

impl SyntheticScenario {
    /// Generate the dataset. Identical scenarios generate identical data.
    pub fn generate(&self) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let tower_coords = self.tower_grid();
        let tower_ids: Vec<String> = {
            let mut ids: Vec<String> = tower_coords.keys().cloned().collect();
            ids.sort();
            ids
        };
        let noise_tower = "tower-far".to_string();

        let mut records = Vec::new();
        let mut homes = HashMap::new();

        for d in 0..self.device_count {
            let device_id = format!("device-{}", d + 1);
            let home = tower_ids[rng.gen_range(0..tower_ids.len())].clone();
            let work = tower_ids[rng.gen_range(0..tower_ids.len())].clone();
            homes.insert(device_id.clone(), home.clone());

            for day in 0..self.days {
                let midnight = self.start_epoch + day as i64 * SECS_PER_DAY;
                self.generate_day(
                    &mut records,
                    &device_id,
                    &home,
                    &work,
                    &noise_tower,
                    midnight,
                    &mut rng,
                );
            }
        }

        // The far tower gets a fix so noise jumps are judgeable.
        let mut tower_coords = tower_coords;
        tower_coords.insert(
            noise_tower.clone(),
            Coordinate::new(self.origin.lat + 5.0, self.origin.lon + 5.0),
        );

        // Attach coordinates to the first record of each tower, the way an
        // upload carries them.
        let coords_ref = tower_coords.clone();
        for record in records.iter_mut() {
            if let Some(c) = coords_ref.get(&record.tower_id) {
                record.lat = Some(c.lat);
                record.lon = Some(c.lon);
            }
        }

        records.sort_by_key(|r| match r.timestamp {
            RawTimestamp::Epoch(t) => t,
            RawTimestamp::Text(_) => 0,
        });

        SyntheticDataset {
            records,
            homes,
            tower_coords,
            noise_tower,
        }
    }

    /// Lay towers on a square-ish grid around the origin.
    fn tower_grid(&self) -> CoordinateMap {
        let per_row = (self.tower_count as f64).sqrt().ceil() as usize;
        let mut coords = CoordinateMap::new();
        for t in 0..self.tower_count {
            let row = t / per_row;
            let col = t % per_row;
            coords.insert(
                format!("tower-{:02}", t + 1),
                Coordinate::new(
                    self.origin.lat + row as f64 * self.tower_spacing_deg,
                    self.origin.lon + col as f64 * self.tower_spacing_deg,
                ),
            );
        }
        coords
    }

    /// One day of a home/work commute rhythm: night at home, morning
    /// transit, day at work, evening return.
    #[allow(clippy::too_many_arguments)]
    fn generate_day(
        &self,
        records: &mut Vec<RawRecord>,
        device_id: &str,
        home: &str,
        work: &str,
        noise_tower: &str,
        midnight: i64,
        rng: &mut StdRng,
    ) {
        // (hour, tower) waypoints; minutes jittered per sighting.
        let plan: [(i64, &str); 9] = [
            (1, home),
            (5, home),
            (8, home),
            (9, work),
            (12, work),
            (15, work),
            (18, work),
            (19, home),
            (23, home),
        ];

        for (hour, tower) in plan {
            let jitter = rng.gen_range(0..900);
            let base = midnight + hour * SECS_PER_HOUR + jitter;
            let daytime = (9..=18).contains(&hour);

            // A far-tower blip seconds before a real sighting: implausible
            // speed over a sub-minute gap, exactly what the noise filter
            // drops.
            if hour == 15 && rng.gen_range(0.0..1.0) < self.noise_jump_probability {
                records.push(record(device_id, noise_tower, base - 40, false));
            }

            // A parked phone pings its tower repeatedly; the cluster is what
            // makes the stop register as a session.
            let pings = rng.gen_range(2..=4_i64);
            for p in 0..pings {
                let merchant = daytime && rng.gen_range(0.0..1.0) < self.merchant_probability;
                records.push(record(device_id, tower, base + p * 150, merchant));
            }
        }
    }
}

fn record(device_id: &str, tower_id: &str, timestamp: i64, merchant: bool) -> RawRecord {
    RawRecord {
        device_id: device_id.to_string(),
        tower_id: tower_id.to_string(),
        timestamp: RawTimestamp::Epoch(timestamp),
        lat: None,
        lon: None,
        is_defaulter: true,
        merchant,
        phone: None,
    }
}

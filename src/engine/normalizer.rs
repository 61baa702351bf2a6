//! Raw record normalization.
//!
//! Turns uploaded records into per-device sighting sequences: keeps only
//! flagged devices, parses ISO-8601 or epoch timestamps, sorts by time and
//! harvests the direct tower-coordinate map. A record whose timestamp cannot
//! be parsed is logged and skipped; it never aborts the device.

use chrono::{DateTime, NaiveDateTime};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{Coordinate, CoordinateMap, Sighting};

/// Timestamp as received: epoch seconds or ISO-8601 text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Epoch(i64),
    Text(String),
}

impl RawTimestamp {
    /// Parse to epoch seconds. Accepts RFC 3339 and naive
    /// `YYYY-MM-DDTHH:MM:SS` text (treated as UTC).
    pub fn to_epoch(&self) -> Option<i64> {
        match self {
            RawTimestamp::Epoch(secs) => Some(*secs),
            RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.timestamp())
                .ok()
                .or_else(|| {
                    text.parse::<NaiveDateTime>()
                        .map(|dt| dt.and_utc().timestamp())
                        .ok()
                }),
        }
    }
}

/// One uploaded record, as external collaborators hand it in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub device_id: String,
    pub tower_id: String,
    pub timestamp: RawTimestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default)]
    pub is_defaulter: bool,
    #[serde(default)]
    pub merchant: bool,
    /// Subscriber number, passed through for external lookup services.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Output of normalization: per-device sighting sequences plus the directly
/// observed coordinate map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    /// Flagged devices and their time-sorted sightings.
    pub devices: HashMap<String, Vec<Sighting>>,
    /// Coordinates observed directly on non-merchant records.
    pub coords: CoordinateMap,
    /// Records dropped for unparseable timestamps.
    pub skipped: usize,
}

/// Normalize a batch of raw records.
pub fn normalize_records(records: &[RawRecord]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    // Coordinate harvest runs over every record: towers gain a fix from any
    // located non-merchant observation, flagged device or not.
    for record in records {
        if record.merchant {
            continue;
        }
        if let (Some(lat), Some(lon)) = (record.lat, record.lon) {
            let coord = Coordinate::new(lat, lon);
            if coord.is_valid() {
                batch.coords.insert(record.tower_id.clone(), coord);
            }
        }
    }

    for record in records {
        if !record.is_defaulter {
            continue;
        }
        let Some(timestamp) = record.timestamp.to_epoch() else {
            warn!(
                "skipping record for device '{}': unparseable timestamp {:?}",
                record.device_id, record.timestamp
            );
            batch.skipped += 1;
            continue;
        };

        batch
            .devices
            .entry(record.device_id.clone())
            .or_default()
            .push(Sighting::with_merchant(
                &record.tower_id,
                timestamp,
                record.merchant,
            ));
    }

    for sightings in batch.devices.values_mut() {
        sightings.sort_by_key(|s| s.timestamp);
    }

    batch
}

//! End-to-end tests for the inference engine

use std::collections::HashMap;
use towertrace::engine::normalizer::RawTimestamp;
use towertrace::synthetic::SyntheticScenario;
use towertrace::{
    Coordinate, CoordinateMap, InferenceConfig, InferenceEngine, LocationEstimate, RawRecord,
    Sighting, Strategy,
};

const NOON: i64 = 12 * 3600;

fn engine_with(config: InferenceConfig) -> InferenceEngine {
    InferenceEngine::new(config).expect("valid config")
}

fn seeded_config() -> InferenceConfig {
    InferenceConfig {
        simulation_seed: Some(42),
        ..InferenceConfig::default()
    }
}

#[test]
fn test_empty_device_yields_no_data_marker() {
    let engine = engine_with(seeded_config());
    let report = engine.infer_device("ghost", &[], &HashMap::new());

    assert_eq!(report.estimate, LocationEstimate::NoData);
    assert!(report.top_towers.is_empty());
    assert!(report.route.is_none());
}

#[test]
fn test_heuristic_estimate_without_coordinates() {
    let engine = engine_with(seeded_config());
    let sightings = vec![
        Sighting::new("T1", NOON),
        Sighting::new("T1", NOON + 300),
        Sighting::new("T2", NOON + 600),
        Sighting::new("T1", NOON + 900),
    ];

    let report = engine.infer_device("d1", &sightings, &HashMap::new());

    match &report.estimate {
        LocationEstimate::Heuristic { tower, score } => {
            assert_eq!(tower, "T1");
            assert!(*score > 0.0);
        }
        other => panic!("expected heuristic estimate, got {:?}", other),
    }
    assert_eq!(report.session_count, 1);
    assert!(report.simulated_likely_tower.is_some());
    assert!(report.route.is_none());
}

#[test]
fn test_path_estimate_with_coordinates() {
    let engine = engine_with(seeded_config());
    let coords: CoordinateMap = [
        ("A".to_string(), Coordinate::new(10.00, 10.0)),
        ("B".to_string(), Coordinate::new(10.01, 10.0)),
        ("C".to_string(), Coordinate::new(10.02, 10.0)),
        ("D".to_string(), Coordinate::new(10.03, 10.0)),
    ]
    .into_iter()
    .collect();
    let sightings = vec![
        Sighting::new("A", NOON),
        Sighting::new("B", NOON + 500),
        Sighting::new("C", NOON + 2200),
        Sighting::new("D", NOON + 2400),
    ];

    let report = engine.infer_device("d1", &sightings, &coords);

    let route = report.route.as_ref().expect("route present");
    assert_eq!(route.terminal_tower, "C");
    match &report.estimate {
        LocationEstimate::ConstrainedPath { tower, .. } => assert_eq!(tower, "C"),
        other => panic!("expected path estimate, got {:?}", other),
    }
    // Heuristic fields are still populated alongside.
    assert!(!report.scored.is_empty());
}

#[test]
fn test_fallback_when_path_requested_without_coordinates() {
    let config = InferenceConfig {
        strategy: Strategy::ConstrainedPath,
        ..seeded_config()
    };
    let engine = engine_with(config);
    let sightings = vec![Sighting::new("T1", 0), Sighting::new("T2", 600)];

    let report = engine.infer_device("d1", &sightings, &HashMap::new());

    assert_eq!(
        report.estimate,
        LocationEstimate::LastSighting {
            tower: "T2".to_string(),
            timestamp: 600,
        }
    );
    assert!(report.route.is_none());
    // The heuristic branch did not run.
    assert!(report.scored.is_empty());
}

#[test]
fn test_heuristic_only_strategy_skips_solver() {
    let config = InferenceConfig {
        strategy: Strategy::Heuristic,
        ..seeded_config()
    };
    let engine = engine_with(config);
    let coords: CoordinateMap = [
        ("A".to_string(), Coordinate::new(10.00, 10.0)),
        ("B".to_string(), Coordinate::new(10.01, 10.0)),
    ]
    .into_iter()
    .collect();
    let sightings = vec![
        Sighting::new("A", NOON),
        Sighting::new("B", NOON + 600),
        Sighting::new("A", NOON + 1200),
    ];

    let report = engine.infer_device("d1", &sightings, &coords);

    assert!(report.route.is_none());
    assert!(matches!(
        report.estimate,
        LocationEstimate::Heuristic { .. }
    ));
}

#[test]
fn test_reports_are_reproducible_with_seed() {
    let engine = engine_with(seeded_config());
    let sightings: Vec<Sighting> = (0..12)
        .map(|i| Sighting::new(if i % 3 == 0 { "A" } else { "B" }, NOON + i * 400))
        .collect();

    let first = engine.infer_device("d1", &sightings, &HashMap::new());
    let second = engine.infer_device("d1", &sightings, &HashMap::new());

    assert_eq!(first, second);
}

#[test]
fn test_batch_isolation_bad_device_does_not_poison_others() {
    let engine = engine_with(seeded_config());
    let records = vec![
        // healthy device
        RawRecord {
            device_id: "good".to_string(),
            tower_id: "T1".to_string(),
            timestamp: RawTimestamp::Epoch(NOON),
            lat: None,
            lon: None,
            is_defaulter: true,
            merchant: false,
            phone: None,
        },
        RawRecord {
            device_id: "good".to_string(),
            tower_id: "T1".to_string(),
            timestamp: RawTimestamp::Epoch(NOON + 300),
            lat: None,
            lon: None,
            is_defaulter: true,
            merchant: false,
            phone: None,
        },
        // device whose only record has a broken timestamp
        RawRecord {
            device_id: "broken".to_string(),
            tower_id: "T9".to_string(),
            timestamp: RawTimestamp::Text("???".to_string()),
            lat: None,
            lon: None,
            is_defaulter: true,
            merchant: false,
            phone: None,
        },
    ];

    let reports = engine.infer_batch(&records);

    let good = &reports["good"];
    assert_ne!(good.estimate, LocationEstimate::NoData);
    // The broken device produced no usable sightings, so it never entered
    // the device map; the healthy one is unaffected.
    assert!(!reports.contains_key("broken"));
}

#[test]
fn test_batch_over_synthetic_dataset_finds_homes() {
    let scenario = SyntheticScenario {
        device_count: 4,
        days: 3,
        noise_jump_probability: 0.5,
        seed: 7,
        ..SyntheticScenario::default()
    };
    let dataset = scenario.generate();
    let engine = engine_with(seeded_config());

    let reports = engine.infer_batch(&dataset.records);

    assert_eq!(reports.len(), 4);
    for (device, report) in &reports {
        let home = &dataset.homes[device];
        // The commute rhythm makes home or work dominate; home must at
        // least be in the probable set.
        assert!(
            report.top_towers.contains(home),
            "home {} of {} missing from top towers {:?}",
            home,
            device,
            report.top_towers
        );
        // Injected far-tower noise must never survive into the stay points.
        for stay in &report.stay_points {
            assert_ne!(stay.tower_id, dataset.noise_tower);
        }
    }
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_batch_matches_serial() {
    let scenario = SyntheticScenario {
        device_count: 6,
        days: 2,
        seed: 13,
        ..SyntheticScenario::default()
    };
    let dataset = scenario.generate();
    let engine = engine_with(seeded_config());

    let serial = engine.infer_batch(&dataset.records);
    let parallel = engine.infer_batch_parallel(&dataset.records);

    assert_eq!(serial, parallel);
}

#[test]
fn test_noise_filtered_before_scoring() {
    // A far-tower blip seconds before a genuine sighting would otherwise
    // register as a visited tower.
    let engine = engine_with(seeded_config());
    let coords: CoordinateMap = [
        ("near".to_string(), Coordinate::new(10.0, 10.0)),
        ("far".to_string(), Coordinate::new(15.0, 15.0)),
    ]
    .into_iter()
    .collect();
    let sightings = vec![
        Sighting::new("near", NOON),
        Sighting::new("near", NOON + 600),
        Sighting::new("far", NOON + 630),
        Sighting::new("near", NOON + 660),
        Sighting::new("near", NOON + 1260),
    ];

    let report = engine.infer_device("d1", &sightings, &coords);

    assert!(report.scored.iter().all(|s| s.tower_id != "far"));
}

//! Tests for stay-point detection

use towertrace::{detect_stay_points, InferenceConfig, Sighting};

#[test]
fn test_long_same_tower_run_is_a_stay() {
    let sightings = vec![
        Sighting::new("A", 0),
        Sighting::new("A", 400),
        Sighting::new("A", 800),
    ];

    let stays = detect_stay_points(&sightings, &InferenceConfig::default());

    assert_eq!(stays.len(), 1);
    assert_eq!(stays[0].tower_id, "A");
    assert_eq!(stays[0].start, 0);
    assert_eq!(stays[0].end, 800);
    assert_eq!(stays[0].duration_secs(), 800);
}

#[test]
fn test_brief_run_is_transit() {
    // 300 s at A is under the 600 s significance threshold.
    let sightings = vec![
        Sighting::new("A", 0),
        Sighting::new("A", 300),
        Sighting::new("B", 400),
    ];

    let stays = detect_stay_points(&sightings, &InferenceConfig::default());

    assert!(stays.is_empty());
}

#[test]
fn test_tower_change_splits_runs() {
    let sightings = vec![
        Sighting::new("A", 0),
        Sighting::new("A", 700),
        Sighting::new("B", 800),
        Sighting::new("B", 1500),
    ];

    let stays = detect_stay_points(&sightings, &InferenceConfig::default());

    assert_eq!(stays.len(), 2);
    assert_eq!(stays[0].tower_id, "A");
    assert_eq!(stays[1].tower_id, "B");
}

#[test]
fn test_every_stay_meets_threshold() {
    let config = InferenceConfig::default();
    let sightings: Vec<Sighting> = (0..30)
        .map(|i| Sighting::new(if i % 7 < 4 { "A" } else { "B" }, i * 250))
        .collect();

    let stays = detect_stay_points(&sightings, &config);

    for stay in &stays {
        assert!(stay.duration_secs() as f64 >= config.min_stay_secs);
    }
}

#[test]
fn test_scan_window_bounds_a_run() {
    // A run cannot extend past five times the threshold from its first
    // sighting; a longer presence splits into several stays.
    let config = InferenceConfig::default();
    let sightings: Vec<Sighting> = (0..10)
        .map(|i| Sighting::new("A", i * 1000))
        .collect();

    let stays = detect_stay_points(&sightings, &config);

    assert!(stays.len() > 1);
    for stay in &stays {
        assert!(stay.duration_secs() as f64 <= config.min_stay_secs * 5.0);
    }
}

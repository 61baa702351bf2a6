//! Tests for the scoring engine

use towertrace::{build_sessions, score_towers, InferenceConfig, ScoreWeights, Sighting};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

const NOON: i64 = 12 * 3600;

fn sessions_from(sightings: &[Sighting], config: &InferenceConfig) -> Vec<towertrace::Session> {
    build_sessions(sightings, config)
}

#[test]
fn test_known_score_value() {
    let config = InferenceConfig::default();
    // One daytime session: A for 600 s, then B closes it.
    let sightings = vec![
        Sighting::new("A", NOON),
        Sighting::new("B", NOON + 600),
        Sighting::new("A", NOON + 900),
    ];
    let sessions = sessions_from(&sightings, &config);
    assert_eq!(sessions.len(), 1);

    let now = NOON + 900;
    let board = score_towers(&sessions, now, &config);

    let a = board
        .ranked
        .iter()
        .find(|s| s.tower_id == "A")
        .expect("A scored");
    assert_eq!(a.total_duration, 600.0);
    assert_eq!(a.visit_count, 1);
    assert_eq!(a.night_count, 0);
    assert_eq!(a.merchant_hits, 0);
    assert_eq!(a.last_seen, NOON);

    // 0.30*ln(601) + 0.20*1 + 0.15*exp(-900/3600)
    let expected = 0.30 * 601.0_f64.ln() + 0.20 + 0.15 * (-0.25_f64).exp();
    assert!(approx_eq(a.score, expected, 1e-9));
}

#[test]
fn test_night_origin_counted() {
    let config = InferenceConfig::default();
    // 02:00 UTC is inside the night window.
    let two_am = 2 * 3600;
    let sightings = vec![Sighting::new("A", two_am), Sighting::new("B", two_am + 300)];
    let sessions = sessions_from(&sightings, &config);

    let board = score_towers(&sessions, two_am + 300, &config);

    let a = board.ranked.iter().find(|s| s.tower_id == "A").unwrap();
    assert_eq!(a.night_count, 1);
}

#[test]
fn test_merchant_origin_counted() {
    let config = InferenceConfig::default();
    let sightings = vec![
        Sighting::with_merchant("A", NOON, true),
        Sighting::new("B", NOON + 300),
    ];
    let sessions = sessions_from(&sightings, &config);

    let board = score_towers(&sessions, NOON + 300, &config);

    let a = board.ranked.iter().find(|s| s.tower_id == "A").unwrap();
    assert_eq!(a.merchant_hits, 1);
}

#[test]
fn test_ranking_is_deterministic() {
    let config = InferenceConfig::default();
    let sightings: Vec<Sighting> = (0..40)
        .map(|i| {
            let tower = match i % 5 {
                0 | 1 => "A",
                2 => "B",
                3 => "C",
                _ => "D",
            };
            Sighting::new(tower, NOON + i * 200)
        })
        .collect();
    let sessions = sessions_from(&sightings, &config);
    let now = NOON + 40 * 200;

    let first = score_towers(&sessions, now, &config);
    let second = score_towers(&sessions, now, &config);

    assert_eq!(first, second);
}

#[test]
fn test_score_ties_break_by_tower_id() {
    let config = InferenceConfig::default();
    // A and B are each the origin twice with identical dwell.
    let sightings = vec![
        Sighting::new("A", NOON),
        Sighting::new("B", NOON + 300),
        Sighting::new("A", NOON + 600),
        Sighting::new("B", NOON + 900),
        Sighting::new("C", NOON + 1200),
    ];
    let sessions = sessions_from(&sightings, &config);

    // Equal dwell and visits; recency differs, so zero the recency weight
    // to force the tie.
    let config = InferenceConfig {
        weights: ScoreWeights {
            recency: 0.0,
            ..ScoreWeights::default()
        },
        ..config
    };
    let board = score_towers(&sessions, NOON + 1200, &config);

    assert_eq!(board.ranked[0].tower_id, "A");
    assert_eq!(board.ranked[1].tower_id, "B");
    assert_eq!(board.ranked[0].score, board.ranked[1].score);
}

#[test]
fn test_last_seen_tracks_latest_origin() {
    let config = InferenceConfig::default();
    let sightings = vec![
        Sighting::new("A", NOON),
        Sighting::new("B", NOON + 300),
        Sighting::new("A", NOON + 600),
        Sighting::new("B", NOON + 900),
    ];
    let sessions = sessions_from(&sightings, &config);

    let board = score_towers(&sessions, NOON + 900, &config);

    let a = board.ranked.iter().find(|s| s.tower_id == "A").unwrap();
    assert_eq!(a.last_seen, NOON + 600);
}

#[test]
fn test_empty_sessions_empty_board() {
    let board = score_towers(&[], 0, &InferenceConfig::default());
    assert!(board.best().is_none());
    assert!(board.top_ids(5).is_empty());
}

#[test]
fn test_top_ids_caps_at_five() {
    let config = InferenceConfig::default();
    let sightings: Vec<Sighting> = (0..14)
        .map(|i| {
            let tower = format!("T{}", i % 7);
            Sighting::with_merchant(&tower, NOON + i * 120, false)
        })
        .collect();
    let sessions = sessions_from(&sightings, &config);

    let board = score_towers(&sessions, NOON + 14 * 120, &config);

    assert!(board.ranked.len() >= 6);
    assert_eq!(board.top_ids(5).len(), 5);
}

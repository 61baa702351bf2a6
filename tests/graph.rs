//! Tests for the transition graph

use towertrace::{Sighting, TransitionGraph};

#[test]
fn test_edges_are_mirrored() {
    let sightings = vec![
        Sighting::new("A", 0),
        Sighting::new("B", 60),
        Sighting::new("A", 180),
        Sighting::new("B", 300),
    ];

    let graph = TransitionGraph::from_sightings(&sightings);

    let ab = graph.edge("A", "B").expect("A->B must exist");
    let ba = graph.edge("B", "A").expect("B->A must exist");
    assert_eq!(ab.count, 3);
    assert_eq!(ba.count, 3);
    assert_eq!(ab.dwell_secs, ba.dwell_secs);
}

#[test]
fn test_symmetry_holds_for_every_edge() {
    let sightings: Vec<Sighting> = (0..30)
        .map(|i| {
            let tower = match i % 4 {
                0 => "A",
                1 => "B",
                2 => "C",
                _ => "A",
            };
            Sighting::new(tower, i * 120)
        })
        .collect();

    let graph = TransitionGraph::from_sightings(&sightings);

    for from in graph.towers() {
        for (to, stats) in graph.neighbors(from).unwrap() {
            let reverse = graph
                .edge(to, from)
                .unwrap_or_else(|| panic!("missing mirror edge {}->{}", to, from));
            assert_eq!(stats.count, reverse.count);
        }
    }
}

#[test]
fn test_self_transitions_excluded() {
    let sightings = vec![
        Sighting::new("A", 0),
        Sighting::new("A", 60),
        Sighting::new("B", 120),
    ];

    let graph = TransitionGraph::from_sightings(&sightings);

    assert!(graph.edge("A", "A").is_none());
    // The A->B hand-off still registers even though a self-transition sat
    // between the two A sightings.
    assert_eq!(graph.edge("A", "B").unwrap().count, 1);
}

#[test]
fn test_dwell_accumulates_origin_dwell() {
    let sightings = vec![
        Sighting::new("A", 0),
        Sighting::new("B", 600),
        Sighting::new("A", 900),
    ];

    let graph = TransitionGraph::from_sightings(&sightings);

    // A->B carries 600 s (dwell at A) plus 300 s from the mirrored B->A.
    assert_eq!(graph.edge("A", "B").unwrap().dwell_secs, 900.0);
}

#[test]
fn test_empty_and_single() {
    assert!(TransitionGraph::from_sightings(&[]).is_empty());
    assert!(TransitionGraph::from_sightings(&[Sighting::new("A", 0)]).is_empty());
}

#[test]
fn test_heaviest_neighbor() {
    let sightings = vec![
        Sighting::new("A", 0),
        Sighting::new("B", 60),
        Sighting::new("A", 120),
        Sighting::new("B", 180),
        Sighting::new("A", 240),
        Sighting::new("C", 300),
    ];

    let graph = TransitionGraph::from_sightings(&sightings);

    assert_eq!(graph.heaviest_neighbor("A"), Some("B"));
    assert_eq!(graph.heaviest_neighbor("unknown"), None);
}

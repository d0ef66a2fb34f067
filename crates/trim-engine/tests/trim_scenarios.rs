//! End-to-end pick -> drag -> preview flows through the public API.

use trim_engine::{
    build_preview_edges, compute_preview_geometry, find_best_roll_pair, pick_edges,
    roll_zone_predicate, BoundaryModel, Clip, ClipSource, EdgeColors, EdgeKey, EdgeSelection,
    EdgeType, Fps, PickGeometry, PickOptions, RationalTime, RollCandidate, SelectionMode,
    TimeToPixel, TrackId, TrackSnapshot, TrimConfig, TrimConstraint, TrimConstraints, TrimType,
    Viewport,
};

fn frames(n: i64) -> RationalTime {
    RationalTime::new(n, Fps::FPS_30)
}

fn clip(id: &str, start: i64, duration: i64) -> Clip {
    Clip::new(id, TrackId::from("v1"), frames(start), frames(duration)).unwrap()
}

/// 300 frames across 600 pixels: two pixels per frame.
fn viewport() -> Viewport {
    Viewport::new(frames(0), frames(300)).unwrap()
}

const WIDTH: f64 = 600.0;

fn options() -> PickOptions {
    PickOptions::new(10.0, 8.0, 6.0)
}

fn pick_at(clips: &[Clip], cursor_x: f64, options: &PickOptions) -> trim_engine::PickResult {
    let view = viewport();
    pick_edges(clips, cursor_x, Some(PickGeometry::new(&view, WIDTH)), options).unwrap()
}

fn edges(result: &trim_engine::PickResult) -> Vec<(String, EdgeType, TrimType)> {
    result
        .selection
        .iter()
        .map(|e| (e.clip_id.to_string(), e.edge_type, e.trim_type))
        .collect()
}

#[test]
fn junction_of_adjacent_clips_is_one_boundary() {
    let view = viewport();
    let model = BoundaryModel::build(&[clip("A", 0, 100), clip("B", 100, 50)], &view, WIDTH);
    let junctions: Vec<_> = model
        .boundaries()
        .iter()
        .filter(|b| b.time == frames(100))
        .collect();
    assert_eq!(junctions.len(), 1);
    assert_eq!(junctions[0].left.as_ref().unwrap().edge_type, EdgeType::Out);
    assert_eq!(junctions[0].right.as_ref().unwrap().edge_type, EdgeType::In);
    assert!((junctions[0].pixel_x - 200.0).abs() < 1e-9);
}

#[test]
fn cursor_on_junction_rolls_both_clips() {
    let clips = [clip("A", 0, 100), clip("B", 100, 50)];
    let x = viewport().time_to_pixel(&frames(100), WIDTH);
    let result = pick_at(&clips, x, &options());
    assert!(result.roll_used);
    assert_eq!(
        edges(&result),
        [
            ("A".to_string(), EdgeType::Out, TrimType::Roll),
            ("B".to_string(), EdgeType::In, TrimType::Roll),
        ]
    );
    assert_ne!(result.selection[0].clip_id, result.selection[1].clip_id);
}

#[test]
fn lone_clip_end_is_a_ripple_of_its_tail() {
    let clips = [clip("C", 0, 50)];
    let x = viewport().time_to_pixel(&frames(50), WIDTH);
    let result = pick_at(&clips, x, &options());
    assert!(!result.roll_used);
    assert_eq!(
        edges(&result),
        [("C".to_string(), EdgeType::Out, TrimType::Ripple)]
    );
}

#[test]
fn narrow_left_element_yields_no_affordance() {
    // N is 4px wide, under the 6px minimum.
    let clips = [clip("N", 0, 2), clip("B", 2, 100)];
    let result = pick_at(&clips, 2.5, &PickOptions::new(10.0, 2.0, 6.0));
    assert!(result.is_empty());
    assert!(result.boundary.is_some());
}

#[test]
fn configuration_file_drives_the_picker() {
    let config = TrimConfig::from_json_str(
        r#"{"edge_zone_px": 10, "roll_zone_px": 8, "min_edge_selectable_width_px": 6}"#,
    )
    .unwrap();
    let clips = [clip("A", 0, 100), clip("B", 100, 50)];
    assert!(pick_at(&clips, 201.0, &config.pick).roll_used);

    let incomplete = TrimConfig::from_json_str(r#"{"edge_zone_px": 10}"#).unwrap();
    let view = viewport();
    let geometry = Some(PickGeometry::new(&view, WIDTH));
    assert!(pick_edges(&clips, 201.0, geometry, &incomplete.pick).is_err());
}

#[test]
fn picked_roll_drags_within_the_tighter_bound() {
    let clips = [clip("A", 0, 100), clip("B", 100, 50)];
    let result = pick_at(&clips, 200.0, &options());
    let selection = EdgeSelection::from_edges(result.selection.clone());
    let lead = result.dragged_edge.clone().unwrap();

    let constraints = TrimConstraints::new()
        .with(
            EdgeKey::new("A", EdgeType::Out),
            TrimConstraint::between(frames(-20), frames(20)),
        )
        .with(
            EdgeKey::new("B", EdgeType::In),
            TrimConstraint::between(frames(-5), frames(100)),
        );
    let colors = EdgeColors::default();

    let drag = |delta| {
        build_preview_edges(selection.edges(), delta, &constraints, &colors, Some(&lead))
    };

    let within = drag(frames(15));
    assert!(within.iter().all(|p| p.delta == frames(15) && !p.at_limit));

    let past = drag(frames(50));
    let a = past.iter().find(|p| p.clip_id.as_str() == "A").unwrap();
    let b = past.iter().find(|p| p.clip_id.as_str() == "B").unwrap();
    assert_eq!(a.delta, frames(20));
    assert_eq!(b.delta, frames(20));
    assert!(a.at_limit);
    assert_eq!(a.color, colors.limit);
    assert!(!b.at_limit);
    assert_eq!(b.color, colors.available);

    let a_geometry = compute_preview_geometry(&clips[0], Some(a.edge_type), a.delta, None);
    assert_eq!(a_geometry.duration, frames(120));
    let b_geometry = compute_preview_geometry(&clips[1], Some(b.edge_type), b.delta, None);
    assert_eq!(b_geometry.duration, frames(30));
}

#[test]
fn roll_pair_detector_over_a_snapshot() {
    let snapshot = TrackSnapshot::from_clips([
        clip("A", 0, 100),
        clip("B", 100, 50),
        Clip::new("X", TrackId::from("v2"), frames(0), frames(10)).unwrap(),
    ]);
    let track = snapshot.clips_for_track(&TrackId::from("v1"));
    assert_eq!(track.len(), 2);

    let view = viewport();
    let cursor_x = 201.0;
    let candidates: Vec<RollCandidate> = track
        .iter()
        .flat_map(|c| [(c.clone(), EdgeType::In), (c.clone(), EdgeType::Out)])
        .map(|(clip, edge)| {
            let probe = RollCandidate::new(clip, edge, 0.0);
            let distance = (view.time_to_pixel(&probe.edge_time(), WIDTH) - cursor_x).abs();
            RollCandidate { distance, ..probe }
        })
        .filter(|c| c.distance <= 10.0)
        .collect();
    assert_eq!(candidates.len(), 2);

    let predicate = roll_zone_predicate(&view, 8.0);
    let found = find_best_roll_pair(&candidates, cursor_x, WIDTH, predicate).unwrap();
    assert_eq!(found.pair.left.clip_id.as_str(), "A");
    assert_eq!(found.pair.right.clip_id.as_str(), "B");
    assert_eq!(found.pair.edit_time, frames(100));
    assert!((found.score - 1.0).abs() < 1e-9);

    assert!(snapshot.clips_for_track(&TrackId::from("missing")).is_empty());
}

#[test]
fn shift_click_extends_the_drag_set() {
    let clips = [clip("A", 0, 100), clip("B", 120, 50)];
    // Left of A's end, outside the roll zone: a ripple of A.out alone.
    let first = pick_at(&clips, 194.0, &options());
    let second = pick_at(&clips, 338.0, &options());
    let mut selection = EdgeSelection::new();
    selection.apply(first.selection, SelectionMode::Replace);
    selection.apply(second.selection, SelectionMode::Add);
    assert_eq!(selection.len(), 2);
    assert_eq!(selection.lead().unwrap().edge_type, EdgeType::Out);

    // A.out leads; B.out faces the same way so both share one delta.
    let preview = build_preview_edges(
        selection.edges(),
        frames(-30),
        &TrimConstraints::new().with(
            EdgeKey::new("B", EdgeType::Out),
            TrimConstraint::between(frames(-10), frames(10)),
        ),
        &EdgeColors::default(),
        selection.lead(),
    );
    assert!(preview.iter().all(|p| p.delta == frames(-10)));
}

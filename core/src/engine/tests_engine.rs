use super::*;
use crate::chart::{AngleChart, Connection, ShownAngle};
use crate::photo::update_point;

const SIZE: PhotoSize = PhotoSize {
    width: 800.0,
    height: 600.0,
};
const SCALE: f64 = 3000.0;

fn right_angle_chart() -> AngleChart {
    let mut chart = AngleChart::standard();
    assert!(update_point(&mut chart.points, 0, 0.0, 0.0));
    assert!(update_point(&mut chart.points, 1, 10.0, 0.0));
    assert!(update_point(&mut chart.points, 2, 10.0, 10.0));
    chart
}

#[test]
fn total_cervical_junction_reports_ninety_degrees() {
    let mut chart = right_angle_chart();
    let mut rng = PlacementRng::new(7);
    let mut engine = AngleEngine::new(AngleKind::TotalCervical);

    let reported = engine
        .update(&mut chart, SIZE, SCALE, &mut rng)
        .expect("junction angle reported");

    assert!((reported.degrees - 90.0).abs() < 1e-9);
    assert!((reported.x - 10.0).abs() < 1e-9);
    assert!(reported.y.abs() < 1e-9);
    assert_eq!(engine.phase(), EnginePhase::AnglesComputed);
    assert_eq!(engine.segments().len(), 2);
    assert_eq!(engine.angles().len(), 1);
}

#[test]
fn end_overlap_extends_past_the_end_only() {
    let mut chart = right_angle_chart();
    let mut rng = PlacementRng::new(7);
    let mut engine = AngleEngine::new(AngleKind::TotalCervical);
    engine.update(&mut chart, SIZE, SCALE, &mut rng);

    // Connection 0 -> 1 carries endOverlap 20: at this scale that is
    // 20 / 3000 * 20000 extra pixels along +x.
    let extended = engine.segments()[0];
    assert_eq!(extended.start, Point2::new(0.0, 0.0));
    let expected_x = 10.0 + 20.0 / SCALE * OVERLAP_PIXELS_PER_UNIT;
    assert!((extended.end.x - expected_x).abs() < 1e-9);
    assert!(extended.end.y.abs() < 1e-9);

    // Connection 1 -> 2 is unextended.
    let plain = engine.segments()[1];
    assert_eq!(plain.start, Point2::new(10.0, 0.0));
    assert_eq!(plain.end, Point2::new(10.0, 10.0));
}

#[test]
fn both_overlaps_extend_from_the_original_endpoints() {
    let mut chart = AngleChart::standard();
    chart.total_cc.connections[0] = Connection {
        start_index: 0,
        end_index: 1,
        start_overlap: 15.0,
        end_overlap: 30.0,
    };
    update_point(&mut chart.points, 0, 0.0, 0.0);
    update_point(&mut chart.points, 1, 10.0, 0.0);
    update_point(&mut chart.points, 2, 10.0, 10.0);

    let mut rng = PlacementRng::new(1);
    let mut engine = AngleEngine::new(AngleKind::TotalCervical);
    engine.update(&mut chart, SIZE, SCALE, &mut rng);

    let segment = engine.segments()[0];
    let start_extension = 15.0 / SCALE * OVERLAP_PIXELS_PER_UNIT;
    let end_extension = 30.0 / SCALE * OVERLAP_PIXELS_PER_UNIT;
    assert!((segment.start.x - (0.0 - start_extension)).abs() < 1e-9);
    assert!((segment.end.x - (10.0 + end_extension)).abs() < 1e-9);
}

#[test]
fn unchanged_geometry_does_not_recompute() {
    let mut chart = right_angle_chart();
    let mut rng = PlacementRng::new(7);
    let mut engine = AngleEngine::new(AngleKind::TotalCervical);

    assert!(engine.update(&mut chart, SIZE, SCALE, &mut rng).is_some());
    let segments_before = engine.segments().to_vec();

    // Re-applying the same coordinates is a no-op in the store...
    assert!(!update_point(&mut chart.points, 1, 10.0, 0.0));
    // ...and the derive gate stops the cascade even if a pass runs.
    assert!(engine.update(&mut chart, SIZE, SCALE, &mut rng).is_none());
    assert_eq!(engine.segments(), segments_before.as_slice());
}

#[test]
fn report_latch_holds_until_reset() {
    let mut chart = right_angle_chart();
    let mut rng = PlacementRng::new(7);
    let mut engine = AngleEngine::new(AngleKind::TotalCervical);

    assert!(engine.update(&mut chart, SIZE, SCALE, &mut rng).is_some());

    // Geometry changes recompute, but the latch swallows the report.
    assert!(update_point(&mut chart.points, 2, 20.0, 10.0));
    assert!(engine.update(&mut chart, SIZE, SCALE, &mut rng).is_none());
    assert_eq!(engine.angles().len(), 1);

    // Re-activation reports again.
    engine.reset();
    assert_eq!(engine.phase(), EnginePhase::Idle);
    assert!(engine.update(&mut chart, SIZE, SCALE, &mut rng).is_some());
}

#[test]
fn out_of_range_shown_angle_is_silently_omitted() {
    let mut chart = right_angle_chart();
    chart.total_cc.shown_angles.push(ShownAngle::end_start(0, 9));

    let mut rng = PlacementRng::new(7);
    let mut engine = AngleEngine::new(AngleKind::TotalCervical);
    let reported = engine.update(&mut chart, SIZE, SCALE, &mut rng);

    assert!(reported.is_some());
    assert_eq!(engine.angles().len(), 1);
}

#[test]
fn collinear_landmarks_produce_no_angle() {
    let mut chart = AngleChart::standard();
    update_point(&mut chart.points, 0, 0.0, 0.0);
    update_point(&mut chart.points, 1, 10.0, 0.0);
    update_point(&mut chart.points, 2, 20.0, 0.0);

    let mut rng = PlacementRng::new(7);
    let mut engine = AngleEngine::new(AngleKind::TotalCervical);
    let reported = engine.update(&mut chart, SIZE, SCALE, &mut rng);

    assert!(reported.is_none());
    assert_eq!(engine.segments().len(), 2);
    assert!(engine.angles().is_empty());
}

#[test]
fn coincident_landmarks_skip_the_degenerate_connection() {
    let mut chart = AngleChart::standard();
    // Slots 0 and 1 coincide: the extended connection 0 -> 1 has a
    // zero-length base and is dropped, taking its shown angle with it.
    update_point(&mut chart.points, 0, 5.0, 5.0);
    update_point(&mut chart.points, 1, 5.0, 5.0);
    update_point(&mut chart.points, 2, 10.0, 10.0);

    let mut rng = PlacementRng::new(7);
    let mut engine = AngleEngine::new(AngleKind::TotalCervical);
    let reported = engine.update(&mut chart, SIZE, SCALE, &mut rng);

    assert!(reported.is_none());
    assert_eq!(engine.segments().len(), 1);
    assert!(engine.angles().is_empty());
}

#[test]
fn connection_outside_the_arena_is_skipped() {
    let mut chart = right_angle_chart();
    chart.total_cc.connections.push(Connection::plain(0, 99));

    let mut rng = PlacementRng::new(7);
    let mut engine = AngleEngine::new(AngleKind::TotalCervical);
    let reported = engine.update(&mut chart, SIZE, SCALE, &mut rng);

    // The two valid connections still derive and their junction reports.
    assert!(reported.is_some());
    assert_eq!(engine.segments().len(), 2);
}

#[test]
fn unplaced_landmarks_are_scattered_and_still_measure() {
    let mut chart = AngleChart::standard();
    let mut rng = PlacementRng::new(99);
    let mut engine = AngleEngine::new(AngleKind::Back);

    // Nothing placed: all three working points come from the scatterer.
    engine.update(&mut chart, SIZE, SCALE, &mut rng);
    assert_eq!(engine.working_points().len(), 3);
    assert_eq!(engine.segments().len(), 2);
    for slot in [7, 8, 9] {
        assert!(chart.points[slot].position().is_some());
    }
}

#[test]
fn reset_clears_derived_state() {
    let mut chart = right_angle_chart();
    let mut rng = PlacementRng::new(7);
    let mut engine = AngleEngine::new(AngleKind::TotalCervical);
    engine.update(&mut chart, SIZE, SCALE, &mut rng);

    engine.reset();
    assert_eq!(engine.phase(), EnginePhase::Idle);
    assert!(engine.working_points().is_empty());
    assert!(engine.segments().is_empty());
    assert!(engine.angles().is_empty());
}

//! Read/write access to a photo's landmark arena: working-set resolution
//! with scattered default placement, and drag updates.

use tracing::debug;

use crate::chart::{AngleDefinition, Landmark};
use crate::geometry::{Point2, COORD_EPSILON};

/// Photo dimensions in pixels, used to scatter default placements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoSize {
    pub width: f64,
    pub height: f64,
}

/// A landmark slot resolved to a concrete position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPoint {
    pub index: usize,
    pub position: Point2,
}

/// Deterministic generator for first-time landmark placement (SplitMix64).
///
/// Callers construct it from an explicit seed and pass it in, so placement
/// is reproducible in test scenarios.
#[derive(Debug, Clone)]
pub struct PlacementRng {
    state: u64,
}

impl PlacementRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform draw in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

impl Default for PlacementRng {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Scatter a placement near the photo center, within a quarter of each
/// dimension. A convenience starting position, not a semantic default.
fn default_placement(size: PhotoSize, rng: &mut PlacementRng) -> Point2 {
    let x = size.width / 2.0 - rng.next_f64() * size.width / 4.0;
    let y = size.height / 2.0 - rng.next_f64() * size.height / 4.0;
    Point2::new(x, y)
}

/// Resolve the working set for one definition: every landmark slot its
/// connections reference, in ascending slot order.
///
/// Unplaced slots receive a scattered default which is written back into
/// the arena; afterwards they are indistinguishable from user placements.
/// Slots outside the arena are skipped.
pub fn resolve_working_set(
    points: &mut [Landmark],
    def: &AngleDefinition,
    size: PhotoSize,
    rng: &mut PlacementRng,
) -> Vec<ResolvedPoint> {
    let mut resolved = Vec::new();

    for index in def.landmark_indices() {
        let Some(landmark) = points.get_mut(index) else {
            continue;
        };

        let position = match landmark.position() {
            Some(position) => position,
            None => {
                let placed = default_placement(size, rng);
                landmark.x = Some(placed.x);
                landmark.y = Some(placed.y);
                debug!(index, x = placed.x, y = placed.y, "scattered default placement");
                placed
            }
        };

        resolved.push(ResolvedPoint { index, position });
    }

    resolved
}

/// Apply one drag update to a single slot, leaving all others untouched.
///
/// Returns `true` only when the landmark actually moved: re-applying a
/// position within `COORD_EPSILON` of the current one is a no-op, so
/// downstream recomputation is not re-triggered. Out-of-range indices and
/// non-finite input are ignored.
pub fn update_point(points: &mut [Landmark], index: usize, x: f64, y: f64) -> bool {
    if !x.is_finite() || !y.is_finite() {
        return false;
    }
    let Some(landmark) = points.get_mut(index) else {
        return false;
    };

    if let (Some(cur_x), Some(cur_y)) = (landmark.x, landmark.y) {
        if (cur_x - x).abs() <= COORD_EPSILON && (cur_y - y).abs() <= COORD_EPSILON {
            return false;
        }
    }

    landmark.x = Some(x);
    landmark.y = Some(y);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::AngleChart;

    const SIZE: PhotoSize = PhotoSize {
        width: 800.0,
        height: 600.0,
    };

    #[test]
    fn resolution_scatters_unplaced_slots_near_center() {
        let mut chart = AngleChart::standard();
        let mut rng = PlacementRng::new(42);

        let (def, points) = chart.definition_and_points_mut(crate::chart::AngleKind::TotalCervical);
        let resolved = resolve_working_set(points, def, SIZE, &mut rng);

        assert_eq!(resolved.len(), 3);
        for point in &resolved {
            assert!(point.position.x <= SIZE.width / 2.0);
            assert!(point.position.x > SIZE.width / 4.0);
            assert!(point.position.y <= SIZE.height / 2.0);
            assert!(point.position.y > SIZE.height / 4.0);
        }
        // Scattered placements are persisted into the arena.
        for point in &resolved {
            assert_eq!(chart.points[point.index].position(), Some(point.position));
        }
    }

    #[test]
    fn resolution_preserves_existing_placements() {
        let mut chart = AngleChart::standard();
        let mut rng = PlacementRng::new(1);
        assert!(update_point(&mut chart.points, 1, 123.0, 456.0));

        let (def, points) = chart.definition_and_points_mut(crate::chart::AngleKind::TotalCervical);
        let resolved = resolve_working_set(points, def, SIZE, &mut rng);

        let placed = resolved.iter().find(|p| p.index == 1).unwrap();
        assert_eq!(placed.position, Point2::new(123.0, 456.0));
    }

    #[test]
    fn resolution_is_reproducible_for_equal_seeds() {
        let mut first = AngleChart::standard();
        let mut second = AngleChart::standard();

        let (def, points) = first.definition_and_points_mut(crate::chart::AngleKind::Pisa);
        let a = resolve_working_set(points, def, SIZE, &mut PlacementRng::new(7));
        let (def, points) = second.definition_and_points_mut(crate::chart::AngleKind::Pisa);
        let b = resolve_working_set(points, def, SIZE, &mut PlacementRng::new(7));

        assert_eq!(a, b);
    }

    #[test]
    fn update_is_idempotent_within_epsilon() {
        let mut chart = AngleChart::standard();
        assert!(update_point(&mut chart.points, 0, 10.0, 20.0));
        assert!(!update_point(&mut chart.points, 0, 10.0, 20.0));
        assert!(!update_point(&mut chart.points, 0, 10.0005, 20.0005));
        assert!(update_point(&mut chart.points, 0, 10.01, 20.0));
    }

    #[test]
    fn update_touches_only_the_dragged_slot() {
        let mut chart = AngleChart::standard();
        update_point(&mut chart.points, 3, 50.0, 60.0);
        for (index, landmark) in chart.points.iter().enumerate() {
            if index == 3 {
                assert_eq!(landmark.position(), Some(Point2::new(50.0, 60.0)));
            } else {
                assert_eq!(landmark.position(), None);
            }
        }
    }

    #[test]
    fn update_rejects_bad_input() {
        let mut chart = AngleChart::standard();
        assert!(!update_point(&mut chart.points, 99, 1.0, 1.0));
        assert!(!update_point(&mut chart.points, 0, f64::NAN, 1.0));
        assert!(!update_point(&mut chart.points, 0, 1.0, f64::INFINITY));
        assert!(chart.points[0].position().is_none());
    }

    #[test]
    fn placing_an_unset_slot_reports_a_change() {
        let mut chart = AngleChart::standard();
        assert!(update_point(&mut chart.points, 5, 0.0, 0.0));
        assert!(!update_point(&mut chart.points, 5, 0.0, 0.0));
    }

    #[test]
    fn rng_draws_stay_in_unit_interval() {
        let mut rng = PlacementRng::new(0xDEAD_BEEF);
        for _ in 0..1000 {
            let draw = rng.next_f64();
            assert!((0.0..1.0).contains(&draw));
        }
    }
}

//! Incremental recomputation of measurement geometry for one photo's
//! active angle kind.
//!
//! The pipeline is staged: resolve landmark positions into a working set,
//! derive (possibly extended) segments from the connections, then intersect
//! the declared segment pairs into reported angles. Segments are only
//! re-emitted when they structurally change, and every degenerate element
//! is dropped locally: mid-drag geometry routinely collapses and must never
//! abort the pass or its sibling elements.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chart::{AngleChart, AngleDefinition, AngleKind};
use crate::geometry::{
    extend_line, intersect, vector_angle_degrees, Point2, Segment, OVERLAP_PIXELS_PER_UNIT,
};
use crate::photo::{resolve_working_set, PhotoSize, PlacementRng, ResolvedPoint};

#[cfg(test)]
mod tests_engine;

/// How far the last recomputation pass progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Idle,
    PointsResolved,
    LinesDerived,
    AnglesComputed,
}

/// Intersection vertex and included angle for one shown angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculatedAngle {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "angle")]
    pub degrees: f64,
}

/// Recomputation state for one (photo, angle kind) pair.
///
/// The report latch is part of this state: the first computed angle is
/// handed out once per activation, and switching photo or tool goes through
/// `reset`, which clears it.
pub struct AngleEngine {
    kind: AngleKind,
    phase: EnginePhase,
    working: Vec<ResolvedPoint>,
    segments: Vec<Segment>,
    angles: Vec<CalculatedAngle>,
    reported: bool,
}

impl AngleEngine {
    pub fn new(kind: AngleKind) -> Self {
        Self {
            kind,
            phase: EnginePhase::Idle,
            working: Vec::new(),
            segments: Vec::new(),
            angles: Vec::new(),
            reported: false,
        }
    }

    pub fn kind(&self) -> AngleKind {
        self.kind
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// The working set from the last resolve.
    pub fn working_points(&self) -> &[ResolvedPoint] {
        &self.working
    }

    /// Segments from the last derive pass, in connection order with skipped
    /// entries compacted out.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn angles(&self) -> &[CalculatedAngle] {
        &self.angles
    }

    /// Back to `Idle`, clearing all derived state and the report latch.
    /// Called when the photo or the active tool changes.
    pub fn reset(&mut self) {
        self.phase = EnginePhase::Idle;
        self.working.clear();
        self.segments.clear();
        self.angles.clear();
        self.reported = false;
    }

    /// Accept a freshly resolved working set.
    pub fn set_working_points(&mut self, working: Vec<ResolvedPoint>) {
        self.working = working;
        self.phase = EnginePhase::PointsResolved;
    }

    fn position_of(&self, index: usize) -> Option<Point2> {
        self.working
            .iter()
            .find(|point| point.index == index)
            .map(|point| point.position)
    }

    /// Derive one segment per connection, applying overlap extension at the
    /// given zoom scale. Connections whose endpoints are missing from the
    /// working set, or whose extension is degenerate, are skipped.
    ///
    /// Returns `true` when the derived list differs structurally from the
    /// previous one. An unchanged list is not re-emitted, so downstream
    /// consumers that feed back into point resolution cannot loop.
    pub fn derive_segments(&mut self, def: &AngleDefinition, scale: f64) -> bool {
        let mut derived = Vec::with_capacity(def.connections.len());

        for connection in &def.connections {
            let (Some(start), Some(end)) = (
                self.position_of(connection.start_index),
                self.position_of(connection.end_index),
            ) else {
                continue;
            };

            // Both extensions measure from the original endpoints.
            let extended_start = if connection.start_overlap != 0.0 {
                extend_line(
                    end,
                    start,
                    connection.start_overlap / scale * OVERLAP_PIXELS_PER_UNIT,
                )
            } else {
                Some(start)
            };
            let extended_end = if connection.end_overlap != 0.0 {
                extend_line(
                    start,
                    end,
                    connection.end_overlap / scale * OVERLAP_PIXELS_PER_UNIT,
                )
            } else {
                Some(end)
            };

            let (Some(start), Some(end)) = (extended_start, extended_end) else {
                continue;
            };

            derived.push(Segment::new(start, end));
        }

        if derived == self.segments {
            return false;
        }

        debug!(kind = %self.kind, segments = derived.len(), "segment list changed");
        self.segments = derived;
        self.phase = EnginePhase::LinesDerived;
        true
    }

    /// Intersect each declared segment pair. Pairs with an out-of-range
    /// connection index, near-parallel carriers, or a zero-length direction
    /// are omitted; the remaining pairs still compute.
    pub fn compute_angles(&mut self, def: &AngleDefinition) -> &[CalculatedAngle] {
        let mut computed = Vec::new();

        for shown in &def.shown_angles {
            let (Some(a), Some(b)) = (
                self.segments.get(shown.a.index),
                self.segments.get(shown.b.index),
            ) else {
                continue;
            };

            let Some(vertex) = intersect(a, b) else {
                continue;
            };
            let Some(degrees) = vector_angle_degrees(a, b) else {
                continue;
            };

            computed.push(CalculatedAngle {
                x: vertex.x,
                y: vertex.y,
                degrees,
            });
        }

        self.angles = computed;
        self.phase = EnginePhase::AnglesComputed;
        &self.angles
    }

    /// The first computed angle, handed out at most once per activation.
    /// The latch holds until `reset` clears it.
    pub fn take_report(&mut self) -> Option<CalculatedAngle> {
        if self.reported || self.angles.is_empty() {
            return None;
        }
        self.reported = true;
        Some(self.angles[0])
    }

    /// One full synchronous pass for this engine's kind: resolve the
    /// working set, derive segments, recompute angles when the geometry
    /// changed, and yield the value to record if the latch allows one.
    pub fn update(
        &mut self,
        chart: &mut AngleChart,
        size: PhotoSize,
        scale: f64,
        rng: &mut PlacementRng,
    ) -> Option<CalculatedAngle> {
        let (def, points) = chart.definition_and_points_mut(self.kind);
        let working = resolve_working_set(points, def, size, rng);
        self.set_working_points(working);

        if !self.derive_segments(def, scale) {
            return None;
        }
        self.compute_angles(def);
        self.take_report()
    }
}

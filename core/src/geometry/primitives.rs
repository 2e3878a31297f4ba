//! Point and line algebra for the measurement overlay.
//!
//! Everything here is total: degenerate input (zero-length bases, parallel
//! carriers, non-finite coordinates) yields `None` instead of panicking or
//! leaking NaN, because in-progress dragging routinely produces transient
//! degenerate geometry.

use super::{Point2, Vector2, PARALLEL_EPSILON};

/// A measurement segment between two resolved landmark positions.
///
/// Derived per recomputation pass and compared structurally (exact
/// coordinate equality) to detect geometry changes; never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point2,
    pub end: Point2,
}

impl Segment {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// Direction vector from start to end.
    pub fn direction(&self) -> Vector2 {
        self.end - self.start
    }

    fn is_finite(&self) -> bool {
        point_is_finite(&self.start) && point_is_finite(&self.end)
    }
}

#[inline]
fn point_is_finite(p: &Point2) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Push `near` past itself along the `far -> near` ray by `extend_by`.
///
/// `extend_line(a, b, 0.0)` returns `b` unchanged. Returns `None` when the
/// base is zero-length (the unit vector is undefined) or when any input or
/// the result is non-finite.
pub fn extend_line(far: Point2, near: Point2, extend_by: f64) -> Option<Point2> {
    if !point_is_finite(&far) || !point_is_finite(&near) || !extend_by.is_finite() {
        return None;
    }

    let delta = near - far;
    let length = delta.norm();
    if length == 0.0 {
        return None;
    }

    let extended = near + delta * (extend_by / length);
    point_is_finite(&extended).then_some(extended)
}

/// Intersection of the two infinite carrier lines through `a` and `b`.
///
/// Standard determinant form. Returns `None` when either segment has a
/// non-finite endpoint or the determinant magnitude falls below
/// `PARALLEL_EPSILON`. Symmetric in its arguments.
pub fn intersect(a: &Segment, b: &Segment) -> Option<Point2> {
    if !a.is_finite() || !b.is_finite() {
        return None;
    }

    let (p1, p2) = (a.start, a.end);
    let (p3, p4) = (b.start, b.end);

    let denominator = (p1.x - p2.x) * (p3.y - p4.y) - (p1.y - p2.y) * (p3.x - p4.x);
    if denominator.abs() < PARALLEL_EPSILON {
        return None;
    }

    let cross_a = p1.x * p2.y - p1.y * p2.x;
    let cross_b = p3.x * p4.y - p3.y * p4.x;

    let x = (cross_a * (p3.x - p4.x) - (p1.x - p2.x) * cross_b) / denominator;
    let y = (cross_a * (p3.y - p4.y) - (p1.y - p2.y) * cross_b) / denominator;

    Some(Point2::new(x, y))
}

/// Angle in degrees between the direction vectors of `a` and `b`.
///
/// The cosine is clamped to [-1, 1] before `acos` so floating-point
/// overshoot cannot escape the domain. Returns `None` when either direction
/// has zero magnitude.
pub fn vector_angle_degrees(a: &Segment, b: &Segment) -> Option<f64> {
    let va = a.direction();
    let vb = b.direction();

    let magnitudes = va.norm() * vb.norm();
    if magnitudes == 0.0 || !magnitudes.is_finite() {
        return None;
    }

    let cos = (va.dot(&vb) / magnitudes).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

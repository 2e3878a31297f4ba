use nalgebra as na;

pub type Point2 = na::Point2<f64>;
pub type Vector2 = na::Vector2<f64>;

/// Determinant magnitude below which two carrier lines are treated as
/// parallel and no intersection is reported.
pub const PARALLEL_EPSILON: f64 = 0.001;

/// Coordinate delta below which a landmark update is considered a no-op.
pub const COORD_EPSILON: f64 = 0.001;

/// Pixel length of one logical overlap unit at unit zoom.
pub const OVERLAP_PIXELS_PER_UNIT: f64 = 20_000.0;

pub mod primitives;
pub use primitives::*;

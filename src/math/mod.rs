pub mod align;
pub mod arc_2d;
pub mod intersect_2d;

pub use align::{aligned_direction, compass_directions};
pub use arc_2d::{fit_arc, ArcFit};
pub use intersect_2d::line_intersection_parameter;

/// 2D point type on the ground plane.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type on the ground plane.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns the unit vector of `v`, or `None` for a (near) zero-length vector.
#[must_use]
pub fn try_normalize(v: &Vector2) -> Option<Vector2> {
    v.try_normalize(TOLERANCE)
}

/// Rotates `v` by 90 degrees counter-clockwise in the plane's (x, y) frame.
#[must_use]
pub fn perp(v: &Vector2) -> Vector2 {
    Vector2::new(-v.y, v.x)
}

/// Returns whether `p` lies inside the square `[-half_extent, half_extent]²`.
#[must_use]
pub fn within_extent(p: &Point2, half_extent: f64) -> bool {
    p.x >= -half_extent && p.x <= half_extent && p.y >= -half_extent && p.y <= half_extent
}

use super::{Point2, Vector2, TOLERANCE};

/// Parametric intersection of the line `p1 + t * r1` with the line through
/// `p2` along `r2`.
///
/// Returns `t` such that `p1 + t * r1` lies on the second line, or `None` if
/// the lines are parallel or either direction is the zero vector.
///
/// The second line is eliminated along its numerically larger axis so the
/// division by `r2` never blows up for nearly axis-aligned directions.
#[must_use]
pub fn line_intersection_parameter(
    p1: &Point2,
    r1: &Vector2,
    p2: &Point2,
    r2: &Vector2,
) -> Option<f64> {
    if r1.norm_squared() < TOLERANCE * TOLERANCE || r2.norm_squared() < TOLERANCE * TOLERANCE {
        return None;
    }

    let d = p2 - p1;
    let (m, x) = if r2.x.abs() > r2.y.abs() {
        let f = r2.y / r2.x;
        (r1.y - f * r1.x, d.y - f * d.x)
    } else {
        let f = r2.x / r2.y;
        (r1.x - f * r1.y, d.x - f * d.y)
    };

    // Scale-aware parallel check: `m` is a cross product divided by one
    // component of `r2`, so compare against the length of `r1`.
    if m.abs() < TOLERANCE * r1.norm().max(1.0) {
        return None;
    }

    Some(x / m)
}

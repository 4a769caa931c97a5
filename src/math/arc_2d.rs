//! Circular arc math on the ground plane.
//!
//! Handedness convention: an arc flagged `clockwise` sweeps from its start to
//! its end with increasing polar angle in the plane's (x, y) frame. The plane
//! is the world `y = 0` plane with plane `y` mapped to world `z`, so viewed
//! from above that sweep appears clockwise.
use std::f64::consts::TAU;

use nalgebra::Rotation2;

use super::align::aligned_direction;
use super::intersect_2d::line_intersection_parameter;
use super::{perp, Point2, Vector2};

/// Result of fitting an arc between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcFit {
    /// Center of the arc circle.
    pub center: Point2,
    /// Radius, always positive.
    pub radius: f64,
    /// Handedness of the sweep from start to end.
    pub clockwise: bool,
}

/// Fits an arc from `start` to `end` that leaves `start` tangent to one of
/// the candidate directions.
///
/// The candidate best aligned with the chord `end - start` is used as the
/// tangent at `start` (ties keep the earliest candidate). The center is the
/// intersection of the normal at `start` with the chord's perpendicular
/// bisector.
///
/// Returns `None` when a straight line should be used instead: the tangent
/// is colinear with the chord, the chord is zero-length, or no candidate is
/// usable.
#[must_use]
pub fn fit_arc(start: &Point2, end: &Point2, candidates: &[Vector2]) -> Option<ArcFit> {
    let chord = end - start;
    let direction = aligned_direction(candidates, &chord)?;

    let r1 = perp(&direction);
    let mid = Point2::from((start.coords + end.coords) * 0.5);
    let r2 = perp(&chord);

    let t = line_intersection_parameter(start, &r1, &mid, &r2)?;

    Some(ArcFit {
        center: start + r1 * t,
        radius: t.abs(),
        clockwise: t > 0.0,
    })
}

/// Signed sweep angle from `start` to `end` around `center`.
///
/// Positive for a `clockwise` arc (increasing polar angle), negative
/// otherwise. The magnitude lies in `[0, 2π)`.
#[must_use]
pub fn sweep_angle(start: &Point2, end: &Point2, center: &Point2, clockwise: bool) -> f64 {
    let angle_start = polar_angle(center, start);
    let angle_end = polar_angle(center, end);

    let mut sweep = if clockwise {
        angle_end - angle_start
    } else {
        angle_start - angle_end
    };
    if sweep < 0.0 {
        sweep += TAU;
    }

    if clockwise {
        sweep
    } else {
        -sweep
    }
}

/// Polar angle of `p` as seen from `center`.
#[must_use]
pub fn polar_angle(center: &Point2, p: &Point2) -> f64 {
    (p.y - center.y).atan2(p.x - center.x)
}

/// Point on the circle around `center` with the given radius and polar angle.
#[must_use]
pub fn point_on_circle(center: &Point2, radius: f64, angle: f64) -> Point2 {
    center + Vector2::new(angle.cos(), angle.sin()) * radius
}

/// Travel direction of an arc at `point` (one of its endpoints), i.e. the
/// tangent pointing along the sweep.
///
/// Not normalized; its length equals the distance from `center` to `point`.
#[must_use]
pub fn sweep_tangent(center: &Point2, point: &Point2, clockwise: bool) -> Vector2 {
    let radial = perp(&(point - center));
    if clockwise {
        radial
    } else {
        -radial
    }
}

/// Signed angle that rotates `from` onto `to`, in `(-π, π]`.
#[must_use]
pub fn signed_angle(from: &Vector2, to: &Vector2) -> f64 {
    let cross = from.x * to.y - from.y * to.x;
    cross.atan2(from.dot(to))
}

/// Rotates `v` counter-clockwise (in the plane's frame) by `angle` radians.
#[must_use]
pub fn rotate(v: &Vector2, angle: f64) -> Vector2 {
    Rotation2::new(angle) * *v
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn colinear_tangent_falls_back_to_line() {
        let fit = fit_arc(
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 0.0),
            &[Vector2::new(1.0, 0.0)],
        );
        assert!(fit.is_none());
    }

    #[test]
    fn quarter_turn_fit() {
        // Tangent +x at start while the chord points +y.
        let fit = fit_arc(
            &Point2::new(0.0, 0.0),
            &Point2::new(0.0, 2.0),
            &[Vector2::new(1.0, 0.0)],
        )
        .unwrap();
        assert_relative_eq!(fit.center, Point2::new(0.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(fit.radius, 1.0, epsilon = 1e-12);
        assert!(fit.clockwise);
    }

    #[test]
    fn mirrored_fit_flips_handedness() {
        let fit = fit_arc(
            &Point2::new(0.0, 0.0),
            &Point2::new(0.0, -2.0),
            &[Vector2::new(1.0, 0.0)],
        )
        .unwrap();
        assert_relative_eq!(fit.center, Point2::new(0.0, -1.0), epsilon = 1e-12);
        assert_relative_eq!(fit.radius, 1.0, epsilon = 1e-12);
        assert!(!fit.clockwise);
    }

    #[test]
    fn fitted_center_is_equidistant_from_both_ends() {
        let start = Point2::new(1.0, -2.0);
        let end = Point2::new(4.0, 3.5);
        let fit = fit_arc(&start, &end, &[Vector2::new(0.3, 1.0)]).unwrap();
        assert_relative_eq!((start - fit.center).norm(), fit.radius, epsilon = 1e-9);
        assert_relative_eq!((end - fit.center).norm(), fit.radius, epsilon = 1e-9);

        // The sweep must leave the start along the chosen tangent.
        let tangent = sweep_tangent(&fit.center, &start, fit.clockwise).normalize();
        assert_relative_eq!(tangent, Vector2::new(0.3, 1.0).normalize(), epsilon = 1e-9);
    }

    #[test]
    fn zero_chord_is_straight() {
        let p = Point2::new(1.0, 1.0);
        assert!(fit_arc(&p, &p, &[Vector2::new(1.0, 0.0)]).is_none());
    }

    #[test]
    fn sweep_sign_follows_handedness() {
        let center = Point2::new(0.0, 1.0);
        let start = Point2::new(0.0, 0.0);
        let end = Point2::new(0.0, 2.0);
        let cw = sweep_angle(&start, &end, &center, true);
        let ccw = sweep_angle(&start, &end, &center, false);
        assert_abs_diff_eq!(cw, PI, epsilon = 1e-12);
        assert_abs_diff_eq!(ccw, -PI, epsilon = 1e-12);

        let quarter = Point2::new(1.0, 1.0);
        assert_abs_diff_eq!(
            sweep_angle(&start, &quarter, &center, true),
            FRAC_PI_2,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            sweep_angle(&start, &quarter, &center, false),
            -3.0 * FRAC_PI_2,
            epsilon = 1e-12
        );
    }

    #[test]
    fn rotation_and_signed_angle_agree() {
        let a = Vector2::new(1.0, 0.0);
        let b = Vector2::new(0.0, 2.0);
        let angle = signed_angle(&a, &b);
        assert_abs_diff_eq!(angle, FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(rotate(&a, angle), Vector2::new(0.0, 1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(signed_angle(&b, &a), -FRAC_PI_2, epsilon = 1e-12);
    }
}

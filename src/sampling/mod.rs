//! Polyline sampling of the track graph.
//!
//! Consumers (renderers, rule checking, procedural generation) use these to
//! turn track geometry into evenly spaced centerline points.
mod sample_path;
mod sample_segment;

pub use sample_path::SamplePath;
pub use sample_segment::sample_segment;

use crate::error::{Result, SamplingError};
use crate::math::{arc_2d, Point2, TOLERANCE};

/// Checks that a sampling step is finite and positive.
fn check_step(step: f64) -> Result<()> {
    if step.is_finite() && step > 0.0 {
        Ok(())
    } else {
        Err(SamplingError::InvalidStep(step).into())
    }
}

/// Appends points from `start` towards `end` every `step`, excluding `end`.
fn sample_line(start: &Point2, end: &Point2, step: f64, out: &mut Vec<Point2>) {
    let chord = end - start;
    let len = chord.norm();
    if len < TOLERANCE {
        return;
    }
    let dir = chord / len;

    let mut k = 0.0;
    while k * step < len {
        out.push(start + dir * (k * step));
        k += 1.0;
    }
}

/// Appends points along an arc starting at polar angle `start_angle` and
/// sweeping `sweep` radians, spaced roughly `step` apart along the arc,
/// excluding the final point.
fn sample_arc(
    center: &Point2,
    radius: f64,
    start_angle: f64,
    sweep: f64,
    step: f64,
    out: &mut Vec<Point2>,
) {
    let ratio = radius * sweep.abs() / step;
    if ratio < TOLERANCE {
        return;
    }

    let mut k = 0.0;
    while k < ratio {
        let angle = start_angle + k * sweep / ratio;
        out.push(arc_2d::point_on_circle(center, radius, angle));
        k += 1.0;
    }
}

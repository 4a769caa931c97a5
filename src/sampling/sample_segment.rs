use crate::error::{GraphError, Result};
use crate::graph::{Segment, SegmentId, TrackGraph};
use crate::math::{arc_2d, Point2};

use super::{check_step, sample_arc, sample_line};

/// Samples one segment in its own start-to-end orientation.
///
/// Lines and arcs yield points from the start up to (not including) the
/// end. An intersection yields each spoke as a straight run from the center
/// out to the link, links in stored order.
///
/// # Errors
///
/// Returns an error if the step is invalid or the segment, or one of its
/// control points, no longer resolves.
pub fn sample_segment(graph: &TrackGraph, id: SegmentId, step: f64) -> Result<Vec<Point2>> {
    check_step(step)?;
    let segment = graph.segment(id)?;
    let position = |p| graph.position(p).ok_or(GraphError::ControlPointNotFound);

    let mut points = Vec::new();
    match segment {
        Segment::Line(line) => {
            let (start, end) = (position(line.start)?, position(line.end)?);
            sample_line(&start, &end, step, &mut points);
        }
        Segment::Arc(arc) => {
            let start = position(arc.start)?;
            let end = position(arc.end)?;
            let sweep = arc_2d::sweep_angle(&start, &end, &arc.center, arc.clockwise);
            let angle = arc_2d::polar_angle(&arc.center, &start);
            sample_arc(&arc.center, arc.radius, angle, sweep, step, &mut points);
        }
        Segment::Intersection(hub) => {
            let center = position(hub.center)?;
            for &link in &hub.links {
                sample_line(&center, &position(link)?, step, &mut points);
            }
        }
    }
    Ok(points)
}

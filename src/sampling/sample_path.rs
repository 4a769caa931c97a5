use std::collections::HashSet;

use crate::error::Result;
use crate::graph::{ControlPointId, IntersectionSegment, Segment, SegmentId, TrackGraph};
use crate::math::{arc_2d, Point2};

use super::{check_step, sample_arc, sample_line};

/// Samples the track as a single walk into an evenly spaced centerline.
///
/// The walk starts at the first control point (in store order) with exactly
/// one segment, or at the first control point if the track is a closed loop.
/// At each point it follows the first not yet visited segment, and it stops
/// at a dead end or when it returns to a visited point. There is no
/// branching search.
///
/// An intersection is crossed straight: from the incoming spoke through the
/// center to the opposite spoke, where spokes are ordered by angle around the
/// center and spoke `i` pairs with spoke `i + n/2`.
///
/// Segments whose control points no longer resolve are skipped.
#[derive(Debug, Clone, Copy)]
pub struct SamplePath {
    step: f64,
}

impl SamplePath {
    /// Creates a new `SamplePath` operation with the given point spacing.
    #[must_use]
    pub fn new(step: f64) -> Self {
        Self { step }
    }

    /// Executes the walk, returning the sampled centerline.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is not finite and positive.
    pub fn execute(&self, graph: &TrackGraph) -> Result<Vec<Point2>> {
        check_step(self.step)?;

        let start = graph
            .control_points()
            .find(|(_, p)| p.segments().len() == 1)
            .map(|(id, _)| id)
            .or_else(|| graph.control_point_ids().first().copied());
        let Some(mut current) = start else {
            return Ok(Vec::new());
        };

        let mut visited_points = HashSet::new();
        let mut visited_segments: HashSet<SegmentId> = HashSet::new();
        let mut points = Vec::new();

        while visited_points.insert(current) {
            let next = graph
                .segments_of(current)
                .iter()
                .copied()
                .find(|id| !visited_segments.contains(id) && resolves(graph, *id));
            let Some(seg_id) = next else {
                break;
            };
            visited_segments.insert(seg_id);

            let Some(next_point) =
                self.walk(graph, seg_id, current, &mut visited_points, &mut points)
            else {
                break;
            };
            current = next_point;
        }

        Ok(points)
    }

    /// Emits the samples of one segment entered at `from` and returns the
    /// point the walk continues from.
    fn walk(
        self,
        graph: &TrackGraph,
        seg_id: SegmentId,
        from: ControlPointId,
        visited_points: &mut HashSet<ControlPointId>,
        out: &mut Vec<Point2>,
    ) -> Option<ControlPointId> {
        let from_pos = graph.position(from)?;
        let segment = graph.segment(seg_id).ok()?;
        match segment {
            Segment::Line(_) => {
                let other = segment.other_endpoint(from)?;
                sample_line(&from_pos, &graph.position(other)?, self.step, out);
                Some(other)
            }
            Segment::Arc(arc) => {
                let start = graph.position(arc.start)?;
                let end = graph.position(arc.end)?;
                let sweep = arc_2d::sweep_angle(&start, &end, &arc.center, arc.clockwise);
                let (other, sweep) = if from == arc.start {
                    (arc.end, sweep)
                } else {
                    (arc.start, -sweep)
                };
                let start_angle = arc_2d::polar_angle(&arc.center, &from_pos);
                sample_arc(&arc.center, arc.radius, start_angle, sweep, self.step, out);
                Some(other)
            }
            Segment::Intersection(hub) => {
                let center = graph.position(hub.center)?;
                if from == hub.center {
                    let exit = hub
                        .links
                        .iter()
                        .copied()
                        .find(|link| !visited_points.contains(link))?;
                    sample_line(&center, &graph.position(exit)?, self.step, out);
                    return Some(exit);
                }

                sample_line(&from_pos, &center, self.step, out);
                let exit = opposite_link(graph, hub, from, &center);
                match exit {
                    Some(exit) if exit != from => {
                        visited_points.insert(hub.center);
                        sample_line(&center, &graph.position(exit)?, self.step, out);
                        Some(exit)
                    }
                    _ => Some(hub.center),
                }
            }
        }
    }
}

/// The link paired with `incoming` once links are sorted by angle around
/// the center.
fn opposite_link(
    graph: &TrackGraph,
    hub: &IntersectionSegment,
    incoming: ControlPointId,
    center: &Point2,
) -> Option<ControlPointId> {
    let mut around: Vec<(f64, ControlPointId)> = hub
        .links
        .iter()
        .filter_map(|&link| {
            let p = graph.position(link)?;
            Some((arc_2d::polar_angle(center, &p), link))
        })
        .collect();
    around.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = around.len();
    let i = around.iter().position(|&(_, link)| link == incoming)?;
    Some(around[(i + n / 2) % n].1)
}

fn resolves(graph: &TrackGraph, id: SegmentId) -> bool {
    graph.segment(id).is_ok_and(|segment| {
        segment
            .control_points()
            .iter()
            .all(|&p| graph.position(p).is_some())
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_4;

    fn pt(graph: &mut TrackGraph, x: f64, y: f64) -> ControlPointId {
        graph.insert_control_point(Point2::new(x, y))
    }

    #[test]
    fn empty_graph_yields_no_points() {
        let graph = TrackGraph::new();
        assert!(SamplePath::new(0.1).execute(&graph).unwrap().is_empty());
    }

    #[test]
    fn invalid_step_is_rejected() {
        let graph = TrackGraph::new();
        assert!(SamplePath::new(-1.0).execute(&graph).is_err());
        assert!(SamplePath::new(f64::INFINITY).execute(&graph).is_err());
    }

    #[test]
    fn walks_chain_from_dead_end() {
        let mut graph = TrackGraph::new();
        let b = pt(&mut graph, 1.0, 0.0);
        let c = pt(&mut graph, 2.0, 0.0);
        let a = pt(&mut graph, 0.0, 0.0);
        // Store order: b, c, a. The first dead end in store order is c.
        graph.add_line(b, c).unwrap();
        graph.add_line(a, b).unwrap();

        let points = SamplePath::new(0.5).execute(&graph).unwrap();
        let expected = [
            Point2::new(2.0, 0.0),
            Point2::new(1.5, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 0.0),
        ];
        assert_eq!(points.len(), expected.len());
        for (p, e) in points.iter().zip(&expected) {
            assert_relative_eq!(*p, *e, epsilon = 1e-12);
        }
    }

    #[test]
    fn arc_is_sampled_in_travel_direction() {
        let mut graph = TrackGraph::new();
        let b = pt(&mut graph, 0.0, 2.0);
        let a = pt(&mut graph, 0.0, 0.0);
        let far = pt(&mut graph, -1.0, 2.0);
        // far -> b (line), then b -> a along the arc, i.e. against its own
        // start-to-end orientation.
        graph.add_line(far, b).unwrap();
        graph
            .add_arc(a, b, Point2::new(0.0, 1.0), 1.0, true)
            .unwrap();

        let points = SamplePath::new(FRAC_PI_4).execute(&graph).unwrap();
        let arc_points = &points[points.len() - 4..];
        assert_relative_eq!(arc_points[0], Point2::new(0.0, 2.0), epsilon = 1e-12);
        assert_relative_eq!(arc_points[2], Point2::new(1.0, 1.0), epsilon = 1e-12);
        assert!(arc_points[3].y < 1.0);
    }

    #[test]
    fn closed_loop_stops_at_start() {
        let mut graph = TrackGraph::new();
        let a = pt(&mut graph, 0.0, 0.0);
        let b = pt(&mut graph, 1.0, 0.0);
        let c = pt(&mut graph, 0.0, 1.0);
        graph.add_line(a, b).unwrap();
        graph.add_line(b, c).unwrap();
        graph.add_line(c, a).unwrap();

        let points = SamplePath::new(0.5).execute(&graph).unwrap();
        // 2 + 3 (diagonal of length √2) + 2 samples.
        assert_eq!(points.len(), 7);
        assert_relative_eq!(points[0], Point2::new(0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn intersection_is_crossed_straight() {
        let mut graph = TrackGraph::new();
        let far = pt(&mut graph, -3.0, 0.0);
        let west = pt(&mut graph, -1.0, 0.0);
        graph.add_line(far, west).unwrap();

        let center = pt(&mut graph, 0.0, 0.0);
        let east = pt(&mut graph, 1.0, 0.0);
        let north = pt(&mut graph, 0.0, 1.0);
        let south = pt(&mut graph, 0.0, -1.0);
        graph
            .add_intersection(center, &[east, north, west, south])
            .unwrap();

        let points = SamplePath::new(0.5).execute(&graph).unwrap();
        // far -> west (4), west -> center (2), center -> east (2).
        assert_eq!(points.len(), 8);
        for p in &points {
            assert_relative_eq!(p.y, 0.0, epsilon = 1e-12);
        }
        assert_relative_eq!(points[7], Point2::new(0.5, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn sampling_is_idempotent() {
        let mut graph = TrackGraph::new();
        let a = pt(&mut graph, 0.0, 0.0);
        let b = pt(&mut graph, 2.0, 0.0);
        let c = pt(&mut graph, 2.0, 2.0);
        graph.add_line(a, b).unwrap();
        graph
            .add_arc(b, c, Point2::new(2.0, 1.0), 1.0, true)
            .unwrap();

        let sampler = SamplePath::new(0.1);
        let first = sampler.execute(&graph).unwrap();
        let second = sampler.execute(&graph).unwrap();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }
}

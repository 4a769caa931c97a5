use crate::math::arc_2d::sweep_tangent;
use crate::math::{ArcFit, Point2, Vector2};

use super::control_point::ControlPointId;
use super::TrackGraph;

slotmap::new_key_type! {
    /// Unique identifier for a track segment in the track graph.
    pub struct SegmentId;
}

/// Style of the center lane marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaneMarking {
    #[default]
    Dashed,
    DoubleSolid,
    DashedAndSolid,
    SolidAndDashed,
    Missing,
}

impl LaneMarking {
    /// All markings, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Dashed,
        Self::DoubleSolid,
        Self::DashedAndSolid,
        Self::SolidAndDashed,
        Self::Missing,
    ];

    /// Name used by the persistence schema.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashed => "Dashed",
            Self::DoubleSolid => "DoubleSolid",
            Self::DashedAndSolid => "DashedAndSolid",
            Self::SolidAndDashed => "SolidAndDashed",
            Self::Missing => "Missing",
        }
    }

    /// Parses a schema name. Matching is exact.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }
}

/// Lane-marking attributes shared by lines and arcs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Markings {
    pub center_line: LaneMarking,
    pub left_line_missing: bool,
    pub right_line_missing: bool,
}

/// A straight segment between two control points.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegment {
    pub start: ControlPointId,
    pub end: ControlPointId,
    pub markings: Markings,
}

/// A circular arc between two control points.
///
/// See [`crate::math::arc_2d`] for the handedness convention.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcSegment {
    pub start: ControlPointId,
    pub end: ControlPointId,
    pub center: Point2,
    pub radius: f64,
    pub clockwise: bool,
    pub markings: Markings,
}

/// A multi-way hub: one center point joined to every link point by this
/// single segment.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionSegment {
    pub center: ControlPointId,
    pub links: Vec<ControlPointId>,
}

/// A typed edge of the track graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Line(LineSegment),
    Arc(ArcSegment),
    Intersection(IntersectionSegment),
}

/// Geometry to give a two-ended segment when reshaping it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// A straight line.
    Straight,
    /// An arc with the given center, radius and handedness (start to end).
    Arc {
        center: Point2,
        radius: f64,
        clockwise: bool,
    },
}

impl From<ArcFit> for Shape {
    fn from(fit: ArcFit) -> Self {
        Self::Arc {
            center: fit.center,
            radius: fit.radius,
            clockwise: fit.clockwise,
        }
    }
}

impl Segment {
    /// Every control point this segment touches. For an intersection the
    /// center comes first, followed by the links in order.
    #[must_use]
    pub fn control_points(&self) -> Vec<ControlPointId> {
        match self {
            Self::Line(line) => vec![line.start, line.end],
            Self::Arc(arc) => vec![arc.start, arc.end],
            Self::Intersection(hub) => {
                let mut points = Vec::with_capacity(hub.links.len() + 1);
                points.push(hub.center);
                points.extend_from_slice(&hub.links);
                points
            }
        }
    }

    /// Returns whether `point` is one of this segment's control points.
    #[must_use]
    pub fn touches(&self, point: ControlPointId) -> bool {
        match self {
            Self::Line(line) => line.start == point || line.end == point,
            Self::Arc(arc) => arc.start == point || arc.end == point,
            Self::Intersection(hub) => hub.center == point || hub.links.contains(&point),
        }
    }

    /// Start and end of a line or arc. `None` for an intersection.
    #[must_use]
    pub fn endpoints(&self) -> Option<(ControlPointId, ControlPointId)> {
        match self {
            Self::Line(line) => Some((line.start, line.end)),
            Self::Arc(arc) => Some((arc.start, arc.end)),
            Self::Intersection(_) => None,
        }
    }

    /// The endpoint opposite `point` on a line or arc.
    #[must_use]
    pub fn other_endpoint(&self, point: ControlPointId) -> Option<ControlPointId> {
        let (start, end) = self.endpoints()?;
        if start == point {
            Some(end)
        } else if end == point {
            Some(start)
        } else {
            None
        }
    }

    /// Lane markings of a line or arc.
    #[must_use]
    pub fn markings(&self) -> Option<&Markings> {
        match self {
            Self::Line(line) => Some(&line.markings),
            Self::Arc(arc) => Some(&arc.markings),
            Self::Intersection(_) => None,
        }
    }

    pub(crate) fn markings_mut(&mut self) -> Option<&mut Markings> {
        match self {
            Self::Line(line) => Some(&mut line.markings),
            Self::Arc(arc) => Some(&mut arc.markings),
            Self::Intersection(_) => None,
        }
    }

    /// Replaces every occurrence of `from` with `to`.
    pub(crate) fn replace_control_point(&mut self, from: ControlPointId, to: ControlPointId) {
        let swap = |id: &mut ControlPointId| {
            if *id == from {
                *id = to;
            }
        };
        match self {
            Self::Line(line) => {
                swap(&mut line.start);
                swap(&mut line.end);
            }
            Self::Arc(arc) => {
                swap(&mut arc.start);
                swap(&mut arc.end);
            }
            Self::Intersection(hub) => {
                swap(&mut hub.center);
                hub.links.iter_mut().for_each(swap);
            }
        }
    }

    /// Outward continuation direction of the segment at `point`.
    ///
    /// This is the direction a new segment must leave `point` in to continue
    /// this one smoothly:
    /// - line: away from the other endpoint;
    /// - arc: the tangent perpendicular to the radius, oriented by handedness;
    /// - intersection link: from the center towards the link;
    /// - intersection center: the zero vector.
    ///
    /// Not normalized. Returns `None` if `point` is not part of the segment
    /// or a referenced control point no longer resolves.
    #[must_use]
    pub fn direction_at(&self, graph: &TrackGraph, point: ControlPointId) -> Option<Vector2> {
        match self {
            Self::Line(line) => {
                let start = graph.position(line.start)?;
                let end = graph.position(line.end)?;
                if line.start == point {
                    Some(start - end)
                } else if line.end == point {
                    Some(end - start)
                } else {
                    None
                }
            }
            Self::Arc(arc) => {
                if arc.start == point {
                    let start = graph.position(arc.start)?;
                    Some(-sweep_tangent(&arc.center, &start, arc.clockwise))
                } else if arc.end == point {
                    let end = graph.position(arc.end)?;
                    Some(sweep_tangent(&arc.center, &end, arc.clockwise))
                } else {
                    None
                }
            }
            Self::Intersection(hub) => {
                let center = graph.position(hub.center)?;
                if hub.center == point {
                    Some(Vector2::zeros())
                } else if hub.links.contains(&point) {
                    Some(graph.position(point)? - center)
                } else {
                    None
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn lane_marking_names_round_trip() {
        for marking in LaneMarking::ALL {
            assert_eq!(LaneMarking::from_name(marking.as_str()), Some(marking));
        }
        assert_eq!(LaneMarking::from_name("dashed"), None);
        assert_eq!(LaneMarking::default(), LaneMarking::Dashed);
    }

    #[test]
    fn line_direction_points_away_from_other_end() {
        let mut graph = TrackGraph::new();
        let a = graph.insert_control_point(Point2::new(0.0, 0.0));
        let b = graph.insert_control_point(Point2::new(2.0, 0.0));
        let id = graph.add_line(a, b).unwrap();
        let segment = graph.segment(id).unwrap();

        let at_a = segment.direction_at(&graph, a).unwrap();
        let at_b = segment.direction_at(&graph, b).unwrap();
        assert_relative_eq!(at_a, Vector2::new(-2.0, 0.0));
        assert_relative_eq!(at_b, Vector2::new(2.0, 0.0));
    }

    #[test]
    fn arc_direction_is_outward_tangent() {
        // Quarter-turn arc leaving (0,0) along +x, arriving at (0,2) along -x.
        let mut graph = TrackGraph::new();
        let a = graph.insert_control_point(Point2::new(0.0, 0.0));
        let b = graph.insert_control_point(Point2::new(0.0, 2.0));
        let id = graph
            .add_arc(a, b, Point2::new(0.0, 1.0), 1.0, true)
            .unwrap();
        let segment = graph.segment(id).unwrap();

        let at_start = segment.direction_at(&graph, a).unwrap().normalize();
        let at_end = segment.direction_at(&graph, b).unwrap().normalize();
        assert_relative_eq!(at_start, Vector2::new(-1.0, 0.0), epsilon = 1e-12);
        assert_relative_eq!(at_end, Vector2::new(-1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn intersection_directions() {
        let mut graph = TrackGraph::new();
        let c = graph.insert_control_point(Point2::new(0.0, 0.0));
        let l = graph.insert_control_point(Point2::new(0.0, 1.0));
        let id = graph.add_intersection(c, &[l]).unwrap();
        let segment = graph.segment(id).unwrap();

        assert_eq!(segment.direction_at(&graph, c).unwrap(), Vector2::zeros());
        let at_link = segment.direction_at(&graph, l).unwrap();
        assert_relative_eq!(at_link, Vector2::new(0.0, 1.0));
    }

    #[test]
    fn replace_control_point_rewires_every_slot() {
        let mut graph = TrackGraph::new();
        let a = graph.insert_control_point(Point2::new(0.0, 0.0));
        let b = graph.insert_control_point(Point2::new(1.0, 0.0));
        let c = graph.insert_control_point(Point2::new(2.0, 0.0));

        let mut hub = Segment::Intersection(IntersectionSegment {
            center: a,
            links: vec![b, a],
        });
        hub.replace_control_point(a, c);
        assert_eq!(hub.control_points(), vec![c, b, c]);
        assert!(!hub.touches(a));
        assert_eq!(hub.other_endpoint(b), None);
    }
}

pub mod control_point;
pub mod segment;

pub use control_point::{ControlPointData, ControlPointId};
pub use segment::{
    ArcSegment, IntersectionSegment, LaneMarking, LineSegment, Markings, Segment, SegmentId,
    Shape,
};

use std::collections::HashSet;

use slotmap::SlotMap;
use tracing::debug;

use crate::error::{GeometryError, GraphError, Result};
use crate::math::{compass_directions, try_normalize, Point2, Vector2};

/// Arena store of the track graph.
///
/// Control points and segments live in generational arenas and refer to each
/// other by ID: a segment holds the IDs of its control points, and a control
/// point holds the IDs of its incident segments. A segment lives exactly as
/// long as at least one control point lists it.
///
/// A control point is *live* once a segment is attached to it. Live points
/// are kept in a stable order that every enumeration follows. A point created
/// with [`TrackGraph::insert_control_point`] stays *pending* (allocated but
/// not part of the graph) until a segment attaches to it.
///
/// Every public mutation either fails without changing anything or leaves
/// the graph satisfying [`TrackGraph::validate`].
#[derive(Debug, Default, Clone)]
pub struct TrackGraph {
    points: SlotMap<ControlPointId, ControlPointData>,
    segments: SlotMap<SegmentId, Segment>,
    order: Vec<ControlPointId>,
}

impl TrackGraph {
    /// Creates a new, empty track graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Control points ---

    /// Allocates a pending control point. It joins the graph when the first
    /// segment is attached to it.
    pub fn insert_control_point(&mut self, position: Point2) -> ControlPointId {
        self.points.insert(ControlPointData::new(position))
    }

    /// Frees a pending control point. Live points are left alone.
    ///
    /// Returns `true` if the point was pending and has been freed.
    pub fn discard_control_point(&mut self, id: ControlPointId) -> bool {
        if self.exists(id) || !self.points.contains_key(id) {
            return false;
        }
        self.points.remove(id);
        true
    }

    /// Returns whether `id` is a live control point of the graph.
    #[must_use]
    pub fn exists(&self, id: ControlPointId) -> bool {
        self.order.contains(&id)
    }

    /// Returns the control point data, live or pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID does not resolve.
    pub fn control_point(&self, id: ControlPointId) -> Result<&ControlPointData, GraphError> {
        self.points.get(id).ok_or(GraphError::ControlPointNotFound)
    }

    /// Position of a control point, or `None` if the ID does not resolve.
    #[must_use]
    pub fn position(&self, id: ControlPointId) -> Option<Point2> {
        self.points.get(id).map(|p| p.position)
    }

    /// Moves a control point. Segment geometry is not touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID does not resolve.
    pub fn set_position(&mut self, id: ControlPointId, position: Point2) -> Result<(), GraphError> {
        let point = self
            .points
            .get_mut(id)
            .ok_or(GraphError::ControlPointNotFound)?;
        point.position = position;
        Ok(())
    }

    /// Live control point IDs in store order.
    #[must_use]
    pub fn control_point_ids(&self) -> &[ControlPointId] {
        &self.order
    }

    /// Live control points in store order.
    pub fn control_points(&self) -> impl Iterator<Item = (ControlPointId, &ControlPointData)> {
        self.order
            .iter()
            .filter_map(|&id| self.points.get(id).map(|data| (id, data)))
    }

    /// Number of live control points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns whether the graph has no live control points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Incident segments of a control point. Empty if the ID does not resolve.
    #[must_use]
    pub fn segments_of(&self, id: ControlPointId) -> &[SegmentId] {
        self.points
            .get(id)
            .map(|p| p.segments.as_slice())
            .unwrap_or_default()
    }

    // --- Segments ---

    /// Returns a segment, or an error if it no longer exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID does not resolve.
    pub fn segment(&self, id: SegmentId) -> Result<&Segment, GraphError> {
        self.segments.get(id).ok_or(GraphError::SegmentNotFound)
    }

    /// Mutable lane markings of a line or arc, for property editing.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID does not resolve or the segment is an
    /// intersection.
    pub fn markings_mut(&mut self, id: SegmentId) -> Result<&mut Markings, GraphError> {
        self.segments
            .get_mut(id)
            .ok_or(GraphError::SegmentNotFound)?
            .markings_mut()
            .ok_or_else(|| GraphError::DegenerateSegment("intersections carry no markings".into()))
    }

    /// Unique live segments, in order of first appearance when walking the
    /// control points in store order.
    #[must_use]
    pub fn segments(&self) -> Vec<SegmentId> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for (_, point) in self.control_points() {
            for &id in &point.segments {
                if self.segments.contains_key(id) && seen.insert(id) {
                    result.push(id);
                }
            }
        }
        result
    }

    /// Returns whether `segment` resolves and touches `point`.
    #[must_use]
    pub fn is_incident(&self, point: ControlPointId, segment: SegmentId) -> bool {
        self.segments.get(segment).is_some_and(|s| s.touches(point))
    }

    /// Returns whether a single segment joins `a` and `b`.
    #[must_use]
    pub fn connected(&self, a: ControlPointId, b: ControlPointId) -> bool {
        self.segments_of(a)
            .iter()
            .any(|&id| self.is_incident(b, id))
    }

    /// Adds a straight segment between two control points.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint does not resolve or both are the same.
    pub fn add_line(&mut self, start: ControlPointId, end: ControlPointId) -> Result<SegmentId> {
        Ok(self.attach(Segment::Line(LineSegment {
            start,
            end,
            markings: Markings::default(),
        }))?)
    }

    /// Adds an arc between two control points.
    ///
    /// The radius must be positive; whether it fits the endpoints is not
    /// checked.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is not positive, an endpoint does not
    /// resolve, or both endpoints are the same.
    pub fn add_arc(
        &mut self,
        start: ControlPointId,
        end: ControlPointId,
        center: Point2,
        radius: f64,
        clockwise: bool,
    ) -> Result<SegmentId> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(GeometryError::NonPositiveRadius(radius).into());
        }
        Ok(self.attach(Segment::Arc(ArcSegment {
            start,
            end,
            center,
            radius,
            clockwise,
            markings: Markings::default(),
        }))?)
    }

    /// Adds an intersection hub joining `center` to every link.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no links, a point does not resolve, or a
    /// point is repeated.
    pub fn add_intersection(
        &mut self,
        center: ControlPointId,
        links: &[ControlPointId],
    ) -> Result<SegmentId> {
        if links.is_empty() {
            return Err(GraphError::EmptyIntersection.into());
        }
        Ok(self.attach(Segment::Intersection(IntersectionSegment {
            center,
            links: links.to_vec(),
        }))?)
    }

    /// Gives a line or arc new geometry, keeping its endpoints and markings.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment does not resolve, is an intersection,
    /// or the arc radius is not positive.
    pub fn reshape(&mut self, id: SegmentId, shape: Shape) -> Result<()> {
        let segment = self
            .segments
            .get_mut(id)
            .ok_or(GraphError::SegmentNotFound)?;
        let Some((start, end)) = segment.endpoints() else {
            let reason = "intersections cannot be reshaped".to_owned();
            return Err(GraphError::DegenerateSegment(reason).into());
        };
        let markings = segment.markings().copied().unwrap_or_default();

        *segment = match shape {
            Shape::Straight => Segment::Line(LineSegment {
                start,
                end,
                markings,
            }),
            Shape::Arc {
                center,
                radius,
                clockwise,
            } => {
                if !(radius.is_finite() && radius > 0.0) {
                    return Err(GeometryError::NonPositiveRadius(radius).into());
                }
                Segment::Arc(ArcSegment {
                    start,
                    end,
                    center,
                    radius,
                    clockwise,
                    markings,
                })
            }
        };
        Ok(())
    }

    fn attach(&mut self, segment: Segment) -> Result<SegmentId, GraphError> {
        let members = segment.control_points();
        for (i, id) in members.iter().enumerate() {
            if !self.points.contains_key(*id) {
                return Err(GraphError::ControlPointNotFound);
            }
            if members[..i].contains(id) {
                return Err(GraphError::DegenerateSegment(
                    "a control point appears twice in one segment".into(),
                ));
            }
        }

        let id = self.segments.insert(segment);
        for member in members {
            if let Some(point) = self.points.get_mut(member) {
                point.segments.push(id);
            }
            if !self.order.contains(&member) {
                self.order.push(member);
            }
        }
        debug!(segment = ?id, "segment added");
        Ok(id)
    }

    // --- Removal ---

    /// Removes a control point and tears down its connections.
    ///
    /// Lines and arcs touching the point are deleted. An intersection loses
    /// only the link if the point is a link and other links remain; if the
    /// point is the center, or the last link, the whole intersection goes.
    /// Afterwards every other point touched by a deleted segment that is left
    /// without segments is pruned as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID does not resolve.
    pub fn remove_control_point(&mut self, id: ControlPointId) -> Result<(), GraphError> {
        let incident = self
            .points
            .get(id)
            .ok_or(GraphError::ControlPointNotFound)?
            .segments
            .clone();

        let mut touched = Vec::new();
        for seg_id in incident {
            let Some(segment) = self.segments.get_mut(seg_id) else {
                continue;
            };
            if let Segment::Intersection(hub) = &mut *segment {
                if hub.center != id && hub.links.len() > 1 {
                    hub.links.retain(|&link| link != id);
                    continue;
                }
            }
            let members = segment.control_points();
            self.detach(seg_id, &members);
            touched.extend(members.into_iter().filter(|&m| m != id));
        }

        self.drop_point(id);
        self.prune(&touched);
        debug!(point = ?id, "control point removed");
        Ok(())
    }

    /// Deletes a segment and strips it from the incidence lists of `members`.
    fn detach(&mut self, seg_id: SegmentId, members: &[ControlPointId]) {
        self.segments.remove(seg_id);
        for &member in members {
            if let Some(point) = self.points.get_mut(member) {
                point.segments.retain(|&s| s != seg_id);
            }
        }
    }

    fn drop_point(&mut self, id: ControlPointId) {
        self.points.remove(id);
        self.order.retain(|&p| p != id);
    }

    /// Drops every point in `candidates` that has no segments left.
    fn prune(&mut self, candidates: &[ControlPointId]) {
        for &id in candidates {
            if self.points.get(id).is_some_and(|p| p.segments.is_empty()) {
                debug!(point = ?id, "pruned orphaned control point");
                self.drop_point(id);
            }
        }
    }

    // --- Merge ---

    /// Rewires every segment of `from` onto `into`, then removes `from`.
    ///
    /// A line or arc is discarded when its rewired form would join `into` to
    /// itself, or to a point `into` already shares a segment with. That
    /// includes a spoke or center of an intersection `into` belongs to, and
    /// once intersections are rewired, a line or arc of `into` running along
    /// one of their spokes is discarded too. An intersection that already contains `into` drops the
    /// duplicate link instead of being discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if either ID does not resolve.
    pub fn merge_control_points(
        &mut self,
        from: ControlPointId,
        into: ControlPointId,
    ) -> Result<(), GraphError> {
        if !self.points.contains_key(into) {
            return Err(GraphError::ControlPointNotFound);
        }
        let incident = self
            .points
            .get(from)
            .ok_or(GraphError::ControlPointNotFound)?
            .segments
            .clone();
        if from == into {
            return Ok(());
        }

        let mut touched = vec![into];
        for seg_id in incident {
            let Some(segment) = self.segments.get(seg_id) else {
                continue;
            };

            let keep = match segment {
                Segment::Line(_) | Segment::Arc(_) => segment
                    .other_endpoint(from)
                    .is_some_and(|other| other != into && !self.connected(into, other)),
                Segment::Intersection(_) => true,
            };

            if !keep {
                let members = segment.control_points();
                self.detach(seg_id, &members);
                touched.extend(members.into_iter().filter(|&m| m != from));
                continue;
            }

            let Some(segment) = self.segments.get_mut(seg_id) else {
                continue;
            };
            let mut emptied = false;
            let mut already_listed = false;
            if let Segment::Intersection(hub) = &mut *segment {
                if hub.center == into || hub.links.contains(&into) {
                    already_listed = true;
                    if hub.center == from {
                        hub.links.retain(|&link| link != into);
                        hub.center = into;
                    } else {
                        hub.links.retain(|&link| link != from);
                    }
                    emptied = hub.links.is_empty();
                }
            }
            if !already_listed {
                segment.replace_control_point(from, into);
                if let Some(point) = self.points.get_mut(into) {
                    point.segments.push(seg_id);
                }
            }
            if emptied {
                let members = vec![into, from];
                self.detach(seg_id, &members);
            }
        }

        // A rewired intersection can put `into` on a spoke it already had a
        // line or arc along.
        for seg_id in self.edges_beside_spokes(into) {
            if let Some(segment) = self.segments.get(seg_id) {
                let members = segment.control_points();
                self.detach(seg_id, &members);
                touched.extend(members);
            }
        }

        self.drop_point(from);
        if !self.segments_of(into).is_empty() && !self.exists(into) {
            self.order.push(into);
        }
        self.prune(&touched);
        debug!(from = ?from, into = ?into, "control points merged");
        Ok(())
    }

    fn edges_beside_spokes(&self, id: ControlPointId) -> Vec<SegmentId> {
        self.segments_of(id)
            .iter()
            .copied()
            .filter(|&seg_id| {
                let other = self.segments.get(seg_id).and_then(|s| s.other_endpoint(id));
                other.is_some_and(|other| self.shares_intersection(id, other))
            })
            .collect()
    }

    fn shares_intersection(&self, a: ControlPointId, b: ControlPointId) -> bool {
        self.segments_of(a)
            .iter()
            .filter(|&&id| matches!(self.segments.get(id), Some(Segment::Intersection(_))))
            .any(|&id| self.is_incident(b, id))
    }

    // --- Queries ---

    /// Candidate tangent directions for continuing from `id`.
    ///
    /// These are the outward directions of the point's segments, as unit
    /// vectors. A point with no usable direction gets the eight compass
    /// directions instead.
    #[must_use]
    pub fn align_directions(&self, id: ControlPointId) -> Vec<Vector2> {
        let directions: Vec<Vector2> = self
            .segments_of(id)
            .iter()
            .filter_map(|&seg| self.segments.get(seg)?.direction_at(self, id))
            .filter_map(|dir| try_normalize(&dir))
            .collect();

        if directions.is_empty() {
            compass_directions()
        } else {
            directions
        }
    }

    /// Checks the consistency invariants of the graph.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::InvariantViolated` describing the first broken
    /// invariant found.
    pub fn validate(&self) -> Result<(), GraphError> {
        let violated = |msg: &str| Err(GraphError::InvariantViolated(msg.to_owned()));

        let mut seen_points = HashSet::new();
        for &id in &self.order {
            if !seen_points.insert(id) {
                return violated("control point listed twice in the store");
            }
            let Some(point) = self.points.get(id) else {
                return violated("store lists a control point that does not resolve");
            };
            if point.segments.is_empty() {
                return violated("live control point without segments");
            }
            let mut seen_segments = HashSet::new();
            for &seg_id in &point.segments {
                if !seen_segments.insert(seg_id) {
                    return violated("segment listed twice on one control point");
                }
                match self.segments.get(seg_id) {
                    Some(segment) if segment.touches(id) => {}
                    Some(_) => return violated("control point lists a segment not touching it"),
                    None => return violated("control point lists a missing segment"),
                }
            }
        }

        for (seg_id, segment) in &self.segments {
            for member in segment.control_points() {
                if !self.exists(member) {
                    return violated("segment endpoint is not a live control point");
                }
                if !self.segments_of(member).contains(&seg_id) {
                    return violated("segment endpoint does not list the segment");
                }
            }
        }

        Ok(())
    }

    /// Reorders the live control points by `key` (stable).
    pub(crate) fn sort_control_points_by_key<K: Ord>(
        &mut self,
        key: impl FnMut(&ControlPointId) -> K,
    ) {
        self.order.sort_by_key(key);
    }
}

use tracing::debug;

use crate::graph::{ControlPointId, Shape, TrackGraph};
use crate::math::align::snap_to_direction;
use crate::math::{fit_arc, within_extent, Point2, Vector2, TOLERANCE};

use super::{dangling, reject, EditOutcome, Editor, Gesture, RejectReason, TrackMode};

/// Unit offsets of the four spokes of a new intersection hub.
const HUB_SPOKES: [(f64, f64); 4] = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];

/// Where a committed segment ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EndPoint {
    Existing(ControlPointId),
    New(Point2),
}

/// The segment a commit would create.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal {
    pub start: Point2,
    pub end: Point2,
    pub end_point: EndPoint,
    pub shape: Shape,
}

impl Editor {
    /// Opens a build at `p`.
    ///
    /// In intersection mode this places a whole hub instead. Otherwise a
    /// control point under the cursor becomes active, or a new pending point
    /// is placed at `p`. A build that is already open is replaced.
    pub fn begin(&mut self, graph: &mut TrackGraph, p: Point2) -> EditOutcome {
        if matches!(self.gesture, Gesture::Dragging(_)) {
            return reject(RejectReason::GestureInProgress);
        }
        if self.mode == TrackMode::Intersection {
            return self.build_hub(graph, p);
        }

        let snapped = self.pick(graph, &p, &[]);
        if snapped.is_none() && !within_extent(&p, self.config.ground_half_extent) {
            return reject(RejectReason::OutOfBounds);
        }
        if snapped != self.active {
            self.release_active(graph);
        }

        let active = snapped.unwrap_or_else(|| graph.insert_control_point(p));
        self.active = Some(active);
        self.cursor = p;
        self.gesture = Gesture::Building;
        EditOutcome::Applied
    }

    /// Extends the open build towards `q` and makes the end point active.
    pub fn commit(&mut self, graph: &mut TrackGraph, q: Point2) -> EditOutcome {
        match self.gesture {
            Gesture::Dragging(_) => return reject(RejectReason::GestureInProgress),
            Gesture::Idle => return reject(RejectReason::NothingActive),
            Gesture::Building => {}
        }
        let Some(active) = self.active else {
            return reject(RejectReason::NothingActive);
        };
        self.cursor = q;

        let proposal = match self.plan(graph, active, q) {
            Ok(proposal) => proposal,
            Err(reason) => return reject(reason),
        };

        let end = match proposal.end_point {
            EndPoint::Existing(id) => id,
            EndPoint::New(position) => graph.insert_control_point(position),
        };
        let added = match proposal.shape {
            Shape::Straight => graph.add_line(active, end),
            Shape::Arc {
                center,
                radius,
                clockwise,
            } => graph.add_arc(active, end, center, radius, clockwise),
        };
        if let Err(err) = added {
            if matches!(proposal.end_point, EndPoint::New(_)) {
                graph.discard_control_point(end);
            }
            return dangling(err);
        }

        debug!(start = ?active, end = ?end, shape = ?proposal.shape, "segment committed");
        self.active = Some(end);
        EditOutcome::Applied
    }

    /// What a commit at the current cursor would create, if anything.
    #[must_use]
    pub fn proposal(&self, graph: &TrackGraph) -> Option<Proposal> {
        if !matches!(self.gesture, Gesture::Building) {
            return None;
        }
        self.plan(graph, self.active?, self.cursor).ok()
    }

    /// Places a center with four spokes at `track_width` around `p`.
    ///
    /// The hub is made of new points only. Afterwards the session is idle
    /// with the center selected.
    fn build_hub(&mut self, graph: &mut TrackGraph, p: Point2) -> EditOutcome {
        let offset = self.config.track_width;
        let extent = self.config.ground_half_extent;
        let spokes: Vec<Point2> = HUB_SPOKES
            .iter()
            .map(|&(x, y)| p + Vector2::new(x, y) * offset)
            .collect();
        if !within_extent(&p, extent) || spokes.iter().any(|s| !within_extent(s, extent)) {
            return reject(RejectReason::OutOfBounds);
        }

        self.release_active(graph);
        let center = graph.insert_control_point(p);
        let links: Vec<ControlPointId> = spokes
            .into_iter()
            .map(|s| graph.insert_control_point(s))
            .collect();
        if let Err(err) = graph.add_intersection(center, &links) {
            for &id in std::iter::once(&center).chain(&links) {
                graph.discard_control_point(id);
            }
            return dangling(err);
        }

        debug!(center = ?center, spokes = links.len(), "intersection hub created");
        self.active = Some(center);
        self.cursor = p;
        self.gesture = Gesture::Idle;
        EditOutcome::Applied
    }

    /// Resolves the end point and shape of a commit from `active` towards
    /// `q`, without touching the graph.
    fn plan(
        &self,
        graph: &TrackGraph,
        active: ControlPointId,
        q: Point2,
    ) -> Result<Proposal, RejectReason> {
        let start = graph
            .position(active)
            .ok_or(RejectReason::DanglingReference)?;
        let target = self.pick(graph, &q, &[]);
        if target == Some(active) {
            return Err(RejectReason::SelfConnection);
        }

        let mode = self.effective_mode(graph);
        let candidates = graph.align_directions(active);

        let end = if self.auto_align {
            match mode {
                TrackMode::Line => start + snap_to_direction(&candidates, &(q - start)),
                TrackMode::Arc | TrackMode::Intersection => q,
            }
        } else {
            target.and_then(|id| graph.position(id)).unwrap_or(q)
        };
        if !within_extent(&end, self.config.ground_half_extent) {
            return Err(RejectReason::OutOfBounds);
        }

        let end_point = match target {
            Some(id) if !self.auto_align => {
                if graph.connected(active, id) {
                    return Err(RejectReason::DuplicateEdge);
                }
                EndPoint::Existing(id)
            }
            _ => {
                if (end - start).norm() < TOLERANCE {
                    return Err(RejectReason::SelfConnection);
                }
                EndPoint::New(end)
            }
        };

        let shape = match mode {
            TrackMode::Arc => {
                fit_arc(&start, &end, &candidates).map_or(Shape::Straight, Shape::from)
            }
            TrackMode::Line | TrackMode::Intersection => Shape::Straight,
        };

        Ok(Proposal {
            start,
            end,
            end_point,
            shape,
        })
    }
}

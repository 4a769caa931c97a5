use tracing::{debug, trace};

use crate::error::Result;
use crate::graph::{ArcSegment, ControlPointId, Segment, SegmentId, Shape, TrackGraph};
use crate::math::arc_2d::{rotate, signed_angle, sweep_tangent};
use crate::math::{fit_arc, within_extent, ArcFit, Point2};

use super::{dangling, nearest, reject, EditOutcome, Editor, Gesture, RejectReason};

/// Re-fitted geometry of a line or arc touching a dragged point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TentativeSegment {
    pub segment: SegmentId,
    pub start: Point2,
    pub end: Point2,
    pub shape: Shape,
}

/// What releasing the current drag would commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragPreview {
    /// Proposed position of every moved control point.
    pub positions: Vec<(ControlPointId, Point2)>,
    pub segments: Vec<TentativeSegment>,
    /// Control point the dragged point would be merged into.
    pub merge_target: Option<ControlPointId>,
}

/// Working set of a drag gesture.
#[derive(Debug, Clone)]
pub(super) struct DragSession {
    anchor: ControlPointId,
    grab: Point2,
    /// Moved points with their positions at press time, anchor first.
    origins: Vec<(ControlPointId, Point2)>,
    preview: DragPreview,
}

impl DragSession {
    /// Starts a drag of `anchor`. An intersection center takes its spokes
    /// along.
    fn new(graph: &TrackGraph, anchor: ControlPointId, grab: Point2) -> Option<Self> {
        let mut origins = vec![(anchor, graph.position(anchor)?)];
        for &seg_id in graph.segments_of(anchor) {
            let Ok(Segment::Intersection(hub)) = graph.segment(seg_id) else {
                continue;
            };
            if hub.center != anchor {
                continue;
            }
            for &link in &hub.links {
                if origins.iter().any(|&(id, _)| id == link) {
                    continue;
                }
                if let Some(position) = graph.position(link) {
                    origins.push((link, position));
                }
            }
        }

        Some(Self {
            anchor,
            grab,
            origins,
            preview: DragPreview::default(),
        })
    }

    /// Moves the working set with the cursor and recomputes the preview.
    ///
    /// A control point under the cursor that is not being moved becomes the
    /// merge target, and the working set snaps onto it.
    pub(super) fn update(&mut self, graph: &TrackGraph, pick_radius: f64, cursor: Point2) {
        let Some(&(_, anchor_origin)) = self.origins.first() else {
            return;
        };

        let candidates = graph
            .control_points()
            .filter(|(id, _)| !self.origins.iter().any(|(moved, _)| moved == id))
            .map(|(id, data)| (id, data.position));
        let merge_target = nearest(candidates, &cursor, pick_radius);

        let delta = match merge_target.and_then(|id| graph.position(id)) {
            Some(target) => target - anchor_origin,
            None => cursor - self.grab,
        };
        let positions: Vec<(ControlPointId, Point2)> = self
            .origins
            .iter()
            .map(|&(id, origin)| (id, origin + delta))
            .collect();
        let segments = tentative_segments(graph, &positions);

        self.preview = DragPreview {
            positions,
            segments,
            merge_target,
        };
    }

    /// Writes the preview into `graph` and returns the point that ends up
    /// selected.
    fn apply(&self, graph: &mut TrackGraph) -> Result<Option<ControlPointId>> {
        for &(id, position) in &self.preview.positions {
            graph.set_position(id, position)?;
        }
        for tentative in &self.preview.segments {
            graph.reshape(tentative.segment, tentative.shape)?;
        }

        let Some(target) = self.preview.merge_target else {
            return Ok(Some(self.anchor));
        };
        graph.merge_control_points(self.anchor, target)?;
        Ok(Some(target).filter(|&id| graph.exists(id)))
    }
}

impl Editor {
    /// Starts dragging the control point under `p`.
    ///
    /// Only live points can be dragged, and not while a build is open.
    pub fn press(&mut self, graph: &TrackGraph, p: Point2) -> EditOutcome {
        if !matches!(self.gesture, Gesture::Idle) {
            return reject(RejectReason::GestureInProgress);
        }
        let live = graph
            .control_points()
            .map(|(id, point)| (id, point.position));
        let Some(anchor) = nearest(live, &p, self.config.pick_radius) else {
            return reject(RejectReason::NothingToDrag);
        };
        let Some(mut session) = DragSession::new(graph, anchor, p) else {
            return dangling("pressed control point no longer resolves");
        };

        session.update(graph, self.config.pick_radius, p);
        trace!(point = ?anchor, moved = session.origins.len(), "drag started");
        self.cursor = p;
        self.gesture = Gesture::Dragging(session);
        EditOutcome::Applied
    }

    /// Ends the drag, committing the tentative geometry.
    ///
    /// Nothing changes if any moved point would leave the editable area. On
    /// success the merge target, or else the dragged point, becomes active.
    pub fn release(&mut self, graph: &mut TrackGraph) -> EditOutcome {
        if !matches!(self.gesture, Gesture::Dragging(_)) {
            return reject(RejectReason::NotDragging);
        }
        let Gesture::Dragging(session) = std::mem::take(&mut self.gesture) else {
            return reject(RejectReason::NotDragging);
        };

        let extent = self.config.ground_half_extent;
        if session
            .preview
            .positions
            .iter()
            .any(|(_, p)| !within_extent(p, extent))
        {
            return reject(RejectReason::OutOfBounds);
        }

        let mut next = graph.clone();
        match session.apply(&mut next) {
            Ok(selected) => {
                *graph = next;
                debug!(
                    point = ?session.anchor,
                    merged_into = ?session.preview.merge_target,
                    "drag committed"
                );
                self.active = selected;
                EditOutcome::Applied
            }
            Err(err) => dangling(err),
        }
    }

    /// Preview of the drag in progress.
    #[must_use]
    pub fn tentative(&self) -> Option<&DragPreview> {
        match &self.gesture {
            Gesture::Dragging(session) => Some(&session.preview),
            Gesture::Idle | Gesture::Building => None,
        }
    }
}

/// Re-fits every line and arc touching a moved point, each once.
fn tentative_segments(
    graph: &TrackGraph,
    positions: &[(ControlPointId, Point2)],
) -> Vec<TentativeSegment> {
    let proposed = |id: ControlPointId| {
        positions
            .iter()
            .find(|&&(moved, _)| moved == id)
            .map(|&(_, p)| p)
    };

    let mut seen = Vec::new();
    let mut out = Vec::new();
    for &(id, _) in positions {
        for &seg_id in graph.segments_of(id) {
            if seen.contains(&seg_id) {
                continue;
            }
            seen.push(seg_id);

            let Ok(segment) = graph.segment(seg_id) else {
                continue;
            };
            let Some((start_id, end_id)) = segment.endpoints() else {
                continue;
            };
            let (Some(old_start), Some(old_end)) =
                (graph.position(start_id), graph.position(end_id))
            else {
                continue;
            };
            let new_start = proposed(start_id);
            let new_end = proposed(end_id);

            let shape = match segment {
                Segment::Arc(arc) => refit_arc(arc, (old_start, new_start), (old_end, new_end)),
                Segment::Line(_) | Segment::Intersection(_) => Shape::Straight,
            };
            out.push(TentativeSegment {
                segment: seg_id,
                start: new_start.unwrap_or(old_start),
                end: new_end.unwrap_or(old_end),
                shape,
            });
        }
    }
    out
}

/// New shape of an arc whose endpoints move from `old` to `Some(new)`.
///
/// With one end moving, the other end keeps its tangent. With both moving,
/// the start tangent turns with the chord.
fn refit_arc(
    arc: &ArcSegment,
    (old_start, new_start): (Point2, Option<Point2>),
    (old_end, new_end): (Point2, Option<Point2>),
) -> Shape {
    let fit = match (new_start, new_end) {
        (Some(start), Some(end)) => {
            let tangent = sweep_tangent(&arc.center, &old_start, arc.clockwise);
            let turn = signed_angle(&(old_end - old_start), &(end - start));
            fit_arc(&start, &end, &[rotate(&tangent, turn)])
        }
        (Some(start), None) => {
            // Fit backwards from the fixed end, then flip to keep start -> end.
            let back = -sweep_tangent(&arc.center, &old_end, arc.clockwise);
            fit_arc(&old_end, &start, &[back]).map(|fit| ArcFit {
                clockwise: !fit.clockwise,
                ..fit
            })
        }
        (None, Some(end)) => {
            let tangent = sweep_tangent(&arc.center, &old_start, arc.clockwise);
            fit_arc(&old_start, &end, &[tangent])
        }
        (None, None) => {
            return Shape::Arc {
                center: arc.center,
                radius: arc.radius,
                clockwise: arc.clockwise,
            }
        }
    };
    fit.map_or(Shape::Straight, Shape::from)
}

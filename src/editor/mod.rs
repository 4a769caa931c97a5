//! Interactive topology editor.
//!
//! [`Editor`] turns ground-plane cursor positions and discrete input events
//! into graph mutations. The session it keeps (active point, mode, drag
//! working set) lives only as long as the editor and never touches the graph
//! until a gesture commits.
mod build;
mod drag;

pub use build::{EndPoint, Proposal};
pub use drag::{DragPreview, TentativeSegment};

use std::fmt::Display;

use tracing::{debug, trace, warn};

use crate::config::EditorConfig;
use crate::graph::{ControlPointId, TrackGraph};
use crate::math::Point2;

use drag::DragSession;

/// What a build gesture creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackMode {
    #[default]
    Line,
    Arc,
    Intersection,
}

/// Coarse state of the editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// An active point is open and the next commit extends it.
    Building,
    /// A committed control point is being relocated.
    Dragging,
}

/// Why an editor operation left everything unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The resulting position lies outside the editable area.
    OutOfBounds,
    /// The target is the active point itself.
    SelfConnection,
    /// The target is already joined to the active point.
    DuplicateEdge,
    /// Another gesture is in progress.
    GestureInProgress,
    /// The operation needs an active point and there is none.
    NothingActive,
    /// Nothing draggable under the cursor.
    NothingToDrag,
    /// Release without a drag in progress.
    NotDragging,
    /// A handle held by the session no longer resolves.
    DanglingReference,
}

/// Result of an editor operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    Rejected(RejectReason),
}

impl EditOutcome {
    #[must_use]
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// Discrete input events, as delivered by an input layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorEvent {
    Begin(Point2),
    Commit(Point2),
    Cancel,
    Press(Point2),
    PointerMoved(Point2),
    Release,
    DeleteActive,
    SetMode(TrackMode),
    SetAutoAlign(bool),
}

#[derive(Debug, Clone, Default)]
enum Gesture {
    #[default]
    Idle,
    Building,
    Dragging(DragSession),
}

/// Editing session over a [`TrackGraph`].
///
/// The graph is passed into every call rather than owned, so a host can keep
/// it next to its renderers. Every operation either applies in full or
/// returns [`EditOutcome::Rejected`] and changes nothing.
#[derive(Debug, Clone)]
pub struct Editor {
    config: EditorConfig,
    mode: TrackMode,
    auto_align: bool,
    /// Open or selected control point. May be pending (not yet in the graph).
    active: Option<ControlPointId>,
    cursor: Point2,
    gesture: Gesture,
}

impl Editor {
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            mode: TrackMode::default(),
            auto_align: false,
            active: None,
            cursor: Point2::origin(),
            gesture: Gesture::Idle,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn mode(&self) -> TrackMode {
        self.mode
    }

    #[must_use]
    pub fn auto_align(&self) -> bool {
        self.auto_align
    }

    #[must_use]
    pub fn active(&self) -> Option<ControlPointId> {
        self.active
    }

    /// Last cursor position seen by the editor.
    #[must_use]
    pub fn cursor(&self) -> Point2 {
        self.cursor
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        match self.gesture {
            Gesture::Idle => SessionState::Idle,
            Gesture::Building => SessionState::Building,
            Gesture::Dragging(_) => SessionState::Dragging,
        }
    }

    /// Mode actually used for the next commit. Arc mode only yields arcs
    /// once the active point has a segment to be tangent to.
    #[must_use]
    pub fn effective_mode(&self, graph: &TrackGraph) -> TrackMode {
        match self.mode {
            TrackMode::Arc if !self.active_connected(graph) => TrackMode::Line,
            mode => mode,
        }
    }

    /// Dispatches one input event.
    pub fn handle(&mut self, graph: &mut TrackGraph, event: EditorEvent) -> EditOutcome {
        match event {
            EditorEvent::Begin(p) => self.begin(graph, p),
            EditorEvent::Commit(p) => self.commit(graph, p),
            EditorEvent::Cancel => self.cancel(graph),
            EditorEvent::Press(p) => self.press(graph, p),
            EditorEvent::PointerMoved(p) => self.pointer_moved(graph, p),
            EditorEvent::Release => self.release(graph),
            EditorEvent::DeleteActive => self.delete_active(graph),
            EditorEvent::SetMode(mode) => {
                self.set_mode(mode);
                EditOutcome::Applied
            }
            EditorEvent::SetAutoAlign(on) => {
                self.set_auto_align(on);
                EditOutcome::Applied
            }
        }
    }

    pub fn set_mode(&mut self, mode: TrackMode) {
        self.mode = mode;
    }

    pub fn set_auto_align(&mut self, on: bool) {
        self.auto_align = on;
    }

    /// Records the cursor and, while dragging, recomputes the tentative
    /// geometry.
    pub fn pointer_moved(&mut self, graph: &TrackGraph, p: Point2) -> EditOutcome {
        self.cursor = p;
        if let Gesture::Dragging(session) = &mut self.gesture {
            session.update(graph, self.config.pick_radius, p);
        }
        EditOutcome::Applied
    }

    /// Ends the current gesture without changing the graph.
    ///
    /// An open build loses its active point; if that point never got a
    /// segment it is freed. A drag is abandoned.
    pub fn cancel(&mut self, graph: &mut TrackGraph) -> EditOutcome {
        match std::mem::take(&mut self.gesture) {
            Gesture::Dragging(_) => trace!("drag cancelled"),
            Gesture::Building | Gesture::Idle => self.release_active(graph),
        }
        EditOutcome::Applied
    }

    /// Deletes the active point with the graph's cascading cleanup.
    pub fn delete_active(&mut self, graph: &mut TrackGraph) -> EditOutcome {
        if matches!(self.gesture, Gesture::Dragging(_)) {
            return reject(RejectReason::GestureInProgress);
        }
        let Some(active) = self.active else {
            return reject(RejectReason::NothingActive);
        };

        if graph.exists(active) {
            if let Err(err) = graph.remove_control_point(active) {
                return dangling(err);
            }
        } else if !graph.discard_control_point(active) {
            self.active = None;
            self.gesture = Gesture::Idle;
            return dangling("active control point no longer resolves");
        }

        debug!(point = ?active, "active control point deleted");
        self.active = None;
        self.gesture = Gesture::Idle;
        EditOutcome::Applied
    }

    /// Closest control point strictly within the pick radius of `p`.
    ///
    /// Live points are checked in store order, then a pending active point.
    /// Points in `exclude` are never picked.
    fn pick(
        &self,
        graph: &TrackGraph,
        p: &Point2,
        exclude: &[ControlPointId],
    ) -> Option<ControlPointId> {
        let pending = self.active.filter(|&id| !graph.exists(id));
        let candidates = graph
            .control_points()
            .map(|(id, data)| (id, data.position))
            .chain(pending.and_then(|id| Some((id, graph.position(id)?))))
            .filter(|(id, _)| !exclude.contains(id));
        nearest(candidates, p, self.config.pick_radius)
    }

    fn active_connected(&self, graph: &TrackGraph) -> bool {
        self.active
            .is_some_and(|id| !graph.segments_of(id).is_empty())
    }

    /// Drops the active point, freeing it if it is still pending.
    fn release_active(&mut self, graph: &mut TrackGraph) {
        if let Some(active) = self.active.take() {
            if graph.discard_control_point(active) {
                trace!(point = ?active, "pending control point discarded");
            }
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

/// The first candidate closest to `p`, if strictly within `radius`.
fn nearest(
    candidates: impl Iterator<Item = (ControlPointId, Point2)>,
    p: &Point2,
    radius: f64,
) -> Option<ControlPointId> {
    let mut best = None;
    let mut closest = radius;
    for (id, position) in candidates {
        let distance = (position - *p).norm();
        if distance < closest {
            best = Some(id);
            closest = distance;
        }
    }
    best
}

fn reject(reason: RejectReason) -> EditOutcome {
    trace!(?reason, "edit rejected");
    EditOutcome::Rejected(reason)
}

fn dangling(err: impl Display) -> EditOutcome {
    warn!(%err, "edit hit a dangling reference");
    EditOutcome::Rejected(RejectReason::DanglingReference)
}

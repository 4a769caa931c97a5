use crate::math::Point2;

use super::segment::SegmentId;

slotmap::new_key_type! {
    /// Unique identifier for a control point in the track graph.
    pub struct ControlPointId;
}

/// Data associated with a control point.
#[derive(Debug, Clone)]
pub struct ControlPointData {
    /// Position on the ground plane.
    pub position: Point2,
    pub(crate) segments: Vec<SegmentId>,
}

impl ControlPointData {
    /// Creates a control point with no incident segments.
    #[must_use]
    pub fn new(position: Point2) -> Self {
        Self {
            position,
            segments: Vec::new(),
        }
    }

    /// Incident segments, in the order they were attached.
    #[must_use]
    pub fn segments(&self) -> &[SegmentId] {
        &self.segments
    }
}

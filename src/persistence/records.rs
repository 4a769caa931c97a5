use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PersistenceError;
use crate::graph::{LaneMarking, Markings};
use crate::math::Point2;

/// A stored control point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPointRecord {
    pub coords: [f64; 2],
}

/// A stored segment, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TrackRecord {
    Line(LineRecord),
    Arc(ArcRecord),
    Intersection(IntersectionRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRecord {
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_line: Option<String>,
    #[serde(default)]
    pub left_line_missing: bool,
    #[serde(default)]
    pub right_line_missing: bool,
}

impl LineRecord {
    pub(super) fn new(start: usize, end: usize, markings: Markings) -> Self {
        Self {
            start,
            end,
            center_line: Some(markings.center_line.as_str().to_owned()),
            left_line_missing: markings.left_line_missing,
            right_line_missing: markings.right_line_missing,
        }
    }

    pub(super) fn markings(&self) -> Markings {
        parse_markings(
            self.center_line.as_deref(),
            self.left_line_missing,
            self.right_line_missing,
        )
    }
}

/// A stored arc. `right_arc` is the handedness flag, true when the polar
/// angle increases from start to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArcRecord {
    pub start: usize,
    pub end: usize,
    pub center: [f64; 2],
    pub radius: f64,
    pub right_arc: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_line: Option<String>,
    #[serde(default)]
    pub left_line_missing: bool,
    #[serde(default)]
    pub right_line_missing: bool,
}

impl ArcRecord {
    pub(super) fn new(
        start: usize,
        end: usize,
        center: Point2,
        radius: f64,
        clockwise: bool,
        markings: Markings,
    ) -> Self {
        Self {
            start,
            end,
            center: [center.x, center.y],
            radius,
            right_arc: clockwise,
            center_line: Some(markings.center_line.as_str().to_owned()),
            left_line_missing: markings.left_line_missing,
            right_line_missing: markings.right_line_missing,
        }
    }

    pub(super) fn markings(&self) -> Markings {
        parse_markings(
            self.center_line.as_deref(),
            self.left_line_missing,
            self.right_line_missing,
        )
    }
}

/// A stored intersection.
///
/// Current documents carry `links`. Older ones carry exactly four links as
/// `link1`..`link4`; those are read but never written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionRecord {
    pub center: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link1: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link2: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link3: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link4: Option<usize>,
}

impl IntersectionRecord {
    pub(super) fn new(center: usize, links: Vec<usize>) -> Self {
        Self {
            center,
            links: Some(links),
            link1: None,
            link2: None,
            link3: None,
            link4: None,
        }
    }

    /// Link indices, from `links` or else the legacy fields.
    pub(super) fn link_indices(&self) -> Result<Vec<usize>, PersistenceError> {
        if let Some(links) = &self.links {
            return Ok(links.clone());
        }
        match (self.link1, self.link2, self.link3, self.link4) {
            (Some(a), Some(b), Some(c), Some(d)) => Ok(vec![a, b, c, d]),
            _ => Err(PersistenceError::MissingIntersectionLinks),
        }
    }
}

fn parse_markings(center_line: Option<&str>, left: bool, right: bool) -> Markings {
    let center_line = match center_line {
        None => LaneMarking::default(),
        Some(name) => LaneMarking::from_name(name).unwrap_or_else(|| {
            warn!(name, "unknown center line marking, using Dashed");
            LaneMarking::default()
        }),
    };
    Markings {
        center_line,
        left_line_missing: left,
        right_line_missing: right,
    }
}

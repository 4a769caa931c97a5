//! Serializable shape of the track graph.
//!
//! Control points are stored as an ordered array, and segments refer to them
//! by index into that array. Reading and writing files is left to the host.
mod records;

pub use records::{ArcRecord, ControlPointRecord, IntersectionRecord, LineRecord, TrackRecord};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::TrackSettings;
use crate::error::{GraphError, PersistenceError, Result};
use crate::graph::{ControlPointId, Segment, TrackGraph};
use crate::math::Point2;

/// A stored track: dimensions, control points and segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDocument {
    #[serde(flatten)]
    pub settings: TrackSettings,
    #[serde(default)]
    pub control_points: Vec<ControlPointRecord>,
    #[serde(default)]
    pub tracks: Vec<TrackRecord>,
}

impl TrackDocument {
    /// Captures the live graph. Control points keep store order and segments
    /// follow [`TrackGraph::segments`].
    ///
    /// # Errors
    ///
    /// Returns an error if a segment refers to a control point that is not
    /// live.
    pub fn from_graph(graph: &TrackGraph, settings: TrackSettings) -> Result<Self> {
        let index: HashMap<ControlPointId, usize> = graph
            .control_point_ids()
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();
        let lookup = |id: ControlPointId| {
            index
                .get(&id)
                .copied()
                .ok_or(GraphError::ControlPointNotFound)
        };

        let control_points = graph
            .control_points()
            .map(|(_, p)| ControlPointRecord {
                coords: [p.position.x, p.position.y],
            })
            .collect();

        let mut tracks = Vec::new();
        for seg_id in graph.segments() {
            let record = match graph.segment(seg_id)? {
                Segment::Line(line) => TrackRecord::Line(LineRecord::new(
                    lookup(line.start)?,
                    lookup(line.end)?,
                    line.markings,
                )),
                Segment::Arc(arc) => TrackRecord::Arc(ArcRecord::new(
                    lookup(arc.start)?,
                    lookup(arc.end)?,
                    arc.center,
                    arc.radius,
                    arc.clockwise,
                    arc.markings,
                )),
                Segment::Intersection(hub) => {
                    let links = hub
                        .links
                        .iter()
                        .map(|&link| lookup(link))
                        .collect::<Result<Vec<_>, _>>()?;
                    TrackRecord::Intersection(IntersectionRecord::new(lookup(hub.center)?, links))
                }
            };
            tracks.push(record);
        }

        Ok(Self {
            settings,
            control_points,
            tracks,
        })
    }

    /// Builds a fresh graph from the document.
    ///
    /// Nothing is returned unless the whole document converts. Control points
    /// keep document order; points no segment refers to are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error on an out-of-range control point index, an
    /// intersection without usable links, or a segment the graph rejects.
    pub fn to_graph(&self) -> Result<TrackGraph> {
        let mut graph = TrackGraph::new();
        let ids: Vec<ControlPointId> = self
            .control_points
            .iter()
            .map(|cp| graph.insert_control_point(Point2::new(cp.coords[0], cp.coords[1])))
            .collect();
        let lookup = |index: usize| {
            ids.get(index)
                .copied()
                .ok_or(PersistenceError::ControlPointIndex {
                    index,
                    len: ids.len(),
                })
        };

        for track in &self.tracks {
            match track {
                TrackRecord::Line(record) => {
                    let id = graph.add_line(lookup(record.start)?, lookup(record.end)?)?;
                    *graph.markings_mut(id)? = record.markings();
                }
                TrackRecord::Arc(record) => {
                    let id = graph.add_arc(
                        lookup(record.start)?,
                        lookup(record.end)?,
                        Point2::new(record.center[0], record.center[1]),
                        record.radius,
                        record.right_arc,
                    )?;
                    *graph.markings_mut(id)? = record.markings();
                }
                TrackRecord::Intersection(record) => {
                    let links = record
                        .link_indices()?
                        .into_iter()
                        .map(lookup)
                        .collect::<Result<Vec<_>, _>>()?;
                    graph.add_intersection(lookup(record.center)?, &links)?;
                }
            }
        }

        for (index, &id) in ids.iter().enumerate() {
            if graph.discard_control_point(id) {
                warn!(index, "dropping control point not used by any track");
            }
        }

        let rank: HashMap<ControlPointId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        graph.sort_control_points_by_key(|id| rank.get(id).copied().unwrap_or(usize::MAX));
        graph.validate()?;

        Ok(graph)
    }

    /// Encodes the document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).map_err(PersistenceError::from)?)
    }

    /// Decodes a document from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the schema.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json).map_err(PersistenceError::from)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::TrackError;
    use crate::graph::{LaneMarking, Markings};
    use serde_json::json;

    fn load(json: &str) -> Result<TrackGraph> {
        TrackDocument::from_json(json)?.to_graph()
    }

    fn sample_graph() -> TrackGraph {
        let mut graph = TrackGraph::new();
        let a = graph.insert_control_point(Point2::new(-4.0, 0.0));
        let b = graph.insert_control_point(Point2::new(-2.0, 0.0));
        let c = graph.insert_control_point(Point2::new(-2.0, 2.0));
        let line = graph.add_line(a, b).unwrap();
        graph.markings_mut(line).unwrap().center_line = LaneMarking::SolidAndDashed;
        let arc = graph
            .add_arc(b, c, Point2::new(-2.0, 1.0), 1.0, true)
            .unwrap();
        graph.markings_mut(arc).unwrap().right_line_missing = true;

        let center = graph.insert_control_point(Point2::new(3.0, 3.0));
        let links: Vec<_> = [(3.8, 3.0), (3.0, 3.8), (2.2, 3.0), (3.0, 2.2)]
            .iter()
            .map(|&(x, y)| graph.insert_control_point(Point2::new(x, y)))
            .collect();
        graph.add_intersection(center, &links).unwrap();
        graph
    }

    #[test]
    fn round_trip_preserves_structure() {
        let graph = sample_graph();
        let doc = TrackDocument::from_graph(&graph, TrackSettings::default()).unwrap();
        let json = doc.to_json().unwrap();

        let reloaded = load(&json).unwrap();
        reloaded.validate().unwrap();
        assert_eq!(reloaded.len(), graph.len());

        let again = TrackDocument::from_graph(&reloaded, TrackSettings::default()).unwrap();
        assert_eq!(again, doc);

        let kinds: Vec<_> = reloaded
            .segments()
            .into_iter()
            .map(|id| match reloaded.segment(id).unwrap() {
                Segment::Line(l) => format!("line {:?}", l.markings.center_line),
                Segment::Arc(a) => {
                    format!("arc r={} cw={} {:?}", a.radius, a.clockwise, a.markings)
                }
                Segment::Intersection(h) => format!("intersection {}", h.links.len()),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                "line SolidAndDashed".to_owned(),
                format!(
                    "arc r=1 cw=true {:?}",
                    Markings {
                        right_line_missing: true,
                        ..Default::default()
                    }
                ),
                "intersection 4".to_owned(),
            ]
        );

        for ((_, old), (_, new)) in graph.control_points().zip(reloaded.control_points()) {
            assert_eq!(old.position, new.position);
            assert_eq!(old.segments().len(), new.segments().len());
        }
    }

    #[test]
    fn round_trip_keeps_coordinates_bit_exact() {
        let x = 0.1 + 0.2;
        let radius = 1.0 / 3.0;
        let mut graph = TrackGraph::new();
        let a = graph.insert_control_point(Point2::new(-1.999_999_999_999_999_8, 0.4));
        let b = graph.insert_control_point(Point2::new(x, 0.4));
        let c = graph.insert_control_point(Point2::new(x, 0.4 + 2.0 * radius));
        graph.add_line(a, b).unwrap();
        graph
            .add_arc(b, c, Point2::new(x, 0.4 + radius), radius, true)
            .unwrap();

        let doc = TrackDocument::from_graph(&graph, TrackSettings::default()).unwrap();
        let json = doc.to_json().unwrap();
        assert!(json.contains("-1.9999999999999998"));
        let reloaded = load(&json).unwrap();

        for ((_, old), (_, new)) in graph.control_points().zip(reloaded.control_points()) {
            assert_eq!(old.position.x.to_bits(), new.position.x.to_bits());
            assert_eq!(old.position.y.to_bits(), new.position.y.to_bits());
        }
        let arc = reloaded.segments()[1];
        let Segment::Arc(data) = reloaded.segment(arc).unwrap() else {
            panic!("expected arc");
        };
        assert_eq!(data.radius.to_bits(), radius.to_bits());
        assert_eq!(data.center.y.to_bits(), (0.4 + radius).to_bits());
    }

    #[test]
    fn writes_schema_field_names() {
        let doc = TrackDocument::from_graph(&sample_graph(), TrackSettings::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();

        assert_eq!(value["trackWidth"], 0.8);
        assert_eq!(value["controlPoints"][0]["coords"], json!([-4.0, 0.0]));
        assert_eq!(value["tracks"][0]["type"], "line");
        assert_eq!(value["tracks"][0]["centerLine"], "SolidAndDashed");
        assert_eq!(value["tracks"][1]["type"], "arc");
        assert_eq!(value["tracks"][1]["rightArc"], true);
        assert_eq!(value["tracks"][1]["rightLineMissing"], true);
        assert_eq!(value["tracks"][2]["type"], "intersection");
        assert_eq!(value["tracks"][2]["links"], json!([4, 5, 6, 7]));
        assert!(value["tracks"][2].get("link1").is_none());
    }

    #[test]
    fn reads_legacy_intersection_links() {
        let json = r#"{
            "trackWidth": 0.8, "markingWidth": 0.02,
            "centerLineLength": 0.2, "centerLineInterrupt": 0.2,
            "controlPoints": [
                {"coords": [0, 0]}, {"coords": [1, 0]}, {"coords": [0, 1]},
                {"coords": [-1, 0]}, {"coords": [0, -1]}
            ],
            "tracks": [
                {"type": "intersection", "center": 0,
                 "link1": 1, "link2": 2, "link3": 3, "link4": 4}
            ]
        }"#;
        let doc = TrackDocument::from_json(json).unwrap();
        assert_eq!(doc.settings.center_line_gap, 0.02);

        let graph = doc.to_graph().unwrap();
        let ids = graph.control_point_ids().to_vec();
        let hub = graph.segments()[0];
        let Segment::Intersection(data) = graph.segment(hub).unwrap() else {
            panic!("expected intersection");
        };
        assert_eq!(data.center, ids[0]);
        assert_eq!(data.links, ids[1..].to_vec());
    }

    #[test]
    fn incomplete_legacy_intersection_fails() {
        let json = r#"{
            "controlPoints": [{"coords": [0, 0]}, {"coords": [1, 0]}],
            "tracks": [{"type": "intersection", "center": 0, "link1": 1}]
        }"#;
        let err = load(json).unwrap_err();
        assert!(matches!(
            err,
            TrackError::Persistence(PersistenceError::MissingIntersectionLinks)
        ));
    }

    #[test]
    fn out_of_range_index_fails() {
        let json = r#"{
            "controlPoints": [{"coords": [0, 0]}],
            "tracks": [{"type": "line", "start": 0, "end": 3}]
        }"#;
        let err = load(json).unwrap_err();
        assert!(matches!(
            err,
            TrackError::Persistence(PersistenceError::ControlPointIndex { index: 3, len: 1 })
        ));
    }

    #[test]
    fn lenient_markings_and_unused_points() {
        let json = r#"{
            "controlPoints": [{"coords": [0, 0]}, {"coords": [9, 9]}, {"coords": [1, 0]}],
            "tracks": [{"type": "line", "start": 0, "end": 2, "centerLine": "Wavy"}]
        }"#;
        let graph = load(json).unwrap();
        assert_eq!(graph.len(), 2);

        let line = graph.segments()[0];
        let markings = *graph.segment(line).unwrap().markings().unwrap();
        assert_eq!(markings.center_line, LaneMarking::Dashed);
        assert!(!markings.left_line_missing);
    }

    #[test]
    fn unknown_track_type_is_a_json_error() {
        let json = r#"{"controlPoints": [], "tracks": [{"type": "spline"}]}"#;
        assert!(matches!(
            TrackDocument::from_json(json).unwrap_err(),
            TrackError::Persistence(PersistenceError::Json(_))
        ));
    }
}

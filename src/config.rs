use serde::{Deserialize, Serialize};

/// Settings the interactive editor consumes from its host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Half extent of the square editing area centered at the origin.
    pub ground_half_extent: f64,
    /// Distance within which a cursor position picks an existing control point.
    pub pick_radius: f64,
    /// Total track width. Also the distance of intersection spokes from
    /// their center.
    pub track_width: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            ground_half_extent: 10.0,
            pick_radius: 0.2,
            track_width: 0.8,
        }
    }
}

/// Track dimensions stored alongside the graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackSettings {
    /// Total width of a track.
    pub track_width: f64,
    /// Width of painted markings.
    pub marking_width: f64,
    /// Length of one center-line dash.
    pub center_line_length: f64,
    /// Gap between center-line dashes.
    pub center_line_interrupt: f64,
    /// Gap between the two lines of a double center line.
    pub center_line_gap: f64,
}

impl TrackSettings {
    /// Width of a single lane.
    #[must_use]
    pub fn lane_width(&self) -> f64 {
        self.track_width / 2.0
    }
}

impl Default for TrackSettings {
    fn default() -> Self {
        Self {
            track_width: 0.8,
            marking_width: 0.02,
            center_line_length: 0.2,
            center_line_interrupt: 0.2,
            center_line_gap: 0.02,
        }
    }
}

//! Ingest for externally suggested keyframe sets.
//!
//! An external collaborator (typically an LLM-backed assistant) returns
//! keyframes in a normalized bounding-box coordinate system with polar handle
//! encoding. This module owns the denormalization back into user space.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

use crate::curves;
use crate::keyframe::Keyframe;

/// Polar handle: direction in degrees plus a distance normalized by the
/// relevant diagonal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolarHandle {
    pub angle_deg: f64,
    pub dist: f64,
}

impl PolarHandle {
    fn to_offset(self, diagonal: f64) -> Vec2 {
        let radians = self.angle_deg.to_radians();
        Vec2::new(radians.cos(), radians.sin()) * (diagonal * self.dist)
    }
}

/// One suggested keyframe, with its position in the unit square of the
/// target box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuggestedKeyframe {
    pub time: f64,
    pub x: f64,
    pub y: f64,
    pub sketch_in: Option<PolarHandle>,
    pub sketch_out: Option<PolarHandle>,
    pub graph_in: Option<PolarHandle>,
    pub graph_out: Option<PolarHandle>,
}

/// Target bounding box in user space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuggestionBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SuggestionBox {
    fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }
}

/// Map a suggestion back into user space.
///
/// Positions scale into the box; sketch handle magnitudes scale by the box
/// diagonal; graph handle magnitudes scale by each segment's own
/// (time, progress) diagonal, computed from the denormalized sketch
/// geometry.
pub fn denormalize_keyframes(
    suggested: &[SuggestedKeyframe],
    bounds: &SuggestionBox,
) -> Vec<Keyframe> {
    let diagonal = bounds.diagonal();

    let mut keyframes: Vec<Keyframe> = suggested
        .iter()
        .map(|s| {
            let position = Point::new(bounds.x + s.x * bounds.width, bounds.y + s.y * bounds.height);
            let mut keyframe = Keyframe::new(s.time.clamp(0.0, 1.0), position);
            keyframe.sketch_in = s.sketch_in.map(|handle| handle.to_offset(diagonal));
            keyframe.sketch_out = s.sketch_out.map(|handle| handle.to_offset(diagonal));
            keyframe
        })
        .collect();

    let sketch = curves::build_sketch_curves(&keyframes);
    let progress = curves::keyframe_progress(&keyframes, &sketch);
    let spans: Vec<f64> = keyframes
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let dt = pair[1].time - pair[0].time;
            let dv = progress[i + 1] - progress[i];
            dt.hypot(dv)
        })
        .collect();

    for (i, s) in suggested.iter().enumerate() {
        if let Some(handle) = s.graph_out {
            if i < spans.len() {
                keyframes[i].graph_out = Some(handle.to_offset(spans[i]));
            }
        }
        if let Some(handle) = s.graph_in {
            if i > 0 {
                keyframes[i].graph_in = Some(handle.to_offset(spans[i - 1]));
            }
        }
    }
    keyframes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_scale_into_box() {
        let suggested = vec![
            SuggestedKeyframe {
                time: 0.0,
                x: 0.0,
                y: 0.0,
                sketch_in: None,
                sketch_out: None,
                graph_in: None,
                graph_out: None,
            },
            SuggestedKeyframe {
                time: 1.0,
                x: 1.0,
                y: 0.5,
                sketch_in: None,
                sketch_out: None,
                graph_in: None,
                graph_out: None,
            },
        ];
        let bounds = SuggestionBox {
            x: 100.0,
            y: 200.0,
            width: 80.0,
            height: 60.0,
        };

        let keyframes = denormalize_keyframes(&suggested, &bounds);
        assert_eq!(keyframes[0].position, Point::new(100.0, 200.0));
        assert_eq!(keyframes[1].position, Point::new(180.0, 230.0));
    }

    #[test]
    fn test_sketch_handles_scale_by_box_diagonal() {
        let suggested = vec![
            SuggestedKeyframe {
                time: 0.0,
                x: 0.0,
                y: 0.0,
                sketch_in: None,
                sketch_out: Some(PolarHandle {
                    angle_deg: 0.0,
                    dist: 0.1,
                }),
                graph_in: None,
                graph_out: None,
            },
            SuggestedKeyframe {
                time: 1.0,
                x: 1.0,
                y: 1.0,
                sketch_in: Some(PolarHandle {
                    angle_deg: 90.0,
                    dist: 0.2,
                }),
                sketch_out: None,
                graph_in: None,
                graph_out: None,
            },
        ];
        let bounds = SuggestionBox {
            x: 0.0,
            y: 0.0,
            width: 30.0,
            height: 40.0,
        };

        let keyframes = denormalize_keyframes(&suggested, &bounds);
        // Diagonal is 50.
        let out = keyframes[0].sketch_out.unwrap();
        assert!((out - Vec2::new(5.0, 0.0)).hypot() < 1e-9);
        let into = keyframes[1].sketch_in.unwrap();
        assert!((into - Vec2::new(0.0, 10.0)).hypot() < 1e-9);
    }

    #[test]
    fn test_graph_handles_scale_by_segment_diagonal() {
        let suggested = vec![
            SuggestedKeyframe {
                time: 0.0,
                x: 0.0,
                y: 0.0,
                sketch_in: None,
                sketch_out: None,
                graph_in: None,
                graph_out: Some(PolarHandle {
                    angle_deg: 0.0,
                    dist: 0.5,
                }),
            },
            SuggestedKeyframe {
                time: 1.0,
                x: 1.0,
                y: 0.0,
                sketch_in: None,
                sketch_out: None,
                graph_in: None,
                graph_out: None,
            },
        ];
        let bounds = SuggestionBox {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
        };

        let keyframes = denormalize_keyframes(&suggested, &bounds);
        // One segment spanning the full time and progress range: diagonal
        // is sqrt(2).
        let out = keyframes[0].graph_out.unwrap();
        assert!((out.x - 0.5 * 2.0_f64.sqrt()).abs() < 1e-9);
        assert!(out.y.abs() < 1e-9);
        // The endpoints keep their boundary handles absent.
        assert!(keyframes[1].graph_in.is_none());
    }
}

//! Keyframe and motion-path data model.
//!
//! A keyframe couples a spatial anchor with its cubic handles and a position
//! on the timing curve. Handles are stored relative to their anchor: an
//! absent sketch handle reads as a zero offset, an absent graph handle reads
//! as the natural one-third cubic default.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::FitConfig;
use crate::error::CoreError;
use crate::keyframe_builder;
use crate::modifier::{GraphModifier, SketchModifier};

/// Shortest a path is allowed to play for, in seconds.
pub const MIN_DURATION: f64 = 0.01;

/// One anchor of a motion path, with spatial and timing handles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Normalized position in the path's lifetime, in [0, 1].
    pub time: f64,
    /// Anchor point in user space.
    pub position: Point,
    /// Incoming spatial handle, relative to `position`.
    pub sketch_in: Option<Vec2>,
    /// Outgoing spatial handle, relative to `position`.
    pub sketch_out: Option<Vec2>,
    /// Incoming timing handle in the (time, progress) plane, relative to the
    /// keyframe's own (time, progress) point.
    pub graph_in: Option<Vec2>,
    /// Outgoing timing handle in the (time, progress) plane.
    pub graph_out: Option<Vec2>,
}

impl Keyframe {
    /// Create a keyframe with no explicit handles.
    pub fn new(time: f64, position: Point) -> Self {
        Self {
            time,
            position,
            sketch_in: None,
            sketch_out: None,
            graph_in: None,
            graph_out: None,
        }
    }

    /// Spatial in-handle with the absent-means-zero reading applied.
    pub fn sketch_in_offset(&self) -> Vec2 {
        self.sketch_in.unwrap_or(Vec2::ZERO)
    }

    /// Spatial out-handle with the absent-means-zero reading applied.
    pub fn sketch_out_offset(&self) -> Vec2 {
        self.sketch_out.unwrap_or(Vec2::ZERO)
    }
}

/// A sample of an input gesture: a pen position with its capture time.
///
/// Timestamps are milliseconds and non-decreasing across one gesture.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GestureSample {
    pub position: Point,
    pub timestamp_ms: f64,
}

impl GestureSample {
    pub fn new(x: f64, y: f64, timestamp_ms: f64) -> Self {
        Self {
            position: Point::new(x, y),
            timestamp_ms,
        }
    }
}

/// A keyframed motion path with its stack of modifier layers.
///
/// Keyframes are owned exclusively by the path; `time` is non-decreasing
/// across them. The first keyframe's in-handles and the last keyframe's
/// out-handles carry no meaning.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MotionPath {
    pub id: Uuid,
    pub keyframes: Vec<Keyframe>,
    /// Playback start offset in seconds.
    pub start_time: f64,
    /// Playback duration in seconds, at least [`MIN_DURATION`].
    pub duration: f64,
    pub sketch_modifiers: Vec<SketchModifier>,
    pub graph_modifiers: Vec<GraphModifier>,
}

impl MotionPath {
    /// Create a path from already-built keyframes.
    pub fn new(keyframes: Vec<Keyframe>, start_time: f64, duration: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            keyframes,
            start_time,
            duration: duration.max(MIN_DURATION),
            sketch_modifiers: Vec::new(),
            graph_modifiers: Vec::new(),
        }
    }

    /// Fit a completed pen gesture into a new path.
    pub fn from_gesture(
        samples: &[GestureSample],
        config: &FitConfig,
        start_time: f64,
        duration: f64,
    ) -> Result<Self, CoreError> {
        let keyframes = keyframe_builder::generate_keyframes(samples, config)?;
        Ok(Self::new(keyframes, start_time, duration))
    }

    /// A path needs two keyframes before it can be played or selected.
    pub fn is_editable(&self) -> bool {
        self.keyframes.len() >= 2
    }

    /// Number of cubic segments between the keyframes.
    pub fn segment_count(&self) -> usize {
        self.keyframes.len().saturating_sub(1)
    }

    /// Attach a sketch modifier layer. Its delta list must already cover
    /// every keyframe.
    pub fn add_sketch_modifier(&mut self, modifier: SketchModifier) {
        debug_assert_eq!(modifier.deltas.len(), self.keyframes.len());
        self.sketch_modifiers.push(modifier);
    }

    /// Attach a graph modifier layer.
    pub fn add_graph_modifier(&mut self, modifier: GraphModifier) {
        debug_assert_eq!(modifier.deltas.len(), self.keyframes.len());
        self.graph_modifiers.push(modifier);
    }

    /// Drop the sketch modifier with the given id, if present.
    pub fn remove_sketch_modifier(&mut self, id: Uuid) {
        self.sketch_modifiers.retain(|modifier| modifier.id != id);
    }

    /// Drop the graph modifier with the given id, if present.
    pub fn remove_graph_modifier(&mut self, id: Uuid) {
        self.graph_modifiers.retain(|modifier| modifier.id != id);
    }
}

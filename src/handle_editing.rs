//! Interactive handle editing.
//!
//! Anchor and control dragging with the mirroring policy, plus rectangle
//! selection over the control points of every path. The editor only ever
//! mutates one path at a time; concurrency stays cooperative.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::bezier::{self, GEOMETRY_EPSILON};
use crate::curves;
use crate::keyframe::{Keyframe, MotionPath};

/// Identifies one control point of one cubic segment.
///
/// `point_index`: 0 = start anchor, 1 = start control, 2 = end control,
/// 3 = end anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSelection {
    pub path_index: usize,
    pub curve_index: usize,
    pub point_index: usize,
}

/// Whether dragging one control re-aims the opposite one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HandleMode {
    /// Keep the two controls of the shared anchor collinear.
    #[default]
    Mirrored,
    /// Leave the opposite control alone (modifier key held).
    Free,
}

/// Editor interaction state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(ControlSelection),
}

/// Drag and selection state for the handle tool.
#[derive(Clone, Debug, Default)]
pub struct HandleEditor {
    state: DragState,
    selected: Vec<ControlSelection>,
    active_path: Option<usize>,
}

impl HandleEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn active_path(&self) -> Option<usize> {
        self.active_path
    }

    pub fn selected(&self) -> &[ControlSelection] {
        &self.selected
    }

    /// Start dragging a control; the control's path becomes the active path.
    pub fn begin_drag(&mut self, selection: ControlSelection) {
        self.state = DragState::Dragging(selection);
        self.active_path = Some(selection.path_index);
    }

    pub fn end_drag(&mut self) {
        self.state = DragState::Idle;
    }

    /// Move the dragged control by `delta`. Returns whether a path changed.
    pub fn drag(&self, paths: &mut [MotionPath], delta: Vec2, mode: HandleMode) -> bool {
        let DragState::Dragging(selection) = self.state else {
            return false;
        };
        let Some(path) = paths.get_mut(selection.path_index) else {
            return false;
        };
        drag_sketch_control(
            &mut path.keyframes,
            selection.curve_index,
            selection.point_index,
            delta,
            mode,
        );
        true
    }

    /// Replace the multi-selection with every control inside `rect`.
    ///
    /// Restricted to the active path when one exists; otherwise the first
    /// path with a hit becomes active and scopes the rest.
    pub fn select_rect(&mut self, paths: &[MotionPath], rect: Rect) -> &[ControlSelection] {
        self.selected.clear();
        for (path_index, path) in paths.iter().enumerate() {
            if self.active_path.is_some_and(|active| active != path_index) {
                continue;
            }
            let segments = curves::build_sketch_curves(&path.keyframes);
            for (curve_index, segment) in segments.iter().enumerate() {
                let points = [segment.p0, segment.p1, segment.p2, segment.p3];
                for (point_index, point) in points.into_iter().enumerate() {
                    if rect.contains(point) {
                        self.selected.push(ControlSelection {
                            path_index,
                            curve_index,
                            point_index,
                        });
                    }
                }
            }
            if self.active_path.is_none() && !self.selected.is_empty() {
                self.active_path = Some(path_index);
            }
        }
        &self.selected
    }

    /// Curve-index interval covered by the selection.
    ///
    /// Endpoints whose shared keyframe has no selected control are trimmed
    /// inward, so a selection touching only the far end of a boundary curve
    /// does not scope that curve in.
    pub fn selection_range(&self) -> Option<(usize, usize)> {
        let mut start = self.selected.iter().map(|s| s.curve_index).min()?;
        let mut end = self.selected.iter().map(|s| s.curve_index).max()?;

        // Points 0 and 1 sit on the segment's start keyframe, 2 and 3 on the
        // end keyframe.
        let keyframe_selected = |keyframe: usize| {
            self.selected.iter().any(|s| {
                let owner = if s.point_index <= 1 {
                    s.curve_index
                } else {
                    s.curve_index + 1
                };
                owner == keyframe
            })
        };
        if !keyframe_selected(start) && start < end {
            start += 1;
        }
        if !keyframe_selected(end + 1) && end > start {
            end -= 1;
        }
        Some((start, end))
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
        self.active_path = None;
    }
}

/// Drag one control of a path's sketch chain.
///
/// Anchors carry their relative handles with them, which also moves the
/// neighbor segment's shared control through the shared keyframe.
pub fn drag_sketch_control(
    keyframes: &mut [Keyframe],
    curve: usize,
    point: usize,
    delta: Vec2,
    mode: HandleMode,
) {
    if curve + 1 >= keyframes.len() {
        return;
    }
    match point {
        0 => keyframes[curve].position += delta,
        3 => keyframes[curve + 1].position += delta,
        1 => drag_out_handle(keyframes, curve, delta, mode),
        2 => drag_in_handle(keyframes, curve + 1, delta, mode),
        _ => {}
    }
}

fn drag_out_handle(keyframes: &mut [Keyframe], index: usize, delta: Vec2, mode: HandleMode) {
    let shared = index > 0;
    let keyframe = &mut keyframes[index];
    let moved = keyframe.sketch_out_offset() + delta;
    keyframe.sketch_out = bezier::collapse_vector(moved);
    if mode == HandleMode::Mirrored && shared {
        keyframe.sketch_in = mirror_opposite(moved, keyframe.sketch_in);
    }
}

fn drag_in_handle(keyframes: &mut [Keyframe], index: usize, delta: Vec2, mode: HandleMode) {
    let shared = index + 1 < keyframes.len();
    let keyframe = &mut keyframes[index];
    let moved = keyframe.sketch_in_offset() + delta;
    keyframe.sketch_in = bezier::collapse_vector(moved);
    if mode == HandleMode::Mirrored && shared {
        keyframe.sketch_out = mirror_opposite(moved, keyframe.sketch_out);
    }
}

/// Re-aim `opposite` so it stays collinear with `reference` through the
/// shared anchor while keeping its own length. A zero-magnitude vector on
/// either side opts out of mirroring.
fn mirror_opposite(reference: Vec2, opposite: Option<Vec2>) -> Option<Vec2> {
    let current = opposite?;
    let length = current.hypot();
    let reference_length = reference.hypot();
    if length < GEOMETRY_EPSILON || reference_length < GEOMETRY_EPSILON {
        return opposite;
    }
    Some(reference * (-length / reference_length))
}

/// Drag an inner control of a path's timing curve.
///
/// The handle's time component is clamped into the segment's time range, and
/// the result is written back as a relative vector.
pub fn drag_graph_control(keyframes: &mut [Keyframe], curve: usize, point: usize, delta: Vec2) {
    if curve + 1 >= keyframes.len() {
        return;
    }
    let sketch = curves::build_sketch_curves(keyframes);
    let progress = curves::keyframe_progress(keyframes, &sketch);
    let graph = curves::build_graph_curves(keyframes, &progress);
    let segment = graph[curve];

    let time_min = keyframes[curve].time;
    let time_max = keyframes[curve + 1].time;
    match point {
        1 => {
            let target = segment.p1 + delta;
            let clamped = Point::new(target.x.clamp(time_min, time_max), target.y);
            keyframes[curve].graph_out = Some(clamped - segment.p0);
        }
        2 => {
            let target = segment.p2 + delta;
            let clamped = Point::new(target.x.clamp(time_min, time_max), target.y);
            keyframes[curve + 1].graph_in = Some(clamped - segment.p3);
        }
        _ => {}
    }
}

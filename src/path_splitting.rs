//! Splits a path segment in place while preserving the visible curve, both
//! on the base path and inside every attached modifier layer.

use crate::bezier;
use crate::curves;
use crate::error::CoreError;
use crate::keyframe::{Keyframe, MotionPath};

fn check_preconditions(keyframes: &[Keyframe], segment: usize, t: f64) -> Result<(), CoreError> {
    if keyframes.len() < 2 {
        return Err(CoreError::PathNotEditable(keyframes.len()));
    }
    let segment_count = keyframes.len() - 1;
    if segment >= segment_count {
        return Err(CoreError::SegmentOutOfRange {
            index: segment,
            segment_count,
        });
    }
    if !t.is_finite() || t <= 0.0 || t >= 1.0 {
        return Err(CoreError::SplitParameterOutOfRange(t));
    }
    Ok(())
}

/// Insert a keyframe at parameter `t` of segment `segment`.
///
/// The returned list is one keyframe longer and traces exactly the same
/// sketch chain. The inserted keyframe's time interpolates its neighbors'.
pub fn split_segment(
    keyframes: &[Keyframe],
    segment: usize,
    t: f64,
) -> Result<Vec<Keyframe>, CoreError> {
    check_preconditions(keyframes, segment, t)?;
    let mut result = keyframes.to_vec();

    let sketch = curves::build_sketch_curves(keyframes);
    let (left, right) = bezier::split(sketch[segment], t);

    result[segment].sketch_out = bezier::collapse_vector(left.p1 - left.p0);
    result[segment + 1].sketch_in = bezier::collapse_vector(right.p2 - right.p3);

    let from_time = keyframes[segment].time;
    let to_time = keyframes[segment + 1].time;
    let mut inserted = Keyframe::new(from_time + (to_time - from_time) * t, left.p3);
    inserted.sketch_in = bezier::collapse_vector(left.p2 - left.p3);
    inserted.sketch_out = bezier::collapse_vector(right.p1 - right.p0);

    // Timing handles stay explicit through the split: for a graph handle,
    // absent means the natural default rather than zero, so collapsing one
    // here would change the easing.
    let progress = curves::keyframe_progress(keyframes, &sketch);
    let graph = curves::build_graph_curves(keyframes, &progress);
    let (graph_left, graph_right) = bezier::split(graph[segment], t);
    result[segment].graph_out = Some(graph_left.p1 - graph_left.p0);
    result[segment + 1].graph_in = Some(graph_right.p2 - graph_right.p3);
    inserted.graph_in = Some(graph_left.p2 - graph_left.p3);
    inserted.graph_out = Some(graph_right.p1 - graph_right.p0);

    result.insert(segment + 1, inserted);
    Ok(result)
}

/// Split a segment of `path`, mirroring the split into every modifier layer.
///
/// Either the whole operation lands or the path is left untouched.
pub fn split_path_segment(path: &mut MotionPath, segment: usize, t: f64) -> Result<(), CoreError> {
    let base_split = split_segment(&path.keyframes, segment, t)?;

    let mut sketch_modifiers = path.sketch_modifiers.clone();
    for modifier in &mut sketch_modifiers {
        modifier.propagate_split(&path.keyframes, &base_split, segment, t)?;
    }
    let mut graph_modifiers = path.graph_modifiers.clone();
    for modifier in &mut graph_modifiers {
        modifier.propagate_split(&path.keyframes, &base_split, segment, t)?;
    }

    log::debug!(
        "split segment {segment} of path {} at t={t}, {} modifiers updated",
        path.id,
        sketch_modifiers.len() + graph_modifiers.len()
    );
    path.keyframes = base_split;
    path.sketch_modifiers = sketch_modifiers;
    path.graph_modifiers = graph_modifiers;
    Ok(())
}

//! Rebuilds the sketch and graph cubic chains from a keyframe list.

use kurbo::{CubicBez, Point};

use crate::bezier::{self, GEOMETRY_EPSILON};
use crate::keyframe::Keyframe;

/// Spatial cubic chain: one segment per adjacent keyframe pair, with absent
/// handles reading as zero offsets.
pub fn build_sketch_curves(keyframes: &[Keyframe]) -> Vec<CubicBez> {
    keyframes
        .windows(2)
        .map(|pair| {
            let (from, to) = (&pair[0], &pair[1]);
            CubicBez::new(
                from.position,
                from.position + from.sketch_out_offset(),
                to.position + to.sketch_in_offset(),
                to.position,
            )
        })
        .collect()
}

/// Normalized arc-length position of every keyframe along the sketch chain.
///
/// A chain with zero total length puts every keyframe at progress zero.
pub fn keyframe_progress(keyframes: &[Keyframe], curves: &[CubicBez]) -> Vec<f64> {
    let mut progress = vec![0.0; keyframes.len()];
    let lengths: Vec<f64> = curves.iter().map(|c| bezier::estimate_length(*c)).collect();
    let total: f64 = lengths.iter().sum();
    if total < GEOMETRY_EPSILON {
        return progress;
    }

    let mut accumulated = 0.0;
    for (i, length) in lengths.iter().enumerate() {
        accumulated += length;
        if i + 1 < progress.len() {
            progress[i + 1] = accumulated / total;
        }
    }
    progress
}

/// Timing cubic chain over the (time, progress) plane.
///
/// Absent graph handles read as the natural one-third cubic default, which
/// plays the segment at constant speed.
pub fn build_graph_curves(keyframes: &[Keyframe], progress: &[f64]) -> Vec<CubicBez> {
    let segment_count = keyframes.len().saturating_sub(1);
    (0..segment_count)
        .map(|i| {
            let from = &keyframes[i];
            let to = &keyframes[i + 1];
            let p0 = Point::new(from.time, progress[i]);
            let p3 = Point::new(to.time, progress[i + 1]);
            let third = (p3 - p0) / 3.0;

            CubicBez::new(
                p0,
                p0 + from.graph_out.unwrap_or(third),
                p3 + to.graph_in.unwrap_or(-third),
                p3,
            )
        })
        .collect()
}

//! Builds editable keyframes out of a completed pen gesture.
//!
//! The sketch fitter decides the segment boundaries; the graph fitter then
//! derives the easing chain over the same boundaries so that playback keeps
//! the cadence the stroke was drawn with.

use kurbo::Point;

use crate::bezier;
use crate::config::FitConfig;
use crate::error::CoreError;
use crate::graph_fitting;
use crate::keyframe::{GestureSample, Keyframe};
use crate::path_fitting::{self, FitErrorTracker};

/// Turn gesture samples into a keyframe list: one keyframe per fitted
/// segment boundary, with spatial handles from the sketch cubics and timing
/// handles from the easing cubics.
pub fn generate_keyframes(
    samples: &[GestureSample],
    config: &FitConfig,
) -> Result<Vec<Keyframe>, CoreError> {
    let points: Vec<Point> = samples.iter().map(|sample| sample.position).collect();

    let mut tracker = FitErrorTracker::default();
    let fit = path_fitting::fit_sketch(
        &points,
        config.fine_tolerance(),
        config.coarse_tolerance(),
        &mut tracker,
    )?;

    let time_norm = normalize_timestamps(samples);
    let progress_norm = path_fitting::chord_length_parameterize(&points);

    // One keyframe per segment boundary; adjacent segments share theirs.
    let mut keyframes = Vec::with_capacity(fit.curves.len() + 1);
    let first_curve = fit.curves[0];
    let mut first = Keyframe::new(
        time_norm[fit.ranges[0].start].clamp(0.0, 1.0),
        first_curve.p0,
    );
    first.sketch_out = bezier::collapse_vector(first_curve.p1 - first_curve.p0);
    keyframes.push(first);

    for (i, (curve, range)) in fit.curves.iter().zip(&fit.ranges).enumerate() {
        let mut keyframe = Keyframe::new(time_norm[range.end].clamp(0.0, 1.0), curve.p3);
        keyframe.sketch_in = bezier::collapse_vector(curve.p2 - curve.p3);
        if let Some(next) = fit.curves.get(i + 1) {
            keyframe.sketch_out = bezier::collapse_vector(next.p1 - next.p0);
        }
        keyframes.push(keyframe);
    }

    // Easing chain over the same boundaries. A missing timing cubic leaves
    // the handles absent, which reads as the natural one-third default.
    let timing_points: Vec<Point> = time_norm
        .iter()
        .zip(&progress_norm)
        .map(|(&time, &progress)| Point::new(time, progress))
        .collect();
    let split_indices: Vec<usize> = fit.ranges[..fit.ranges.len() - 1]
        .iter()
        .map(|range| range.end)
        .collect();
    let graph_curves = graph_fitting::fit_graph(&timing_points, &split_indices);

    for i in 0..keyframes.len() - 1 {
        if let Some(curve) = graph_curves.get(i) {
            keyframes[i].graph_out = Some(curve.p1 - curve.p0);
            keyframes[i + 1].graph_in = Some(curve.p2 - curve.p3);
        }
    }

    Ok(keyframes)
}

/// Normalize capture times into [0, 1]. A gesture drawn in a single instant
/// normalizes to all zeros.
fn normalize_timestamps(samples: &[GestureSample]) -> Vec<f64> {
    let Some(first) = samples.first() else {
        return Vec::new();
    };
    let last = samples[samples.len() - 1];
    let span = last.timestamp_ms - first.timestamp_ms;
    if span <= 0.0 {
        return vec![0.0; samples.len()];
    }
    samples
        .iter()
        .map(|sample| (sample.timestamp_ms - first.timestamp_ms) / span)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves;

    fn uniform_line(count: usize) -> Vec<GestureSample> {
        (0..count)
            .map(|i| GestureSample::new(i as f64 * 10.0, 0.0, i as f64 * 10.0))
            .collect()
    }

    #[test]
    fn test_line_yields_two_keyframes() {
        let samples = uniform_line(10);
        let keyframes = generate_keyframes(&samples, &FitConfig::default()).unwrap();

        assert_eq!(keyframes.len(), 2);
        assert_eq!(keyframes[0].time, 0.0);
        assert_eq!(keyframes[0].position, Point::new(0.0, 0.0));
        assert_eq!(keyframes[1].time, 1.0);
        assert_eq!(keyframes[1].position, Point::new(90.0, 0.0));
    }

    #[test]
    fn test_keyframes_round_trip_through_reconstruction() {
        let samples = uniform_line(10);
        let keyframes = generate_keyframes(&samples, &FitConfig::default()).unwrap();
        let rebuilt = curves::build_sketch_curves(&keyframes);

        assert_eq!(rebuilt.len(), 1);
        for (i, sample) in samples.iter().enumerate() {
            let t = i as f64 / 9.0;
            let deviation = (bezier::eval(rebuilt[0], t) - sample.position).hypot();
            assert!(deviation < 1e-4);
        }
    }

    #[test]
    fn test_times_are_non_decreasing() {
        let samples: Vec<GestureSample> = (0..=20)
            .map(|i| {
                let x = i as f64 * 4.0;
                GestureSample::new(x, 30.0 * (x * 0.08).sin(), i as f64 * 16.0)
            })
            .collect();
        let keyframes = generate_keyframes(&samples, &FitConfig::default()).unwrap();

        for pair in keyframes.windows(2) {
            assert!(pair[0].time <= pair[1].time);
        }
        assert!(keyframes.iter().all(|kf| (0.0..=1.0).contains(&kf.time)));
    }

    #[test]
    fn test_instant_gesture_normalizes_times_to_zero() {
        let samples: Vec<GestureSample> = (0..5)
            .map(|i| GestureSample::new(i as f64 * 10.0, 0.0, 100.0))
            .collect();
        let keyframes = generate_keyframes(&samples, &FitConfig::default()).unwrap();
        assert!(keyframes.iter().all(|kf| kf.time == 0.0));
    }

    #[test]
    fn test_too_few_samples_is_rejected() {
        let samples = uniform_line(1);
        assert!(matches!(
            generate_keyframes(&samples, &FitConfig::default()),
            Err(CoreError::TooFewSamples { .. })
        ));
    }
}

//! Integration tests for gesture fitting.
//!
//! Drives the sketch fitter, the graph fitter and the keyframe builder
//! end-to-end on synthetic pen gestures.

use kurbo::Point;
use strokemotion_core::bezier;
use strokemotion_core::config::FitConfig;
use strokemotion_core::curves;
use strokemotion_core::keyframe::GestureSample;
use strokemotion_core::keyframe_builder::generate_keyframes;
use strokemotion_core::path_fitting::{fit_sketch, FitErrorTracker};
use strokemotion_core::playback::solve_bezier_x;

/// Ten equally spaced samples along the x axis, drawn at a steady pace.
fn line_gesture() -> Vec<GestureSample> {
    (0..10)
        .map(|i| GestureSample::new(i as f64 * 10.0, 0.0, i as f64 * 10.0))
        .collect()
}

#[test]
fn test_linear_stroke_fits_single_cubic() {
    let samples = line_gesture();
    let points: Vec<Point> = samples.iter().map(|s| s.position).collect();
    let mut tracker = FitErrorTracker::default();

    let fit = fit_sketch(&points, 2.0, 50.0, &mut tracker).unwrap();
    assert_eq!(fit.curves.len(), 1);

    let curve = fit.curves[0];
    assert_eq!(curve.p0, Point::new(0.0, 0.0));
    assert_eq!(curve.p3, Point::new(90.0, 0.0));
    // Inner controls stay on the segment.
    for control in [curve.p1, curve.p2] {
        assert!(control.y.abs() < 1e-9);
        assert!((-1e-9..=90.0 + 1e-9).contains(&control.x));
    }
    assert!(tracker.current.max_error < 1e-4);
}

#[test]
fn test_linear_stroke_reconstructs_through_keyframes() {
    let samples = line_gesture();
    let keyframes = generate_keyframes(&samples, &FitConfig::default()).unwrap();
    let rebuilt = curves::build_sketch_curves(&keyframes);

    assert_eq!(rebuilt.len(), 1);
    for (i, sample) in samples.iter().enumerate() {
        let t = i as f64 / 9.0;
        assert!((bezier::eval(rebuilt[0], t) - sample.position).hypot() < 1e-4);
    }
}

#[test]
fn test_corner_stroke_splits_at_corner() {
    // Two straight legs meeting at a right angle, eleven samples each.
    let mut points: Vec<Point> = (0..=10).map(|i| Point::new(0.0, i as f64 * 5.0)).collect();
    points.extend((1..=10).map(|i| Point::new(i as f64 * 5.0, 50.0)));
    let mut tracker = FitErrorTracker::default();

    let fit = fit_sketch(&points, 1.0, 25.0, &mut tracker).unwrap();
    assert!(fit.curves.len() >= 2);

    // The first subdivision lands exactly on the corner sample, so the
    // corner survives as a shared anchor.
    let corner = fit
        .ranges
        .iter()
        .position(|range| range.end == 10)
        .expect("corner sample is a segment boundary");
    let shared = fit.curves[corner].p3;
    assert!((shared - Point::new(0.0, 50.0)).hypot() < 1e-9);
    assert!((fit.curves[corner + 1].p0 - shared).hypot() < 1e-9);

    // The outer tangents follow the legs.
    let start_handle = fit.curves[0].p1 - fit.curves[0].p0;
    assert!((start_handle.y / start_handle.hypot() - 1.0).abs() < 1e-6);
    let last = fit.curves.last().unwrap();
    let end_handle = last.p3 - last.p2;
    assert!((end_handle.x / end_handle.hypot() - 1.0).abs() < 1e-6);
}

#[test]
fn test_cadence_survives_fitting() {
    // A straight stroke drawn fast at first, then slowing down: the first
    // half of the samples land in the first tenth of the gesture's lifetime.
    let samples: Vec<GestureSample> = (0..20)
        .map(|i| {
            let timestamp = if i < 10 {
                i as f64 * 10.0
            } else {
                90.0 + (i - 9) as f64 * 100.0
            };
            GestureSample::new(i as f64 * 5.0, 0.0, timestamp)
        })
        .collect();

    let keyframes = generate_keyframes(&samples, &FitConfig::default()).unwrap();
    let sketch = curves::build_sketch_curves(&keyframes);
    let progress = curves::keyframe_progress(&keyframes, &sketch);
    let graph = curves::build_graph_curves(&keyframes, &progress);

    // At the halfway time the stroke has already covered well over half its
    // length.
    let u = solve_bezier_x(graph[0], 0.5);
    assert!(bezier::eval(graph[0], u).y > 0.55);
}

#[test]
fn test_wavy_gesture_produces_ordered_keyframes() {
    let samples: Vec<GestureSample> = (0..=40)
        .map(|i| {
            let x = i as f64 * 3.0;
            GestureSample::new(x, 25.0 * (x * 0.07).sin(), i as f64 * 16.0)
        })
        .collect();

    let keyframes = generate_keyframes(&samples, &FitConfig::default()).unwrap();
    assert!(keyframes.len() >= 2);
    for pair in keyframes.windows(2) {
        assert!(pair[0].time <= pair[1].time);
    }
    assert_eq!(keyframes[0].position, samples[0].position);
    assert_eq!(
        keyframes.last().unwrap().position,
        samples.last().unwrap().position
    );
}

//! Integration tests for playback evaluation.
//!
//! Checks the time-window boundaries, easing inversion and the frame-loop
//! driver against paths built both by hand and by the fitter.

use kurbo::{CubicBez, Point, Vec2};
use strokemotion_core::bezier;
use strokemotion_core::config::FitConfig;
use strokemotion_core::keyframe::{GestureSample, Keyframe, MotionPath};
use strokemotion_core::modifier::SketchModifier;
use strokemotion_core::playback::{evaluate_path, solve_bezier_x, Player};

/// A straight two-keyframe path from the origin to (60, 0).
fn setup_line_path(start_time: f64, duration: f64) -> MotionPath {
    let mut a = Keyframe::new(0.0, Point::new(0.0, 0.0));
    a.sketch_out = Some(Vec2::new(20.0, 0.0));
    let mut b = Keyframe::new(1.0, Point::new(60.0, 0.0));
    b.sketch_in = Some(Vec2::new(-20.0, 0.0));
    MotionPath::new(vec![a, b], start_time, duration)
}

#[test]
fn test_time_window_boundaries() {
    let path = setup_line_path(0.5, 2.0);

    assert_eq!(evaluate_path(&path, 499.0), Point::new(0.0, 0.0));
    // At exactly the start the easing solver runs, so the match is within
    // the bisection resolution rather than exact.
    assert!((evaluate_path(&path, 500.0) - Point::new(0.0, 0.0)).hypot() < 0.1);
    assert_eq!(evaluate_path(&path, 2500.0), Point::new(60.0, 0.0));
    assert_eq!(evaluate_path(&path, 2501.0), Point::new(60.0, 0.0));
}

#[test]
fn test_endpoints_respect_modifiers() {
    let mut path = setup_line_path(0.0, 1.0);
    let mut modified = path.keyframes.clone();
    modified[0].position += Vec2::new(0.0, 5.0);
    modified[1].position += Vec2::new(0.0, -3.0);
    let modifier = SketchModifier::from_difference("nudge", &path.keyframes, &modified, None);
    path.add_sketch_modifier(modifier);

    assert!((evaluate_path(&path, 0.0) - Point::new(0.0, 5.0)).hypot() < 0.1);
    assert_eq!(evaluate_path(&path, 1000.0), Point::new(60.0, -3.0));
}

#[test]
fn test_solver_inverts_monotone_easing() {
    let curve = CubicBez::new(
        Point::new(0.0, 0.0),
        Point::new(0.4, 0.0),
        Point::new(0.6, 1.0),
        Point::new(1.0, 1.0),
    );
    for i in 1..32 {
        let x = i as f64 / 32.0;
        let u = solve_bezier_x(curve, x);
        assert!((bezier::eval(curve, u).x - x).abs() <= 2.0_f64.powi(-10) * 1.5);
    }
}

#[test]
fn test_fitted_path_plays_back_to_its_endpoints() {
    let samples: Vec<GestureSample> = (0..=30)
        .map(|i| {
            let x = i as f64 * 4.0;
            GestureSample::new(x, 15.0 * (x * 0.06).sin(), i as f64 * 33.0)
        })
        .collect();
    let path = MotionPath::from_gesture(&samples, &FitConfig::default(), 0.0, 1.5).unwrap();

    let start = evaluate_path(&path, 0.0);
    assert!((start - samples[0].position).hypot() < 0.5);
    let end = evaluate_path(&path, 1500.0);
    assert!((end - samples.last().unwrap().position).hypot() < 1e-9);

    // Interior evaluation stays near the stroke.
    let midway = evaluate_path(&path, 750.0);
    assert!(midway.x > 0.0 && midway.x < 120.0);
}

#[test]
fn test_player_frame_emits_one_point_per_path() {
    let paths = vec![setup_line_path(0.0, 1.0), setup_line_path(0.5, 2.0)];
    let mut player = Player::new();
    player.play();

    let frame = player.frame(&paths, 100.0).unwrap();
    assert_eq!(frame.len(), 2);
    // The second path has not started yet.
    assert_eq!(frame[1], Point::new(0.0, 0.0));
}

#[test]
fn test_player_loops_and_cancels() {
    let paths = vec![setup_line_path(0.0, 1.0)];
    let mut player = Player::new();

    assert!(player.frame(&paths, 250.0).is_none());

    player.play();
    let inside = player.frame(&paths, 250.0).unwrap();
    let wrapped = player.frame(&paths, 1250.0).unwrap();
    assert!((inside[0] - wrapped[0]).hypot() < 1e-9);

    player.total_override_ms = Some(2000.0);
    // With a longer loop the same elapsed time now falls past the path end.
    let held = player.frame(&paths, 1250.0).unwrap();
    assert_eq!(held[0], Point::new(60.0, 0.0));

    player.stop();
    assert!(player.frame(&paths, 250.0).is_none());
}

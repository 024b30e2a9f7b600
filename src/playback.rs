//! Motion evaluator: resolves elapsed wall-clock time to an easing progress
//! and a position on each path, with every modifier layer applied.

use kurbo::{CubicBez, Point};

use crate::bezier::{self, GEOMETRY_EPSILON};
use crate::curves;
use crate::keyframe::{Keyframe, MotionPath};
use crate::modifier;

/// Solve `B_x(u) = x` by bisection over `u` in [0, 1].
///
/// Ten halvings pin the answer to about a thousandth of the parameter range,
/// plenty under a per-frame evaluation budget.
pub fn solve_bezier_x(curve: CubicBez, x: f64) -> f64 {
    let mut low = 0.0;
    let mut high = 1.0;
    for _ in 0..10 {
        let mid = (low + high) / 2.0;
        if bezier::eval(curve, mid).x < x {
            low = mid;
        } else {
            high = mid;
        }
    }
    (low + high) / 2.0
}

/// Largest keyframe interval index whose start time is at or before `tau`.
///
/// Floored at 0 and capped at the last interval.
fn find_interval(keyframes: &[Keyframe], tau: f64) -> usize {
    let mut low = 0;
    let mut high = keyframes.len() - 1;
    while low + 1 < high {
        let mid = (low + high) / 2;
        if keyframes[mid].time <= tau {
            low = mid;
        } else {
            high = mid;
        }
    }
    low.min(keyframes.len() - 2)
}

/// Position of `path` at `elapsed_ms` since playback began.
///
/// Before the path's start window this is the (modified) chain's start point;
/// past the end it is the chain's end point.
pub fn evaluate_path(path: &MotionPath, elapsed_ms: f64) -> Point {
    let sketch = modifier::apply_sketch_modifiers(
        &curves::build_sketch_curves(&path.keyframes),
        &path.sketch_modifiers,
    );
    let Some(first) = sketch.first() else {
        return path
            .keyframes
            .first()
            .map(|keyframe| keyframe.position)
            .unwrap_or(Point::ZERO);
    };
    let progress = curves::keyframe_progress(&path.keyframes, &sketch);
    let graph = modifier::apply_graph_modifiers(
        &curves::build_graph_curves(&path.keyframes, &progress),
        &path.graph_modifiers,
    );

    let start_ms = path.start_time * 1000.0;
    let duration_ms = (path.duration * 1000.0).max(1.0);
    if elapsed_ms < start_ms {
        return first.p0;
    }
    let tau = ((elapsed_ms - start_ms) / duration_ms).clamp(0.0, 1.0);
    if tau >= 1.0 {
        return sketch[sketch.len() - 1].p3;
    }

    let interval = find_interval(&path.keyframes, tau);
    let u = solve_bezier_x(graph[interval], tau);
    let value = bezier::eval(graph[interval], u).y;

    let span = progress[interval + 1] - progress[interval];
    let local = if span < GEOMETRY_EPSILON {
        0.0
    } else {
        ((value - progress[interval]) / span).clamp(0.0, 1.0)
    };
    bezier::eval(sketch[interval], local)
}

/// Frame-loop driver for a set of paths.
///
/// Playback runs while the flag is set; clearing it aborts the frame's
/// emission. Elapsed time loops modulo the total duration, which is either
/// the external override or the latest path end.
#[derive(Clone, Debug, Default)]
pub struct Player {
    pub playing: bool,
    pub total_override_ms: Option<f64>,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Loop length in milliseconds.
    pub fn total_duration_ms(&self, paths: &[MotionPath]) -> f64 {
        self.total_override_ms.unwrap_or_else(|| {
            paths
                .iter()
                .map(|path| path.start_time * 1000.0 + (path.duration * 1000.0).max(1.0))
                .fold(0.0, f64::max)
        })
    }

    /// Evaluate every path for the frame at `elapsed_ms`, or `None` when
    /// playback is stopped.
    pub fn frame(&self, paths: &[MotionPath], elapsed_ms: f64) -> Option<Vec<Point>> {
        if !self.playing {
            return None;
        }
        let total = self.total_duration_ms(paths);
        let looped = if total > 0.0 { elapsed_ms % total } else { 0.0 };
        Some(paths.iter().map(|path| evaluate_path(path, looped)).collect())
    }
}

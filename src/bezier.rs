//! Cubic Bezier primitives shared by the fitters, the splitter and playback.
//!
//! All evaluation uses the closed-form Bernstein polynomials over
//! `kurbo::CubicBez` control polygons, following the forms in
//! fit-curve by Philip J. Schneider (Graphics Gems, 1990).

use kurbo::{CubicBez, Point, Vec2};

/// Guard for chords, determinants and Newton denominators.
pub(crate) const GEOMETRY_EPSILON: f64 = 1e-6;

/// Floor below which per-component differences collapse to absent.
pub(crate) const DELTA_EPSILON: f64 = 1e-9;

/// Evaluate a cubic Bezier at parameter t.
pub fn eval(cubic: CubicBez, t: f64) -> Point {
    let tx = 1.0 - t;
    let p_a = cubic.p0.to_vec2() * (tx * tx * tx);
    let p_b = cubic.p1.to_vec2() * (3.0 * tx * tx * t);
    let p_c = cubic.p2.to_vec2() * (3.0 * tx * t * t);
    let p_d = cubic.p3.to_vec2() * (t * t * t);

    (p_a + p_b + p_c + p_d).to_point()
}

/// Evaluate the first derivative of a cubic Bezier at parameter t.
pub fn eval_derivative(cubic: CubicBez, t: f64) -> Vec2 {
    let tx = 1.0 - t;
    let p_a = (cubic.p1 - cubic.p0) * (3.0 * tx * tx);
    let p_b = (cubic.p2 - cubic.p1) * (6.0 * tx * t);
    let p_c = (cubic.p3 - cubic.p2) * (3.0 * t * t);

    p_a + p_b + p_c
}

/// Evaluate the second derivative of a cubic Bezier at parameter t.
pub fn eval_second_derivative(cubic: CubicBez, t: f64) -> Vec2 {
    let v0 = cubic.p2.to_vec2() - cubic.p1.to_vec2() * 2.0 + cubic.p0.to_vec2();
    let v1 = cubic.p3.to_vec2() - cubic.p2.to_vec2() * 2.0 + cubic.p1.to_vec2();

    v0 * (6.0 * (1.0 - t)) + v1 * (6.0 * t)
}

/// Cheap arc-length estimate: mean of the chord and the control polygon.
pub fn estimate_length(cubic: CubicBez) -> f64 {
    let chord = (cubic.p3 - cubic.p0).hypot();
    let polygon = (cubic.p1 - cubic.p0).hypot()
        + (cubic.p2 - cubic.p1).hypot()
        + (cubic.p3 - cubic.p2).hypot();

    (chord + polygon) / 2.0
}

/// Split a cubic at parameter t with de Casteljau's algorithm.
///
/// The shared point `left.p3 == right.p0` lies exactly on the curve.
pub fn split(cubic: CubicBez, t: f64) -> (CubicBez, CubicBez) {
    let p01 = cubic.p0.lerp(cubic.p1, t);
    let p12 = cubic.p1.lerp(cubic.p2, t);
    let p23 = cubic.p2.lerp(cubic.p3, t);
    let p012 = p01.lerp(p12, t);
    let p123 = p12.lerp(p23, t);
    let mid = p012.lerp(p123, t);

    (
        CubicBez::new(cubic.p0, p01, p012, mid),
        CubicBez::new(mid, p123, p23, cubic.p3),
    )
}

/// One Newton-Raphson step toward the parameter whose curve point is closest
/// to `target`.
///
/// Returns `u` unchanged when the denominator vanishes or the step is
/// non-finite. Callers clamp the result into [0, 1].
pub fn refine_parameter(cubic: CubicBez, target: Point, u: f64) -> f64 {
    let d = eval(cubic, u) - target;
    let qprime = eval_derivative(cubic, u);
    let qprimeprime = eval_second_derivative(cubic, u);

    let denominator = qprime.dot(qprime) + d.dot(qprimeprime);
    if denominator.abs() < GEOMETRY_EPSILON {
        return u;
    }

    let refined = u - d.dot(qprime) / denominator;
    if refined.is_finite() {
        refined
    } else {
        u
    }
}

/// Unit tangent shared by the two sides of a subdivision at sample `index`,
/// pointing from the following sample back toward the preceding one.
///
/// Undefined at the endpoints and when the neighbors coincide.
pub fn split_tangent(points: &[Point], index: usize) -> Option<Vec2> {
    if index == 0 || index + 1 >= points.len() {
        return None;
    }
    let v = points[index - 1] - points[index + 1];
    let length = v.hypot();
    if length < GEOMETRY_EPSILON {
        return None;
    }
    Some(v / length)
}

/// Normalize a vector, or return zero when its length is below the guard.
pub(crate) fn normalize_or_zero(v: Vec2) -> Vec2 {
    let length = v.hypot();
    if length < GEOMETRY_EPSILON {
        Vec2::ZERO
    } else {
        v / length
    }
}

/// Collapse a vector within the geometric floor of zero to "absent".
pub(crate) fn collapse_vector(v: Vec2) -> Option<Vec2> {
    if v.hypot2() <= GEOMETRY_EPSILON * GEOMETRY_EPSILON {
        None
    } else {
        Some(v)
    }
}

//! Sketch fitter: approximates a drawn stroke with the fewest cubic segments
//! whose deviation from the samples stays under a tolerance.
//!
//! Least-squares control point solving over a chord-length parameterization,
//! one Newton-Raphson refinement pass for near misses, and error-driven
//! subdivision at the worst interior sample.
//!
//! Based on fit-curve by Philip J. Schneider (Graphics Gems, 1990).

use kurbo::{CubicBez, Point, Vec2};

use crate::bezier::{self, GEOMETRY_EPSILON};
use crate::error::CoreError;

/// Deviation measurement for the most recent candidate curve.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FitError {
    /// Largest Euclidean deviation over the interior samples.
    pub max_error: f64,
    /// Absolute sample index where the deviation peaks, or `None` when the
    /// range has no interior sample.
    pub index: Option<usize>,
}

/// Publishes the last evaluated [`FitError`] so callers can pick split points.
#[derive(Clone, Copy, Debug, Default)]
pub struct FitErrorTracker {
    pub current: FitError,
}

/// Inclusive sample-index interval covered by one fitted segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleRange {
    pub start: usize,
    pub end: usize,
}

impl SampleRange {
    /// Number of samples the range covers.
    pub fn sample_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// A fitted cubic chain with the sample range each segment covers.
#[derive(Clone, Debug, Default)]
pub struct SketchFit {
    pub curves: Vec<CubicBez>,
    pub ranges: Vec<SampleRange>,
}

impl SketchFit {
    fn push(&mut self, curve: CubicBez, range: SampleRange) {
        self.curves.push(curve);
        self.ranges.push(range);
    }
}

/// Fit a stroke with cubic segments whose maximum deviation is at most
/// `fine_tolerance`, subdividing as far as the input granularity allows.
///
/// A near miss within `coarse_tolerance` earns exactly one Newton refinement
/// pass before the segment is subdivided. `fit_error` always ends up holding
/// the last evaluated deviation.
pub fn fit_sketch(
    points: &[Point],
    fine_tolerance: f64,
    coarse_tolerance: f64,
    fit_error: &mut FitErrorTracker,
) -> Result<SketchFit, CoreError> {
    if points.len() < 2 {
        return Err(CoreError::TooFewSamples {
            required: 2,
            actual: points.len(),
        });
    }

    let mut fit = SketchFit::default();
    let whole = SampleRange {
        start: 0,
        end: points.len() - 1,
    };
    fit_range(
        points,
        whole,
        None,
        None,
        fine_tolerance,
        coarse_tolerance,
        fit_error,
        &mut fit,
    );
    log::debug!(
        "fitted {} samples into {} segments",
        points.len(),
        fit.curves.len()
    );
    Ok(fit)
}

/// Recursive fitting step. Tangent overrides carry split tangents across
/// subdivision boundaries; `None` means "derive from the range's own chords".
#[allow(clippy::too_many_arguments)]
fn fit_range(
    points: &[Point],
    range: SampleRange,
    start_tangent: Option<Vec2>,
    end_tangent: Option<Vec2>,
    fine_tolerance: f64,
    coarse_tolerance: f64,
    tracker: &mut FitErrorTracker,
    out: &mut SketchFit,
) {
    if range.sample_count() < 2 {
        return;
    }
    let slice = &points[range.start..=range.end];
    let last = slice.len() - 1;

    let left_tangent =
        start_tangent.unwrap_or_else(|| bezier::normalize_or_zero(slice[1] - slice[0]));
    let right_tangent =
        end_tangent.unwrap_or_else(|| -bezier::normalize_or_zero(slice[last] - slice[last - 1]));

    let mut parameters = chord_length_parameterize(slice);
    let mut curve = generate_bezier(slice, &parameters, left_tangent, right_tangent);
    let mut error = max_interior_error(slice, curve, &parameters, range.start);
    tracker.current = error;

    if error.max_error <= fine_tolerance {
        out.push(curve, range);
        return;
    }

    if error.max_error <= coarse_tolerance {
        // A single refinement pass keeps pen response predictable.
        for i in 1..last {
            parameters[i] =
                bezier::refine_parameter(curve, slice[i], parameters[i]).clamp(0.0, 1.0);
        }
        curve = generate_bezier(slice, &parameters, left_tangent, right_tangent);
        error = max_interior_error(slice, curve, &parameters, range.start);
        tracker.current = error;

        if error.max_error <= fine_tolerance {
            out.push(curve, range);
            return;
        }
    }

    let Some(split_index) = error.index else {
        out.push(curve, range);
        return;
    };
    if split_index == range.start || split_index == range.end {
        out.push(curve, range);
        return;
    }
    let Some(tangent) = bezier::split_tangent(points, split_index) else {
        out.push(curve, range);
        return;
    };

    fit_range(
        points,
        SampleRange {
            start: range.start,
            end: split_index,
        },
        Some(left_tangent),
        Some(tangent),
        fine_tolerance,
        coarse_tolerance,
        tracker,
        out,
    );
    fit_range(
        points,
        SampleRange {
            start: split_index,
            end: range.end,
        },
        Some(-tangent),
        Some(right_tangent),
        fine_tolerance,
        coarse_tolerance,
        tracker,
        out,
    );
}

/// Assign parameters by accumulated chord length, normalized to [0, 1].
///
/// A degenerate total length yields all zeros.
pub(crate) fn chord_length_parameterize(points: &[Point]) -> Vec<f64> {
    let mut parameters = Vec::with_capacity(points.len());
    parameters.push(0.0);

    let mut total = 0.0;
    for i in 1..points.len() {
        total += (points[i] - points[i - 1]).hypot();
        parameters.push(total);
    }
    if total < GEOMETRY_EPSILON {
        return vec![0.0; points.len()];
    }
    parameters.iter().map(|distance| distance / total).collect()
}

/// Least-squares solve for the two handle magnitudes along fixed end tangents.
///
/// A singular normal-equation matrix or a zero chord falls back to handles a
/// third of the chord out along each tangent.
pub(crate) fn generate_bezier(
    points: &[Point],
    parameters: &[f64],
    left_tangent: Vec2,
    right_tangent: Vec2,
) -> CubicBez {
    let first = points[0];
    let last = points[points.len() - 1];
    let chord = (last - first).hypot();
    let baseline = CubicBez::new(first, first, last, last);

    let mut c = [[0.0; 2]; 2];
    let mut x = [0.0; 2];
    for (i, &u) in parameters.iter().enumerate() {
        let ux = 1.0 - u;
        let a0 = left_tangent * (3.0 * u * ux * ux);
        let a1 = right_tangent * (3.0 * ux * u * u);

        c[0][0] += a0.dot(a0);
        c[0][1] += a0.dot(a1);
        c[1][0] += a0.dot(a1);
        c[1][1] += a1.dot(a1);

        let residual = points[i] - bezier::eval(baseline, u);
        x[0] += a0.dot(residual);
        x[1] += a1.dot(residual);
    }

    let det = c[0][0] * c[1][1] - c[1][0] * c[0][1];
    let (alpha_left, alpha_right) = if det.abs() < GEOMETRY_EPSILON || chord < GEOMETRY_EPSILON {
        let third = chord / 3.0;
        (third, third)
    } else {
        (
            (x[0] * c[1][1] - x[1] * c[0][1]) / det,
            (c[0][0] * x[1] - c[1][0] * x[0]) / det,
        )
    };

    CubicBez::new(
        first,
        first + left_tangent * alpha_left,
        last + right_tangent * alpha_right,
        last,
    )
}

/// Largest Euclidean deviation over the interior samples of a range.
///
/// Ranges with fewer than three samples have no interior and report zero.
fn max_interior_error(
    points: &[Point],
    curve: CubicBez,
    parameters: &[f64],
    offset: usize,
) -> FitError {
    if points.len() < 3 {
        return FitError {
            max_error: 0.0,
            index: None,
        };
    }

    let mut worst = FitError::default();
    for i in 1..points.len() - 1 {
        let deviation = (bezier::eval(curve, parameters[i]) - points[i]).hypot();
        if worst.index.is_none() || deviation > worst.max_error {
            worst = FitError {
                max_error: deviation,
                index: Some(offset + i),
            };
        }
    }
    worst
}

//! Graph fitter: fits the (time, progress) easing samples of a gesture with
//! one cubic per sketch segment.
//!
//! Shares the tangent and least-squares solve of the sketch fitter, but the
//! subdivision is driven entirely by the split indices handed over from the
//! sketch fit, so the timing chain's breakpoints line up with the sketch
//! segment boundaries.

use kurbo::{CubicBez, Point, Vec2};

use crate::bezier;
use crate::path_fitting::{chord_length_parameterize, generate_bezier};

/// Fit the easing samples, breaking the chain exactly at `split_indices`.
///
/// Indices outside the open interval of the sample list are ignored. The
/// result carries one cubic per sub-range, in sample order.
pub fn fit_graph(points: &[Point], split_indices: &[usize]) -> Vec<CubicBez> {
    if points.len() < 2 {
        return Vec::new();
    }

    let mut splits: Vec<usize> = split_indices
        .iter()
        .copied()
        .filter(|&index| index > 0 && index + 1 < points.len())
        .collect();
    splits.sort_unstable();
    splits.dedup();

    let mut curves = Vec::with_capacity(splits.len() + 1);
    fit_range(points, 0, points.len() - 1, None, None, &splits, &mut curves);
    curves
}

/// Fit one range, then subdivide at the provided index with the worst
/// deviation until no provided index is left inside the range.
fn fit_range(
    points: &[Point],
    start: usize,
    end: usize,
    start_tangent: Option<Vec2>,
    end_tangent: Option<Vec2>,
    splits: &[usize],
    out: &mut Vec<CubicBez>,
) {
    if end <= start {
        return;
    }
    let slice = &points[start..=end];
    let last = slice.len() - 1;

    let left_tangent =
        start_tangent.unwrap_or_else(|| bezier::normalize_or_zero(slice[1] - slice[0]));
    let right_tangent =
        end_tangent.unwrap_or_else(|| -bezier::normalize_or_zero(slice[last] - slice[last - 1]));

    let parameters = chord_length_parameterize(slice);
    let curve = generate_bezier(slice, &parameters, left_tangent, right_tangent);

    let mut split = None;
    let mut worst = 0.0;
    for &index in splits {
        if index <= start || index >= end {
            continue;
        }
        let deviation = (bezier::eval(curve, parameters[index - start]) - points[index]).hypot();
        if split.is_none() || deviation > worst {
            split = Some(index);
            worst = deviation;
        }
    }

    let Some(index) = split else {
        out.push(curve);
        return;
    };

    // A degenerate split tangent falls back to the chord-derived range
    // tangents on each side.
    let tangent = bezier::split_tangent(points, index);
    fit_range(points, start, index, Some(left_tangent), tangent, splits, out);
    fit_range(
        points,
        index,
        end,
        tangent.map(|t| -t),
        Some(right_tangent),
        splits,
        out,
    );
}

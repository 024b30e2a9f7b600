//! Fitting and display configuration shared with the host application.

use serde::{Deserialize, Serialize};

/// Tunable options consumed by the geometric core.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Maximum deviation allowed between the stroke and the fitted curve,
    /// in pixels.
    pub fit_tolerance_px: f64,
    /// Multiplier taking the fine tolerance to the coarse one under which a
    /// single refinement pass is attempted before subdividing.
    pub coarse_error_weight: f64,
    /// Drawn size of the animated object. Display only.
    pub object_size_px: f64,
    /// Stroke width used when rendering paths. Display only.
    pub line_weight_px: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            fit_tolerance_px: 4.0,
            coarse_error_weight: 25.0,
            object_size_px: 24.0,
            line_weight_px: 2.0,
        }
    }
}

impl FitConfig {
    /// Tolerance a segment must meet to be accepted.
    pub fn fine_tolerance(&self) -> f64 {
        self.fit_tolerance_px
    }

    /// Tolerance under which a near miss is refined instead of subdivided.
    pub fn coarse_tolerance(&self) -> f64 {
        self.fit_tolerance_px * self.coarse_error_weight
    }
}

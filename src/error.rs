//! Error taxonomy for the geometric core.
//!
//! Only precondition violations surface to callers. Degenerate geometry
//! (zero chords, singular solves, coincident samples) and non-finite
//! intermediates are absorbed at the point of computation by documented
//! fallbacks and never reach this enum.

use thiserror::Error;

/// Precondition violations reported by the core's public operations.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CoreError {
    /// Fewer input samples than the operation can work with.
    #[error("need at least {required} samples, got {actual}")]
    TooFewSamples { required: usize, actual: usize },

    /// A mutation referenced a segment the path does not have.
    #[error("segment index {index} out of range for {segment_count} segments")]
    SegmentOutOfRange { index: usize, segment_count: usize },

    /// A split parameter outside the open unit interval.
    #[error("split parameter {0} must be finite and strictly inside (0, 1)")]
    SplitParameterOutOfRange(f64),

    /// The path does not have enough keyframes to edit.
    #[error("path needs at least two keyframes, got {0}")]
    PathNotEditable(usize),
}

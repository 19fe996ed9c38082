use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Every failure mode the core can produce. Matrix shape problems, Kalman
/// shape problems, and the two intentionally-abstract-type errors all share
/// one enum, the way the teacher keeps a single `KalmanError` per concern
/// rather than nesting source-specific error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerError {
    /// `Matrix::zero` / `Matrix::identity` called with a dimension < 1.
    InvalidDimension,
    /// Elementwise or product arithmetic over matrices with incompatible sizes.
    ShapeMismatch,
    /// LU decomposition attempted on a non-square matrix.
    NotSquare,
    /// Elimination hit a true zero pivot despite the epsilon guard.
    NonInvertible,
    /// A Kalman `update` measurement's shape differs from `H * x`.
    WrongMeasurementShape,
    /// `Layer::hit` called with an `x` that doesn't match the layer's own.
    WrongLayerX,
    /// The abstract base track was instantiated or asked for its intercept.
    Unimplemented,
}

impl Display for TrackerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let msg = match self {
            TrackerError::InvalidDimension => "invalid matrix dimension (must be >= 1)",
            TrackerError::ShapeMismatch => "matrices do not have compatible shapes",
            TrackerError::NotSquare => "LU decomposition requires a square matrix",
            TrackerError::NonInvertible => "matrix is not invertible",
            TrackerError::WrongMeasurementShape => "measurement shape does not match H * x",
            TrackerError::WrongLayerX => "hit x does not match this layer's x",
            TrackerError::Unimplemented => "abstract track has no concrete implementation",
        };
        write!(f, "{}", msg)
    }
}

impl Error for TrackerError {}

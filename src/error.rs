//! Batch-level error type.
//!
//! Every failure here is fatal for the batch: the computation is
//! deterministic, so nothing is retried and no partial result tables are
//! emitted. "Split not needed" is deliberately *not* an error; see
//! [`crate::cal::partition::SplitOutcome`].

#[derive(Debug, Clone, PartialEq)]
pub enum QuantError {
    /// Fewer than two distinct concentration ratios are available for a fit.
    InsufficientData { distinct_points: usize },
    /// The fitted slope is (near) zero, so concentration-from-response
    /// inversion is undefined.
    DegenerateModel { slope: f64 },
    /// A calibration row is missing its nominal concentration.
    MissingReference { sample_id: String },
    /// A malformed or out-of-contract input row (bad numerics, unknown row
    /// type, non-positive IS response).
    InvalidRow { line: usize, message: String },
    /// Configuration values that cannot be used (non-positive IS
    /// concentration, inverted accuracy band, ...).
    InvalidConfig { message: String },
    /// File-level read/write failure.
    Io { message: String },
}

impl std::fmt::Display for QuantError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuantError::InsufficientData { distinct_points } => write!(
                f,
                "Cannot fit calibration line: {distinct_points} distinct concentration ratio(s), need at least 2."
            ),
            QuantError::DegenerateModel { slope } => write!(
                f,
                "Degenerate calibration fit (slope = {slope:e}): concentration inversion is undefined."
            ),
            QuantError::MissingReference { sample_id } => write!(
                f,
                "Calibration row '{sample_id}' has no nominal concentration."
            ),
            QuantError::InvalidRow { line, message } => {
                write!(f, "Invalid input row at line {line}: {message}")
            }
            QuantError::InvalidConfig { message } => write!(f, "Invalid configuration: {message}"),
            QuantError::Io { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for QuantError {}

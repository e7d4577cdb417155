//! Error types for analysis operations.
//!
//! Only contract violations are errors. Degenerate numeric conditions
//! (silence, zero-energy spectra, undetectable pitch) have defined fallback
//! values and never surface here.

use thiserror::Error;

/// Errors returned by analysis operations when a caller breaks an input contract.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// Two buffers that must have equal length do not.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Length of the reference buffer.
        expected: usize,
        /// Length of the offending buffer.
        actual: usize,
    },

    /// A required buffer was empty.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// A numeric parameter is missing, non-finite, or out of range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Name of the parameter.
        name: &'static str,
        /// Description of why the value was rejected.
        reason: String,
    },

    /// An injected filterbank does not match the spectrum it is applied to.
    #[error("filterbank expects {expected} bins, spectrum has {actual}")]
    FilterbankShape {
        /// Bin count of each filter row.
        expected: usize,
        /// Amplitude bin count of the spectrum.
        actual: usize,
    },
}

impl AnalysisError {
    /// Create an invalid parameter error.
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Check that two lengths agree.
    pub(crate) fn check_len(expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(AnalysisError::LengthMismatch { expected, actual })
        }
    }

    /// Check that a sample rate is finite and positive.
    pub(crate) fn check_sample_rate(sample_rate: f32) -> Result<()> {
        if sample_rate.is_finite() && sample_rate > 0.0 {
            Ok(())
        } else {
            Err(AnalysisError::invalid(
                "sample_rate",
                format!("must be finite and positive, got {sample_rate}"),
            ))
        }
    }
}

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_mismatch_display() {
        let err = AnalysisError::LengthMismatch {
            expected: 8,
            actual: 5,
        };
        assert_eq!(err.to_string(), "length mismatch: expected 8, got 5");
    }

    #[test]
    fn invalid_parameter_display() {
        let err = AnalysisError::invalid("filter_order", "must be at least 2");
        assert_eq!(
            err.to_string(),
            "invalid parameter 'filter_order': must be at least 2"
        );
    }

    #[test]
    fn sample_rate_check() {
        assert!(AnalysisError::check_sample_rate(44100.0).is_ok());
        assert!(AnalysisError::check_sample_rate(0.0).is_err());
        assert!(AnalysisError::check_sample_rate(f32::NAN).is_err());
    }
}

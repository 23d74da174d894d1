// src/error.rs

use thiserror::Error;

/// Errors returned by the numerical core (smoothing, period overlay,
/// settling time, spectrogram). The core never recovers from these; callers
/// decide how to present them.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Smoothing window / polynomial order combination is unusable.
    #[error("invalid smoothing window: {reason}")]
    InvalidWindow { reason: String },

    /// Signal is shorter than the window the operation needs.
    #[error("insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Fewer than two troughs, so no period can be measured.
    #[error("insufficient periodicity: found {troughs} trough(s), need at least 2")]
    InsufficientPeriodicity { troughs: usize },

    /// Two sequences that must be paired sample-for-sample differ in length.
    #[error("length mismatch: {left_name} has {left} samples but {right_name} has {right}")]
    LengthMismatch {
        left_name: &'static str,
        left: usize,
        right_name: &'static str,
        right: usize,
    },

    /// No falling edge from `step_high` to `step_low` in the command signal.
    #[error("no transition from {step_high} to {step_low} found in command signal")]
    TransitionNotFound { step_high: f64, step_low: f64 },

    /// Response never entered the tolerance band after the transition.
    #[error("response never dropped to {threshold} after transition at sample {transition_index}")]
    SettlingNotReached {
        transition_index: usize,
        threshold: f64,
    },

    /// Time base goes backwards.
    #[error("time base decreases at sample {index}")]
    NonMonotonicTimeBase { index: usize },

    /// Sample period (or rate) is zero, negative or not finite.
    #[error("invalid sample period: {0}")]
    InvalidSamplePeriod(f64),

    /// A histogram was requested with zero bins.
    #[error("histogram needs at least one bin, got {0}")]
    InvalidBinCount(usize),
}

impl AnalysisError {
    pub fn invalid_window(reason: impl Into<String>) -> Self {
        Self::InvalidWindow {
            reason: reason.into(),
        }
    }

    /// Returns `Err(LengthMismatch)` unless both lengths agree.
    pub fn check_lengths(
        left_name: &'static str,
        left: usize,
        right_name: &'static str,
        right: usize,
    ) -> Result<(), Self> {
        if left == right {
            Ok(())
        } else {
            Err(Self::LengthMismatch {
                left_name,
                left,
                right_name,
                right,
            })
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_lengths_accepts_equal() {
        assert!(AnalysisError::check_lengths("signal", 4, "time", 4).is_ok());
    }

    #[test]
    fn check_lengths_reports_both_sides() {
        let err = AnalysisError::check_lengths("response", 3, "command", 5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "length mismatch: response has 3 samples but command has 5"
        );
    }

    #[test]
    fn errors_box_into_dyn_error() {
        fn fails() -> Result<(), Box<dyn std::error::Error>> {
            Err(AnalysisError::InsufficientPeriodicity { troughs: 1 })?;
            Ok(())
        }
        let msg = fails().unwrap_err().to_string();
        assert!(msg.contains("found 1 trough(s)"));
    }
}

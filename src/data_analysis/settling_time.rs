// src/data_analysis/settling_time.rs

//! Step-response timing for the pressure controller.
//!
//! The command is a clean discretized step produced by the microcontroller,
//! so the transition is located by exact comparison with the commanded
//! levels. Noisy or continuous command traces must be quantized before they
//! get here; they are not tolerated silently.

use ndarray::Array1;

use crate::error::{AnalysisError, AnalysisResult};

/// Outcome of a settling-time measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettlingResult {
    /// Seconds from the falling edge until the response entered the band.
    pub settling_time_s: f64,
    /// First sample commanded at `step_low` (the falling edge).
    pub transition_index: usize,
    /// First sample at or after the edge inside the tolerance band.
    pub settled_index: usize,
}

/// Index of the first falling edge: `command[i] == step_low` right after
/// `command[i - 1] == step_high`.
pub fn find_falling_edge(
    command: &Array1<f64>,
    step_high: f64,
    step_low: f64,
) -> AnalysisResult<usize> {
    (1..command.len())
        .find(|&i| command[i] == step_low && command[i - 1] == step_high)
        .ok_or(AnalysisError::TransitionNotFound {
            step_high,
            step_low,
        })
}

fn validate_inputs(
    response: &Array1<f64>,
    command: &Array1<f64>,
    sample_period: f64,
) -> AnalysisResult<()> {
    AnalysisError::check_lengths("response", response.len(), "command", command.len())?;
    if !(sample_period.is_finite() && sample_period > 0.0) {
        return Err(AnalysisError::InvalidSamplePeriod(sample_period));
    }
    Ok(())
}

fn first_at_or_below(
    response: &Array1<f64>,
    from: usize,
    threshold: f64,
) -> AnalysisResult<usize> {
    (from..response.len())
        .find(|&i| response[i] <= threshold)
        .ok_or(AnalysisError::SettlingNotReached {
            transition_index: from,
            threshold,
        })
}

/// Time for `response` to fall to `tolerance_fraction * step_high` after the
/// command steps from `step_high` to `step_low`.
pub fn estimate_settling_time(
    response: &Array1<f64>,
    command: &Array1<f64>,
    step_high: f64,
    step_low: f64,
    tolerance_fraction: f64,
    sample_period: f64,
) -> AnalysisResult<SettlingResult> {
    validate_inputs(response, command, sample_period)?;

    let transition_index = find_falling_edge(command, step_high, step_low)?;
    let settled_index =
        first_at_or_below(response, transition_index, tolerance_fraction * step_high)?;

    Ok(SettlingResult {
        settling_time_s: (settled_index - transition_index) as f64 * sample_period,
        transition_index,
        settled_index,
    })
}

/// First-order time constant of the same falling step: the time for the
/// response to cover 63.2 % of the way from `step_high` to `step_low`.
///
/// Returns the time constant in seconds together with the transition index.
pub fn estimate_time_constant(
    response: &Array1<f64>,
    command: &Array1<f64>,
    step_high: f64,
    step_low: f64,
    sample_period: f64,
) -> AnalysisResult<(f64, usize)> {
    validate_inputs(response, command, sample_period)?;

    let transition_index = find_falling_edge(command, step_high, step_low)?;
    let threshold = step_low + (step_high - step_low) * (-1.0f64).exp();
    let crossed = first_at_or_below(response, transition_index, threshold)?;

    Ok((
        (crossed - transition_index) as f64 * sample_period,
        transition_index,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const DT: f64 = 0.01;

    fn step_fixture(tau: f64) -> (Array1<f64>, Array1<f64>) {
        let command = Array1::from_shape_fn(500, |i| if i < 200 { 0.2 } else { 0.0 });
        let response = Array1::from_shape_fn(500, |i| {
            if i < 200 {
                0.2
            } else {
                0.2 * (-((i - 200) as f64) * DT / tau).exp()
            }
        });
        (response, command)
    }

    #[test]
    fn exponential_decay_settles_near_three_tau() {
        let (response, command) = step_fixture(0.5);
        let result = estimate_settling_time(&response, &command, 0.2, 0.0, 0.05, DT).unwrap();
        assert_eq!(result.transition_index, 200);
        assert_abs_diff_eq!(result.settling_time_s, 1.5, epsilon = DT + 1e-9);
        assert_eq!(
            result.settled_index - result.transition_index,
            (result.settling_time_s / DT).round() as usize
        );
    }

    #[test]
    fn time_constant_of_exponential_decay() {
        let (response, command) = step_fixture(0.5);
        let (tau, t0) = estimate_time_constant(&response, &command, 0.2, 0.0, DT).unwrap();
        assert_eq!(t0, 200);
        assert_abs_diff_eq!(tau, 0.5, epsilon = DT + 1e-9);
    }

    #[test]
    fn missing_exact_low_level_is_not_a_transition() {
        let (response, _) = step_fixture(0.5);
        let command = Array1::from_shape_fn(500, |i| if i < 200 { 0.2 } else { 0.001 });
        let err = estimate_settling_time(&response, &command, 0.2, 0.0, 0.05, DT).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::TransitionNotFound {
                step_high: 0.2,
                step_low: 0.0
            }
        );
    }

    #[test]
    fn rising_edge_is_ignored() {
        let command = Array1::from(vec![0.0, 0.0, 0.2, 0.2]);
        let response = Array1::from(vec![0.0, 0.0, 0.2, 0.2]);
        assert!(matches!(
            estimate_settling_time(&response, &command, 0.2, 0.0, 0.05, DT),
            Err(AnalysisError::TransitionNotFound { .. })
        ));
    }

    #[test]
    fn slow_response_never_settles() {
        let (response, command) = step_fixture(50.0);
        let err = estimate_settling_time(&response, &command, 0.2, 0.0, 0.05, DT).unwrap_err();
        match err {
            AnalysisError::SettlingNotReached {
                transition_index,
                threshold,
            } => {
                assert_eq!(transition_index, 200);
                assert_abs_diff_eq!(threshold, 0.01, epsilon = 1e-12);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn response_already_in_band_settles_immediately() {
        let command = Array1::from(vec![0.2, 0.2, 0.0, 0.0]);
        let response = Array1::from(vec![0.2, 0.2, 0.0, 0.0]);
        let result = estimate_settling_time(&response, &command, 0.2, 0.0, 0.05, DT).unwrap();
        assert_eq!(result.transition_index, 2);
        assert_eq!(result.settled_index, 2);
        assert_eq!(result.settling_time_s, 0.0);
    }

    #[test]
    fn length_mismatch() {
        let err = estimate_settling_time(
            &Array1::zeros(3),
            &Array1::zeros(4),
            0.2,
            0.0,
            0.05,
            DT,
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::LengthMismatch { .. }));
    }

    #[test]
    fn non_positive_sample_period() {
        let (response, command) = step_fixture(0.5);
        assert_eq!(
            estimate_settling_time(&response, &command, 0.2, 0.0, 0.05, 0.0).unwrap_err(),
            AnalysisError::InvalidSamplePeriod(0.0)
        );
    }
}

// tests/settling_time_test.rs

use afm_csv_render::data_analysis::settling_time::{
    estimate_settling_time, estimate_time_constant, find_falling_edge,
};
use afm_csv_render::AnalysisError;
use approx::assert_abs_diff_eq;
use ndarray::Array1;

const SAMPLE_PERIOD: f64 = 0.01;

/// 200 samples commanded at 0.2 psi, then 300 at 0, with the measured
/// pressure decaying exponentially after the edge.
fn pressure_step(tau: f64) -> (Array1<f64>, Array1<f64>) {
    let command = Array1::from_shape_fn(500, |i| if i < 200 { 0.2 } else { 0.0 });
    let response = Array1::from_shape_fn(500, |i| {
        if i < 200 {
            0.2
        } else {
            0.2 * (-((i - 200) as f64) * SAMPLE_PERIOD / tau).exp()
        }
    });
    (response, command)
}

#[test]
fn settling_is_three_time_constants() {
    for tau in [0.2, 0.5, 0.8] {
        let (response, command) = pressure_step(tau);
        let result =
            estimate_settling_time(&response, &command, 0.2, 0.0, 0.05, SAMPLE_PERIOD).unwrap();
        assert_eq!(result.transition_index, 200);
        // ln(20) ~ 3.0 time constants to reach 5 %.
        assert_abs_diff_eq!(
            result.settling_time_s,
            tau * 20f64.ln(),
            epsilon = SAMPLE_PERIOD
        );
        assert!(response[result.settled_index] <= 0.05 * 0.2);
    }
}

#[test]
fn time_constant_matches_decay() {
    let (response, command) = pressure_step(0.5);
    let (tau, t0) = estimate_time_constant(&response, &command, 0.2, 0.0, SAMPLE_PERIOD).unwrap();
    assert_eq!(t0, 200);
    assert_abs_diff_eq!(tau, 0.5, epsilon = SAMPLE_PERIOD + 1e-9);
}

#[test]
fn approximate_low_level_is_not_a_transition() {
    let (response, mut command) = pressure_step(0.5);
    command.mapv_inplace(|c| if c == 0.0 { 1e-6 } else { c });
    assert_eq!(
        estimate_settling_time(&response, &command, 0.2, 0.0, 0.05, SAMPLE_PERIOD),
        Err(AnalysisError::TransitionNotFound {
            step_high: 0.2,
            step_low: 0.0
        })
    );
}

#[test]
fn first_of_several_edges_is_used() {
    let command = Array1::from(vec![0.2, 0.0, 0.2, 0.2, 0.0]);
    assert_eq!(find_falling_edge(&command, 0.2, 0.0), Ok(1));
}

#[test]
fn mismatched_lengths_are_rejected() {
    let response = Array1::<f64>::zeros(10);
    let command = Array1::<f64>::zeros(12);
    assert!(matches!(
        estimate_settling_time(&response, &command, 0.2, 0.0, 0.05, SAMPLE_PERIOD),
        Err(AnalysisError::LengthMismatch { .. })
    ));
}

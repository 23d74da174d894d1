// src/data_analysis/fft_utils.rs

use ndarray::Array1;
use num_complex::Complex32;
use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// Forward real FFT plan for frames of `n` samples.
pub fn plan_forward(n: usize) -> Arc<dyn RealToComplex<f32>> {
    RealFftPlanner::<f32>::new().plan_fft_forward(n)
}

/// Squared magnitude of the real FFT of `frame` using `fft`, bins
/// `0..=n/2`. Returns `None` for an empty frame, a frame whose length does
/// not match the plan, or if the transform fails.
pub fn power_spectrum(fft: &dyn RealToComplex<f32>, frame: &[f32]) -> Option<Vec<f32>> {
    if frame.is_empty() || frame.len() != fft.len() {
        return None;
    }
    let mut input = frame.to_vec();
    let mut output: Vec<Complex32> = fft.make_output_vec();
    fft.process(&mut input, &mut output).ok()?;
    Some(output.iter().map(|c| c.norm_sqr()).collect())
}

/// Bin centre frequencies (Hz) matching [`power_spectrum`] for a frame of
/// `n` samples.
pub fn rfft_frequencies(n: usize, sample_rate: f64) -> Array1<f64> {
    if n == 0 || !(sample_rate > 0.0) {
        return Array1::zeros(0);
    }
    let resolution = sample_rate / n as f64;
    Array1::from_shape_fn(n / 2 + 1, |k| k as f64 * resolution)
}

/// Symmetric Hann window.
pub fn hann_window(n: usize) -> Array1<f32> {
    match n {
        0 => Array1::zeros(0),
        1 => Array1::ones(1),
        _ => Array1::from_shape_fn(n, |i| {
            (0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (n as f64 - 1.0)).cos()))
                as f32
        }),
    }
}

// src/data_analysis/spectrogram.rs

use ndarray::{s, Array1, Array2};

use crate::constants::SPECTROGRAM_POWER_FLOOR;
use crate::data_analysis::fft_utils;
use crate::error::{AnalysisError, AnalysisResult};

/// Short-time power spectrum of one signal.
#[derive(Debug, Clone)]
pub struct SpectrogramData {
    /// Centre time (s) of each window.
    pub times: Array1<f64>,
    /// Bin frequencies (Hz), DC to Nyquist.
    pub frequencies: Array1<f64>,
    /// Power spectral density in dB, shape `(times, frequencies)`.
    pub power_db: Array2<f64>,
}

/// Hann-windowed STFT of `signal`.
///
/// Each window has its mean removed before the transform so a scan offset
/// does not swamp the low bins. Power is a one-sided density
/// (units²/Hz) expressed in dB.
pub fn calculate_spectrogram(
    signal: &Array1<f64>,
    sample_rate: f64,
    window_s: f64,
    overlap_ratio: f64,
) -> AnalysisResult<SpectrogramData> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(AnalysisError::InvalidSamplePeriod(1.0 / sample_rate));
    }
    if !(0.0..1.0).contains(&overlap_ratio) {
        return Err(AnalysisError::invalid_window(format!(
            "overlap ratio {overlap_ratio} must be in [0, 1)"
        )));
    }
    let window_len = (window_s * sample_rate).round();
    if !(window_len >= 2.0) {
        return Err(AnalysisError::invalid_window(format!(
            "spectrogram window of {window_s} s is under two samples at {sample_rate} Hz"
        )));
    }
    let window_len = window_len as usize;
    let total_len = signal.len();
    if window_len > total_len {
        return Err(AnalysisError::InsufficientData {
            required: window_len,
            actual: total_len,
        });
    }

    let overlap = (window_len as f64 * overlap_ratio).round() as usize;
    let step = window_len.saturating_sub(overlap).max(1);
    let num_windows = (total_len - window_len) / step + 1;

    let fft = fft_utils::plan_forward(window_len);
    let window_func = fft_utils::hann_window(window_len);
    let window_energy: f64 = window_func.iter().map(|w| (*w as f64).powi(2)).sum();
    let density_scale = 1.0 / (sample_rate * window_energy);

    let frequencies = fft_utils::rfft_frequencies(window_len, sample_rate);
    let num_bins = frequencies.len();
    let mut power_db = Array2::<f64>::zeros((num_windows, num_bins));
    let mut times = Array1::<f64>::zeros(num_windows);

    for w in 0..num_windows {
        let start = w * step;
        let segment = signal.slice(s![start..start + window_len]);
        let mean = segment.sum() / window_len as f64;
        let frame: Vec<f32> = segment
            .iter()
            .zip(window_func.iter())
            .map(|(x, win)| (x - mean) as f32 * win)
            .collect();

        let power = fft_utils::power_spectrum(fft.as_ref(), &frame).ok_or_else(|| {
            AnalysisError::invalid_window(format!("FFT failed for window of {window_len} samples"))
        })?;

        for (k, p) in power.iter().enumerate().take(num_bins) {
            // Interior bins fold in the mirrored negative frequencies.
            let one_sided = if k == 0 || (window_len % 2 == 0 && k == num_bins - 1) {
                1.0
            } else {
                2.0
            };
            let density = *p as f64 * density_scale * one_sided;
            power_db[[w, k]] = 10.0 * density.max(SPECTROGRAM_POWER_FLOOR).log10();
        }
        times[w] = (start as f64 + window_len as f64 / 2.0) / sample_rate;
    }

    Ok(SpectrogramData {
        times,
        frequencies,
        power_db,
    })
}

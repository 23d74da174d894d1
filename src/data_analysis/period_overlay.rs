// src/data_analysis/period_overlay.rs

//! Local oscillation period of a scan signal, measured trough to trough.
//!
//! The signal is Savitzky-Golay smoothed, strict local minima are taken as
//! troughs, and each inter-trough interval is spread over the samples it
//! covers so the result can be drawn against the same time axis as the
//! signal itself.

use ndarray::Array1;

use crate::constants::{MIN_SMOOTHING_WINDOW, SMOOTHING_WINDOW_DIVISOR};
use crate::data_analysis::savitzky_golay::{find_troughs, min_window_for_order, SavitzkyGolay};
use crate::error::{AnalysisError, AnalysisResult};

/// Piecewise-constant "period at time t" series.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodOverlay {
    /// One period value (seconds) per input sample.
    pub values: Array1<f64>,
    /// Trough indices into the input signal, ascending.
    pub troughs: Vec<usize>,
    /// `periods[k]` is the time from `troughs[k]` to `troughs[k + 1]`.
    pub periods: Vec<f64>,
}

impl PeriodOverlay {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean_period(&self) -> f64 {
        self.periods.iter().sum::<f64>() / self.periods.len() as f64
    }

    /// Largest overlay value over the second half of the record. The lead-in
    /// of a scan is often irregular, so axis limits are taken from here.
    pub fn recent_max(&self) -> f64 {
        let n = self.values.len();
        let start = if n / 2 == 0 { 0 } else { n - n / 2 };
        self.values
            .iter()
            .skip(start)
            .fold(0.0f64, |acc, &v| acc.max(v))
    }
}

/// Sample rate implied by a uniformly spaced time base, if it spans any time.
pub fn sample_rate_from_time(time: &Array1<f64>) -> Option<f64> {
    let n = time.len();
    if n < 2 {
        return None;
    }
    let span = time[n - 1] - time[0];
    if span > 0.0 && span.is_finite() {
        Some((n - 1) as f64 / span)
    } else {
        None
    }
}

/// Default smoothing window: about a tenth of a second of samples, at least
/// `MIN_SMOOTHING_WINDOW`, always odd.
pub fn default_window_size(sample_rate: f64) -> usize {
    let mut window = if sample_rate.is_finite() && sample_rate > 0.0 {
        (sample_rate / SMOOTHING_WINDOW_DIVISOR).round() as usize
    } else {
        MIN_SMOOTHING_WINDOW
    };
    window = window.max(MIN_SMOOTHING_WINDOW);
    if window % 2 == 0 {
        window += 1;
    }
    window
}

/// Estimates the trough-to-trough period at every sample of `signal`.
///
/// When `window_size` is `None` it is derived from the sample rate of `time`
/// (see [`default_window_size`]) and raised if needed to fit `poly_order`.
///
/// Samples before the first trough carry the first measured period and
/// samples from the last trough onward carry the last one.
pub fn estimate_period_overlay(
    signal: &Array1<f64>,
    time: &Array1<f64>,
    window_size: Option<usize>,
    poly_order: usize,
) -> AnalysisResult<PeriodOverlay> {
    AnalysisError::check_lengths("signal", signal.len(), "time", time.len())?;

    let window_size = match window_size {
        Some(w) => w,
        None => {
            let derived = sample_rate_from_time(time)
                .map(default_window_size)
                .unwrap_or(MIN_SMOOTHING_WINDOW);
            let floor = min_window_for_order(poly_order)?;
            if derived >= floor {
                derived
            } else if floor % 2 == 0 {
                floor + 1
            } else {
                floor
            }
        }
    };
    let filter = SavitzkyGolay::new(window_size, poly_order)?;

    if signal.len() < window_size {
        return Err(AnalysisError::InsufficientData {
            required: window_size,
            actual: signal.len(),
        });
    }
    if let Some(index) = (1..time.len()).find(|&i| time[i] < time[i - 1]) {
        return Err(AnalysisError::NonMonotonicTimeBase { index });
    }

    let smoothed = filter.smooth(signal)?;
    let troughs = find_troughs(&smoothed);
    if troughs.len() < 2 {
        return Err(AnalysisError::InsufficientPeriodicity {
            troughs: troughs.len(),
        });
    }

    let periods: Vec<f64> = troughs
        .windows(2)
        .map(|pair| time[pair[1]] - time[pair[0]])
        .collect();

    let n = signal.len();
    let mut values = Array1::<f64>::zeros(n);
    let first_trough = troughs[0];
    let last_trough = troughs[troughs.len() - 1];

    values
        .slice_mut(ndarray::s![..first_trough])
        .fill(periods[0]);
    for (pair, &period) in troughs.windows(2).zip(periods.iter()) {
        values.slice_mut(ndarray::s![pair[0]..pair[1]]).fill(period);
    }
    values
        .slice_mut(ndarray::s![last_trough..])
        .fill(periods[periods.len() - 1]);

    Ok(PeriodOverlay {
        values,
        troughs,
        periods,
    })
}

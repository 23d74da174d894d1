// src/data_analysis/distribution.rs

use ndarray::Array1;

use crate::error::{AnalysisError, AnalysisResult};

/// Value histogram and moments of one signal.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalDistribution {
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// `counts.len() + 1` bin edges, ascending.
    pub edges: Array1<f64>,
    pub counts: Vec<usize>,
}

impl SignalDistribution {
    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Legend text for the distribution panel.
    pub fn summary_label(&self) -> String {
        format!("μ = {:.2}, σ = {:.2}", self.mean, self.std_dev)
    }
}

/// Histogram of the finite samples of `values` over `bins` equal-width bins
/// spanning their min..max. The last bin includes the maximum; a constant
/// signal is binned over `value ± 0.5`.
pub fn signal_distribution(values: &Array1<f64>, bins: usize) -> AnalysisResult<SignalDistribution> {
    if bins == 0 {
        return Err(AnalysisError::InvalidBinCount(bins));
    }
    let finite: Array1<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Err(AnalysisError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }

    let mean = finite.mean().unwrap_or(0.0);
    let std_dev = finite.std(0.0);

    let (mut lo, mut hi) = finite
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if hi - lo == 0.0 {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let edges = Array1::from_shape_fn(bins + 1, |i| {
        if i == bins {
            hi
        } else {
            lo + i as f64 * width
        }
    });

    let mut counts = vec![0usize; bins];
    for &v in &finite {
        let index = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }

    Ok(SignalDistribution {
        mean,
        std_dev,
        edges,
        counts,
    })
}


// src/data_analysis/distribution.rs

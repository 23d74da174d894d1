// src/data_analysis/savitzky_golay.rs

//! Savitzky-Golay smoothing and strict local-extrema detection.
//!
//! A polynomial of degree `poly_order` is least-squares fitted to every
//! window of `window_size` samples and evaluated at the window centre.
//! The first and last `window_size / 2` samples have no centred window;
//! for those the polynomial fitted to the first (or last) full window is
//! evaluated at the edge positions instead of padding the signal.

use ndarray::Array1;

use crate::error::{AnalysisError, AnalysisResult};

/// Savitzky-Golay filter with precomputed convolution coefficients.
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    window_size: usize,
    poly_order: usize,
    centre_coeffs: Vec<f64>,
    // leading_coeffs[i] evaluates the first window's fit at sample i.
    leading_coeffs: Vec<Vec<f64>>,
    // trailing_coeffs[j] evaluates the last window's fit at sample (n - half + j).
    trailing_coeffs: Vec<Vec<f64>>,
}

impl SavitzkyGolay {
    /// Validates the window and precomputes coefficients.
    ///
    /// `window_size` must be odd and at least `poly_order + 2`, and
    /// `poly_order` must be at least 1.
    pub fn new(window_size: usize, poly_order: usize) -> AnalysisResult<Self> {
        validate_window(window_size, poly_order)?;

        let half = window_size / 2;
        let basis = orthonormal_basis(window_size, poly_order)?;

        let centre_coeffs = projection_row(&basis, half);
        let leading_coeffs = (0..half).map(|m| projection_row(&basis, m)).collect();
        let trailing_coeffs = (half + 1..window_size)
            .map(|m| projection_row(&basis, m))
            .collect();

        Ok(Self {
            window_size,
            poly_order,
            centre_coeffs,
            leading_coeffs,
            trailing_coeffs,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn poly_order(&self) -> usize {
        self.poly_order
    }

    /// Coefficients applied to a centred window (length `window_size`).
    pub fn centre_coefficients(&self) -> &[f64] {
        &self.centre_coeffs
    }

    /// Smooths `data`, returning a new array of the same length.
    pub fn smooth(&self, data: &Array1<f64>) -> AnalysisResult<Array1<f64>> {
        let n = data.len();
        let w = self.window_size;
        if n < w {
            return Err(AnalysisError::InsufficientData {
                required: w,
                actual: n,
            });
        }
        let half = w / 2;
        let mut smoothed = Array1::<f64>::zeros(n);

        let dot = |coeffs: &[f64], start: usize| -> f64 {
            coeffs
                .iter()
                .enumerate()
                .map(|(k, c)| c * data[start + k])
                .sum()
        };

        for i in half..(n - half) {
            smoothed[i] = dot(&self.centre_coeffs, i - half);
        }
        for (i, coeffs) in self.leading_coeffs.iter().enumerate() {
            smoothed[i] = dot(coeffs, 0);
        }
        let last_window_start = n - w;
        for (j, coeffs) in self.trailing_coeffs.iter().enumerate() {
            smoothed[n - half + j] = dot(coeffs, last_window_start);
        }

        Ok(smoothed)
    }
}

fn validate_window(window_size: usize, poly_order: usize) -> AnalysisResult<()> {
    if poly_order == 0 {
        return Err(AnalysisError::invalid_window(
            "polynomial order must be at least 1",
        ));
    }
    if window_size % 2 == 0 {
        return Err(AnalysisError::invalid_window(format!(
            "window size {window_size} must be odd"
        )));
    }
    let min_window = min_window_for_order(poly_order)?;
    if window_size < min_window {
        return Err(AnalysisError::invalid_window(format!(
            "window size {window_size} must be at least polynomial order {poly_order} + 2"
        )));
    }
    Ok(())
}

/// Smallest window a fit of `poly_order` accepts (`poly_order + 2`).
pub fn min_window_for_order(poly_order: usize) -> AnalysisResult<usize> {
    poly_order.checked_add(2).ok_or_else(|| {
        AnalysisError::invalid_window(format!("polynomial order {poly_order} is too large"))
    })
}

/// Orthonormal basis of the degree-`poly_order` polynomials sampled on the
/// window, one column per degree, stored as `basis[k][i]`.
///
/// Built by Arnoldi iteration on `x = (i - half) / half` starting from the
/// constant vector, with each new vector orthogonalised twice against the
/// previous ones. The monomial normal equations are never formed.
fn orthonormal_basis(window_size: usize, poly_order: usize) -> AnalysisResult<Vec<Vec<f64>>> {
    let half = (window_size / 2) as f64;
    let x: Vec<f64> = (0..window_size)
        .map(|i| (i as f64 - half) / half)
        .collect();

    let mut basis: Vec<Vec<f64>> = Vec::with_capacity(poly_order + 1);
    basis.push(vec![1.0 / (window_size as f64).sqrt(); window_size]);

    for degree in 1..=poly_order {
        let prev = &basis[degree - 1];
        let mut v: Vec<f64> = x.iter().zip(prev).map(|(xi, qi)| xi * qi).collect();
        for _ in 0..2 {
            for q in &basis {
                let proj: f64 = v.iter().zip(q).map(|(a, b)| a * b).sum();
                for (vi, qi) in v.iter_mut().zip(q) {
                    *vi -= proj * qi;
                }
            }
        }
        let norm = v.iter().map(|a| a * a).sum::<f64>().sqrt();
        if !(norm > 1e-10) {
            return Err(AnalysisError::invalid_window(format!(
                "window {window_size} cannot support polynomial order {poly_order}"
            )));
        }
        v.iter_mut().for_each(|a| *a /= norm);
        basis.push(v);
    }
    Ok(basis)
}

/// Row `m` of the least-squares projector `QQᵀ`: the convolution
/// coefficients that evaluate the window's fit at sample `m`.
fn projection_row(basis: &[Vec<f64>], m: usize) -> Vec<f64> {
    let window_size = basis[0].len();
    (0..window_size)
        .map(|i| basis.iter().map(|q| q[m] * q[i]).sum())
        .collect()
}

/// Indices `i` with `data[i] < data[i - 1]` and `data[i] < data[i + 1]`.
/// Endpoints are never reported and flat bottoms do not count.
pub fn find_troughs(data: &Array1<f64>) -> Vec<usize> {
    strict_extrema(data, |centre, neighbour| centre < neighbour)
}

/// Indices `i` with `data[i] > data[i - 1]` and `data[i] > data[i + 1]`.
pub fn find_peaks(data: &Array1<f64>) -> Vec<usize> {
    strict_extrema(data, |centre, neighbour| centre > neighbour)
}

fn strict_extrema<F>(data: &Array1<f64>, beats: F) -> Vec<usize>
where
    F: Fn(f64, f64) -> bool,
{
    let n = data.len();
    if n < 3 {
        return Vec::new();
    }
    (1..n - 1)
        .filter(|&i| beats(data[i], data[i - 1]) && beats(data[i], data[i + 1]))
        .collect()
}

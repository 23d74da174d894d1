// src/data_analysis/mod.rs

pub mod distribution;
pub mod fft_utils;
pub mod period_overlay;
pub mod savitzky_golay;
pub mod settling_time;
pub mod spectrogram;

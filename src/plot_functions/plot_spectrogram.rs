// src/plot_functions/plot_spectrogram.rs

use log::info;
use ndarray_stats::QuantileExt;
use std::error::Error;

use crate::constants::SPECTROGRAM_DYNAMIC_RANGE_DB;
use crate::data_analysis::spectrogram::{calculate_spectrogram, SpectrogramData};
use crate::data_input::log_data::{AfmLog, ColumnSelector};
use crate::plot_framework::{draw_heatmap_plot, HeatmapPalette, HeatmapPlotConfig};
use crate::render_config::RenderConfig;

fn half_step(values: &[f64]) -> f64 {
    if values.len() > 1 {
        (values[1] - values[0]) / 2.0
    } else {
        0.5
    }
}

fn heatmap_config(column_name: &str, spectrogram: SpectrogramData) -> HeatmapPlotConfig {
    let times = spectrogram.times.to_vec();
    let frequencies = spectrogram.frequencies.to_vec();
    let (dt, df) = (half_step(&times), half_step(&frequencies));

    let max_value = spectrogram.power_db.max().copied().unwrap_or(0.0);
    let min_value = max_value - SPECTROGRAM_DYNAMIC_RANGE_DB;

    let t_first = times.first().copied().unwrap_or(0.0);
    let t_last = times.last().copied().unwrap_or(0.0);
    let f_last = frequencies.last().copied().unwrap_or(0.0);

    HeatmapPlotConfig {
        title: format!("{column_name} Spectrogram"),
        x_range: (t_first - dt)..(t_last + dt),
        y_range: 0.0..(f_last + df),
        x_bins: times,
        y_bins: frequencies,
        values: spectrogram.power_db,
        x_label: "Time (s)".to_string(),
        y_label: "Frequency (Hz)".to_string(),
        min_value,
        max_value,
        palette: HeatmapPalette::Viridis,
    }
}

/// Generates the short-time power spectrum heatmap of one column.
pub fn plot_spectrogram(
    log: &AfmLog,
    selector: &ColumnSelector,
    sample_rate: f64,
    window_s: f64,
    overlap_ratio: f64,
    root_name: &str,
    config: &RenderConfig,
) -> Result<(), Box<dyn Error>> {
    let (name, signal) = log.require_column(selector)?;
    let spectrogram = calculate_spectrogram(signal, sample_rate, window_s, overlap_ratio)?;
    info!(
        "{name}: {} windows x {} frequency bins",
        spectrogram.times.len(),
        spectrogram.frequencies.len()
    );

    let heatmap = heatmap_config(name, spectrogram);
    let subtitle = format!(
        "Power spectral density (dB), {window_s} s Hann window, {:.0} % overlap",
        overlap_ratio * 100.0
    );
    draw_heatmap_plot(
        &config.output_path(root_name, "Spectrogram"),
        root_name,
        "Spectrogram",
        Some(subtitle.as_str()),
        &heatmap,
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    #[test]
    fn heatmap_bounds_cover_cells() {
        let spectrogram = SpectrogramData {
            times: Array1::from(vec![0.5, 1.0, 1.5]),
            frequencies: Array1::from(vec![0.0, 1.0, 2.0]),
            power_db: Array2::from_shape_fn((3, 3), |(t, f)| -((t + f) as f64)),
        };
        let heatmap = heatmap_config("OBD SUM (V)", spectrogram);
        assert_eq!(heatmap.x_range, 0.25..1.75);
        assert_eq!(heatmap.y_range, 0.0..2.5);
        assert_eq!(heatmap.max_value, 0.0);
        assert_eq!(heatmap.min_value, -SPECTROGRAM_DYNAMIC_RANGE_DB);
        assert_eq!(heatmap.title, "OBD SUM (V) Spectrogram");
    }
}

// src/plot_functions/plot_spectrogram.rs

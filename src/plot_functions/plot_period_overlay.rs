// src/plot_functions/plot_period_overlay.rs

use log::{info, warn};
use ndarray::Array1;
use std::error::Error;

use crate::constants::{
    COLOR_CONTEXT_SIGNAL, COLOR_PERIOD_OVERLAY, COLOR_SIGNAL, LINE_WIDTH_OVERLAY, LINE_WIDTH_PLOT,
    PERIOD_AXIS_HEADROOM,
};
use crate::data_analysis::period_overlay::{estimate_period_overlay, PeriodOverlay};
use crate::data_input::log_data::{AfmLog, ColumnSelector};
use crate::plot_framework::{
    calculate_range, draw_stacked_plot, finite_bounds, line_points, PanelConfig, PanelResult,
    PlotSeries, SecondaryAxis, UnavailablePanel,
};
use crate::render_config::RenderConfig;

/// Smoothing parameters for the trough detector.
#[derive(Debug, Clone, Copy)]
pub struct PeriodOverlaySettings {
    pub sample_rate: f64,
    pub window_size: Option<usize>,
    pub poly_order: usize,
}

fn time_series_panel(
    title: &str,
    time: &Array1<f64>,
    values: &Array1<f64>,
    y_label: &str,
    color: plotters::style::RGBColor,
) -> PanelResult {
    let data = line_points(time, values);
    let (Some((t_min, t_max)), Some((v_min, v_max))) =
        (finite_bounds(time.iter()), finite_bounds(values.iter()))
    else {
        return Err(UnavailablePanel::new(title, "No finite samples"));
    };
    let (y_min, y_max) = calculate_range(v_min, v_max);

    Ok(PanelConfig {
        title: title.to_string(),
        x_range: t_min..t_max,
        y_range: y_min..y_max,
        series: vec![PlotSeries {
            data,
            label: String::new(),
            color,
            stroke_width: LINE_WIDTH_PLOT,
        }],
        x_label: "Time (s)".to_string(),
        y_label: y_label.to_string(),
        secondary: None,
    })
}

fn overlay_axis(time: &Array1<f64>, overlay: &PeriodOverlay) -> SecondaryAxis {
    let recent_max = overlay.recent_max();
    let top = if recent_max > 0.0 {
        PERIOD_AXIS_HEADROOM * recent_max
    } else {
        1.0
    };
    SecondaryAxis {
        y_range: 0.0..top,
        y_label: "Time Between Troughs (s)".to_string(),
        series: vec![PlotSeries {
            data: line_points(time, &overlay.values),
            label: format!("Period (mean {:.3} s)", overlay.mean_period()),
            color: *COLOR_PERIOD_OVERLAY,
            stroke_width: LINE_WIDTH_OVERLAY,
        }],
    }
}

/// Generates the period overlay figure: optional context panels (for
/// example the FPGA loop delay) followed by one panel per signal with the
/// trough-to-trough period drawn in red on a twin axis.
pub fn plot_period_overlay(
    log: &AfmLog,
    signals: &[ColumnSelector],
    context_columns: &[ColumnSelector],
    settings: PeriodOverlaySettings,
    root_name: &str,
    config: &RenderConfig,
) -> Result<(), Box<dyn Error>> {
    if signals.is_empty() {
        return Err("At least one signal column is required for the period overlay".into());
    }
    let time = log.time_base(settings.sample_rate);
    info!("Sampling rate is {} Hz", settings.sample_rate);

    let mut panels: Vec<PanelResult> = Vec::new();
    for selector in context_columns {
        panels.push(match log.column(selector) {
            Some((name, values)) => {
                time_series_panel(name, &time, values, name, *COLOR_CONTEXT_SIGNAL)
            }
            None => Err(UnavailablePanel::new(
                selector.to_string(),
                "Column not found in log",
            )),
        });
    }

    for selector in signals {
        let Some((name, values)) = log.column(selector) else {
            panels.push(Err(UnavailablePanel::new(
                selector.to_string(),
                "Column not found in log",
            )));
            continue;
        };
        let title = format!("{name} Period Overlay");
        let panel = estimate_period_overlay(
            values,
            &time,
            settings.window_size,
            settings.poly_order,
        )
        .map_err(|e| {
            warn!("Period overlay for '{name}' failed: {e}");
            UnavailablePanel::new(&title, &e)
        })
        .and_then(|overlay| {
            info!(
                "{name}: {} troughs, mean period {:.4} s",
                overlay.troughs.len(),
                overlay.mean_period()
            );
            let mut panel = time_series_panel(&title, &time, values, name, *COLOR_SIGNAL)?;
            panel.secondary = Some(overlay_axis(&time, &overlay));
            Ok(panel)
        });
        panels.push(panel);
    }

    let subtitle = log.experiment_info().format_for_title();
    draw_stacked_plot(
        &config.output_path(root_name, "PeriodOverlay"),
        root_name,
        "Period Overlay",
        Some(subtitle.as_str()),
        panels,
        config,
    )
}


// src/plot_functions/plot_period_overlay.rs

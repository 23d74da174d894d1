// src/plot_functions/plot_log_columns.rs

use log::info;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

use crate::constants::{COLOR_SIGNAL, LINE_WIDTH_PLOT};
use crate::data_input::log_data::{AfmLog, ColumnSelector};
use crate::plot_framework::{
    calculate_range, draw_stacked_plot, finite_bounds, line_points, PanelConfig, PanelResult,
    PlotSeries, UnavailablePanel,
};
use crate::render_config::RenderConfig;

/// Unit for the shared time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnits {
    #[default]
    Seconds,
    Milliseconds,
    Minutes,
}

impl TimeUnits {
    /// Multiplier from seconds.
    pub fn scale(&self) -> f64 {
        match self {
            TimeUnits::Seconds => 1.0,
            TimeUnits::Milliseconds => 1000.0,
            TimeUnits::Minutes => 1.0 / 60.0,
        }
    }

    pub fn axis_label(&self) -> &'static str {
        match self {
            TimeUnits::Seconds => "Time (s)",
            TimeUnits::Milliseconds => "Time (ms)",
            TimeUnits::Minutes => "Time (min)",
        }
    }
}

impl FromStr for TimeUnits {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "seconds" => Ok(TimeUnits::Seconds),
            "ms" | "milliseconds" => Ok(TimeUnits::Milliseconds),
            "min" | "minutes" => Ok(TimeUnits::Minutes),
            other => Err(format!("unsupported time unit '{other}' (expected s, ms or min)")),
        }
    }
}

impl fmt::Display for TimeUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeUnits::Seconds => "s",
            TimeUnits::Milliseconds => "ms",
            TimeUnits::Minutes => "min",
        })
    }
}

/// Generates a stacked time-series plot of the selected columns (all
/// columns when `selectors` is empty), with the scan parameters as subtitle.
pub fn plot_log_columns(
    log: &AfmLog,
    selectors: &[ColumnSelector],
    sample_rate: f64,
    time_units: TimeUnits,
    root_name: &str,
    config: &RenderConfig,
) -> Result<(), Box<dyn Error>> {
    let selectors: Vec<ColumnSelector> = if selectors.is_empty() {
        (0..log.column_names.len()).map(ColumnSelector::Index).collect()
    } else {
        selectors.to_vec()
    };
    if selectors.is_empty() {
        return Err(format!("'{}' has no columns to plot", log.source.display()).into());
    }

    let time = log.time_base(sample_rate) * time_units.scale();
    let (t_min, t_max) = finite_bounds(time.iter()).unwrap_or((0.0, 0.0));

    let panels: Vec<PanelResult> = selectors
        .iter()
        .map(|selector| -> PanelResult {
            let (name, values) = log.column(selector).ok_or_else(|| {
                UnavailablePanel::new(selector.to_string(), "Column not found in log")
            })?;
            let (v_min, v_max) = finite_bounds(values.iter())
                .ok_or_else(|| UnavailablePanel::new(name, "No finite samples"))?;
            let (y_min, y_max) = calculate_range(v_min, v_max);
            Ok(PanelConfig {
                title: name.to_string(),
                x_range: t_min..t_max,
                y_range: y_min..y_max,
                series: vec![PlotSeries {
                    data: line_points(&time, values),
                    label: String::new(),
                    color: *COLOR_SIGNAL,
                    stroke_width: LINE_WIDTH_PLOT,
                }],
                x_label: time_units.axis_label().to_string(),
                y_label: name.to_string(),
                secondary: None,
            })
        })
        .collect();

    info!("Plotting {} columns from {}", panels.len(), log.source.display());
    let subtitle = log.experiment_info().format_for_title();
    draw_stacked_plot(
        &config.output_path(root_name, "Columns"),
        root_name,
        "Data Log",
        Some(subtitle.as_str()),
        panels,
        config,
    )
}


// src/plot_functions/plot_log_columns.rs

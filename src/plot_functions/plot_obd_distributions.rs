// src/plot_functions/plot_obd_distributions.rs

use log::{info, warn};
use ndarray::Array1;
use std::error::Error;

use crate::constants::{
    COLOR_HISTOGRAM, COLOR_SIGNAL, DEFAULT_OBD_COLUMNS, DISTRIBUTION_BINS, DISTRIBUTION_Y_SCALE,
    LINE_WIDTH_PLOT,
};
use crate::data_analysis::distribution::{signal_distribution, SignalDistribution};
use crate::data_input::log_data::{AfmLog, ColumnSelector};
use crate::plot_framework::{
    calculate_range, draw_grid_plot, finite_bounds, line_points, PanelConfig, PanelResult,
    PlotSeries, UnavailablePanel,
};
use crate::plot_functions::plot_log_columns::TimeUnits;
use crate::render_config::RenderConfig;

#[derive(Debug, Clone, Copy)]
pub struct DistributionSettings {
    pub sample_rate: f64,
    pub time_units: TimeUnits,
    /// Signal axes span `±scale × max(last signal)`.
    pub y_scale: f64,
    pub bins: usize,
}

impl Default for DistributionSettings {
    fn default() -> Self {
        Self {
            sample_rate: crate::constants::DEFAULT_SAMPLE_RATE_HZ,
            time_units: TimeUnits::Minutes,
            y_scale: DISTRIBUTION_Y_SCALE,
            bins: DISTRIBUTION_BINS,
        }
    }
}

/// Step outline of a horizontal histogram: counts along x, values along y.
fn histogram_outline(dist: &SignalDistribution) -> Vec<(f64, f64)> {
    let edges = &dist.edges;
    let mut points = Vec::with_capacity(2 * dist.counts.len() + 2);
    points.push((0.0, edges[0]));
    for (k, &count) in dist.counts.iter().enumerate() {
        points.push((count as f64, edges[k]));
        points.push((count as f64, edges[k + 1]));
    }
    points.push((0.0, edges[edges.len() - 1]));
    points
}

fn distribution_panel(name: &str, values: &Array1<f64>, bins: usize) -> PanelResult {
    let short_name = display_name(name);
    let title = format!("Distribution of {short_name}");
    let dist = signal_distribution(values, bins).map_err(|e| UnavailablePanel::new(&title, e))?;
    let top = (dist.max_count() as f64 * 1.05).max(1.0);
    let (y_min, y_max) = (dist.edges[0], dist.edges[dist.edges.len() - 1]);
    Ok(PanelConfig {
        title,
        x_range: 0.0..top,
        y_range: y_min..y_max,
        series: vec![PlotSeries {
            data: histogram_outline(&dist),
            label: dist.summary_label(),
            color: *COLOR_HISTOGRAM,
            stroke_width: LINE_WIDTH_PLOT,
        }],
        x_label: "Count".to_string(),
        y_label: name.to_string(),
        secondary: None,
    })
}

fn signal_panel(
    name: &str,
    time: &Array1<f64>,
    values: &Array1<f64>,
    y_limit: Option<f64>,
    time_units: TimeUnits,
) -> PanelResult {
    let (t_min, t_max) = finite_bounds(time.iter())
        .ok_or_else(|| UnavailablePanel::new(name, "No samples"))?;
    let (y_min, y_max) = match y_limit {
        Some(limit) => (-limit, limit),
        None => {
            let (lo, hi) = finite_bounds(values.iter())
                .ok_or_else(|| UnavailablePanel::new(name, "No finite samples"))?;
            calculate_range(lo, hi)
        }
    };
    Ok(PanelConfig {
        title: name.to_string(),
        x_range: t_min..t_max,
        y_range: y_min..y_max,
        series: vec![PlotSeries {
            data: line_points(time, values),
            label: display_name(name).to_string(),
            color: *COLOR_SIGNAL,
            stroke_width: LINE_WIDTH_PLOT,
        }],
        x_label: time_units.axis_label().to_string(),
        y_label: name.to_string(),
        secondary: None,
    })
}

/// `OBD X (V)` -> `OBD X`.
fn display_name(name: &str) -> &str {
    match name.rfind(" (") {
        Some(i) if name.ends_with(')') => &name[..i],
        _ => name,
    }
}

/// Shared signal axis limit: `scale × max` of the last signal (the OBD sum
/// in the default layout), when that is positive.
fn shared_y_limit(last: Option<&Array1<f64>>, scale: f64) -> Option<f64> {
    let (_, max) = finite_bounds(last?.iter())?;
    let limit = max * scale;
    (limit > 0.0).then_some(limit)
}

/// Generates one row per signal: its value distribution on the left and the
/// signal over time on the right, with the experiment info as subtitle.
/// Defaults to the OBD X, OBD Y and OBD SUM columns.
pub fn plot_obd_distributions(
    log: &AfmLog,
    selectors: &[ColumnSelector],
    settings: DistributionSettings,
    root_name: &str,
    config: &RenderConfig,
) -> Result<(), Box<dyn Error>> {
    let selectors: Vec<ColumnSelector> = if selectors.is_empty() {
        DEFAULT_OBD_COLUMNS
            .iter()
            .map(|name| ColumnSelector::Name(name.to_string()))
            .collect()
    } else {
        selectors.to_vec()
    };

    let signals = selectors
        .iter()
        .map(|selector| log.require_column(selector))
        .collect::<Result<Vec<_>, _>>()?;

    let time = log.time_base(settings.sample_rate) * settings.time_units.scale();
    let y_limit = shared_y_limit(signals.last().map(|(_, values)| *values), settings.y_scale);
    if y_limit.is_none() {
        warn!("Last signal has no positive maximum; signal axes are fitted to each signal");
    }

    let mut panels: Vec<PanelResult> = Vec::with_capacity(2 * signals.len());
    for (name, values) in &signals {
        panels.push(distribution_panel(name, values, settings.bins));
        panels.push(signal_panel(name, &time, values, y_limit, settings.time_units));
    }

    info!("Plotting distributions of {} signals from {}", signals.len(), log.source.display());
    let subtitle = log.experiment_info().format_for_title();
    draw_grid_plot(
        &config.output_path(root_name, "Distributions"),
        root_name,
        "Signal Distributions",
        Some(subtitle.as_str()),
        2,
        panels,
        config,
    )
}


// src/plot_functions/plot_obd_distributions.rs

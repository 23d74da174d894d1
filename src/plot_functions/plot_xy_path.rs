// src/plot_functions/plot_xy_path.rs

use log::info;
use std::error::Error;

use crate::constants::{COLOR_PATH, LINE_WIDTH_OVERLAY};
use crate::data_input::log_data::{AfmLog, ColumnSelector};
use crate::plot_framework::{
    calculate_range, draw_stacked_plot, finite_bounds, line_points, PanelConfig, PanelResult,
    PlotSeries, UnavailablePanel,
};
use crate::render_config::RenderConfig;

fn path_panel(
    x_name: &str,
    x: &ndarray::Array1<f64>,
    y_name: &str,
    y: &ndarray::Array1<f64>,
    limit: Option<f64>,
) -> PanelResult {
    let title = format!("{y_name} vs. {x_name}");
    let data = line_points(x, y);
    if data.is_empty() {
        return Err(UnavailablePanel::new(title, "No finite sample pairs"));
    }
    let (x_range, y_range) = match limit {
        Some(l) => (-l..l, -l..l),
        None => {
            let (x_lo, x_hi) = finite_bounds(data.iter().map(|(a, _)| a))
                .map(|(lo, hi)| calculate_range(lo, hi))
                .unwrap_or((0.0, 1.0));
            let (y_lo, y_hi) = finite_bounds(data.iter().map(|(_, b)| b))
                .map(|(lo, hi)| calculate_range(lo, hi))
                .unwrap_or((0.0, 1.0));
            (x_lo..x_hi, y_lo..y_hi)
        }
    };
    Ok(PanelConfig {
        title,
        x_range,
        y_range,
        series: vec![PlotSeries {
            data,
            label: String::new(),
            color: *COLOR_PATH,
            stroke_width: LINE_WIDTH_OVERLAY,
        }],
        x_label: x_name.to_string(),
        y_label: y_name.to_string(),
        secondary: None,
    })
}

/// Draws the path traced by two command columns (Y against X by default).
/// `limit` fixes both axes to `-limit..limit`; otherwise each axis is fitted
/// to its data.
pub fn plot_xy_path(
    log: &AfmLog,
    x_selector: &ColumnSelector,
    y_selector: &ColumnSelector,
    limit: Option<f64>,
    title: &str,
    root_name: &str,
    config: &RenderConfig,
) -> Result<(), Box<dyn Error>> {
    if let Some(l) = limit {
        if !(l > 0.0) {
            return Err(format!("Axis limit must be positive, got {l}").into());
        }
    }
    let (x_name, x) = log.require_column(x_selector)?;
    let (y_name, y) = log.require_column(y_selector)?;
    let panel = path_panel(x_name, x, y_name, y, limit);

    info!("Plotting {y_name} against {x_name} from {}", log.source.display());
    let subtitle = log.experiment_info().format_for_title();
    draw_stacked_plot(
        &config.output_path(root_name, "XYPath"),
        root_name,
        title,
        Some(subtitle.as_str()),
        vec![panel],
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;

    #[test]
    fn fixed_limit_is_symmetric_square() {
        let x = Array1::from(vec![-10.0, 0.0, 10.0]);
        let y = Array1::from(vec![5.0, -5.0, 5.0]);
        let panel = path_panel("X Command (um)", &x, "Y Command (um)", &y, Some(55.0)).unwrap();
        assert_eq!(panel.x_range, -55.0..55.0);
        assert_eq!(panel.y_range, -55.0..55.0);
        assert_eq!(panel.title, "Y Command (um) vs. X Command (um)");
        assert_eq!(panel.series[0].data, vec![(-10.0, 5.0), (0.0, -5.0), (10.0, 5.0)]);
    }

    #[test]
    fn fitted_axes_skip_gaps() {
        let x = Array1::from(vec![0.0, f64::NAN, 10.0]);
        let y = Array1::from(vec![0.0, 100.0, 20.0]);
        let panel = path_panel("Z Command (um)", &x, "OBD Y (V)", &y, None).unwrap();
        assert_eq!(panel.series[0].data.len(), 2);
        assert_abs_diff_eq!(panel.x_range.start, -1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(panel.x_range.end, 11.5, epsilon = 1e-12);
        assert_abs_diff_eq!(panel.y_range.start, -3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(panel.y_range.end, 23.0, epsilon = 1e-12);
    }

    #[test]
    fn no_pairs_is_placeholder() {
        let x = Array1::from(vec![f64::NAN]);
        let y = Array1::from(vec![1.0]);
        assert!(path_panel("X", &x, "Y", &y, None).is_err());
    }
}

// src/plot_functions/plot_xy_path.rs

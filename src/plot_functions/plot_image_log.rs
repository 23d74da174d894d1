// src/plot_functions/plot_image_log.rs

use log::{info, warn};
use ndarray::Array2;
use std::error::Error;

use crate::data_input::experiment_info::ExperimentInfo;
use crate::data_input::image_log::ImageLog;
use crate::plot_framework::{
    draw_heatmap_row, finite_bounds, HeatmapPalette, HeatmapPlotConfig, HeatmapResult,
    UnavailablePanel,
};
use crate::render_config::RenderConfig;

/// Cell centres along one image axis. With a physical `extent` the axis is
/// centred on zero; otherwise it counts pixels from zero. `descending` puts
/// the first cell at the top.
fn axis_bins(cells: usize, extent: Option<f64>, descending: bool) -> (Vec<f64>, f64, f64) {
    let (lo, span) = match extent {
        Some(size) if size > 0.0 => (-size / 2.0, size),
        _ => (0.0, cells as f64),
    };
    let step = span / cells.max(1) as f64;
    let bins = (0..cells)
        .map(|k| {
            let k = if descending { cells - 1 - k } else { k };
            lo + (k as f64 + 0.5) * step
        })
        .collect();
    (bins, lo, lo + span)
}

fn image_heatmap(
    title: &str,
    image: &Array2<f64>,
    info: &ExperimentInfo,
    color_range: Option<(f64, f64)>,
) -> HeatmapResult {
    let (rows, cols) = image.dim();
    if rows == 0 || cols == 0 {
        return Err(UnavailablePanel::new(title, "Empty image"));
    }
    let (min_value, max_value) = match color_range {
        Some(range) => range,
        None => finite_bounds(image.iter())
            .ok_or_else(|| UnavailablePanel::new(title, "No finite pixels"))?,
    };

    let size_x_um = info.size_x_nm.map(|nm| (nm / 1000.0).trunc());
    let size_y_um = info.size_y_nm.map(|nm| (nm / 1000.0).trunc());
    let (x_bins, x_lo, x_hi) = axis_bins(rows, size_x_um, false);
    let (y_bins, y_lo, y_hi) = axis_bins(cols, size_y_um, true);
    let unit = |size: Option<f64>| if size.is_some() { "µm" } else { "pixel" };

    Ok(HeatmapPlotConfig {
        title: title.to_string(),
        x_range: x_lo..x_hi,
        y_range: y_lo..y_hi,
        x_bins,
        y_bins,
        values: image.clone(),
        x_label: format!("X ({})", unit(size_x_um)),
        y_label: format!("Y ({})", unit(size_y_um)),
        min_value,
        max_value,
        palette: HeatmapPalette::Plasma,
    })
}

/// Generates the topography and error images side by side.
/// `topography_range` fixes the topography colour limits; the error image
/// always spans its own data.
pub fn plot_image_log(
    image_log: &ImageLog,
    topography_range: Option<(f64, f64)>,
    root_name: &str,
    config: &RenderConfig,
) -> Result<(), Box<dyn Error>> {
    if let Some((low, high)) = topography_range {
        if !(low < high) {
            return Err(format!("Topography range {low}..{high} is empty").into());
        }
    }

    let info = image_log.experiment_info();
    let topography = image_heatmap(
        "Topography Image (µm)",
        &image_log.topography,
        &info,
        topography_range,
    );
    let error = match &image_log.error {
        Some(image) => image_heatmap("Error Image (V)", image, &info, None),
        None => Err(UnavailablePanel::new("Error Image (V)", "No error image recorded")),
    };
    for placeholder in [&topography, &error].into_iter().filter_map(|h| h.as_ref().err()) {
        warn!("{}: {}", placeholder.title, placeholder.reason);
    }

    let plot_type_name = match image_log.experiment_time() {
        Some(time) => format!("AFM Image - Experiment Performed at {time}"),
        None => "AFM Image".to_string(),
    };
    let (rows, cols) = image_log.topography.dim();
    info!("Plotting {rows} x {cols} image from {}", image_log.source.display());
    let subtitle = info.format_for_title();
    draw_heatmap_row(
        &config.output_path(root_name, "AFMImage"),
        root_name,
        &plot_type_name,
        Some(subtitle.as_str()),
        vec![topography, error],
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info_with_size(x_nm: f64, y_nm: f64) -> ExperimentInfo {
        ExperimentInfo {
            size_x_nm: Some(x_nm),
            size_y_nm: Some(y_nm),
            ..ExperimentInfo::default()
        }
    }

    #[test]
    fn image_axes_are_centred_in_micrometres() {
        let image = Array2::from_shape_fn((4, 2), |(i, j)| (i * 2 + j) as f64);
        let info = info_with_size(20000.0, 10000.0);
        let heatmap = image_heatmap("Topography Image (µm)", &image, &info, None).unwrap();
        assert_eq!(heatmap.x_range, -10.0..10.0);
        assert_eq!(heatmap.y_range, -5.0..5.0);
        assert_eq!(heatmap.x_bins, vec![-7.5, -2.5, 2.5, 7.5]);
        // First image column is the top line of the scan.
        assert_eq!(heatmap.y_bins, vec![2.5, -2.5]);
        assert_eq!((heatmap.min_value, heatmap.max_value), (0.0, 7.0));
        assert_eq!(heatmap.x_label, "X (µm)");
        assert_eq!(heatmap.palette, HeatmapPalette::Plasma);
    }

    #[test]
    fn colour_range_override_and_pixel_axes() {
        let image = Array2::from_elem((3, 3), 0.4);
        let heatmap = image_heatmap(
            "Topography Image (µm)",
            &image,
            &ExperimentInfo::default(),
            Some((-1.0, 1.0)),
        )
        .unwrap();
        assert_eq!((heatmap.min_value, heatmap.max_value), (-1.0, 1.0));
        assert_eq!(heatmap.x_range, 0.0..3.0);
        assert_eq!(heatmap.y_bins, vec![2.5, 1.5, 0.5]);
        assert_eq!(heatmap.y_label, "Y (pixel)");
    }

    #[test]
    fn all_nan_image_is_a_placeholder() {
        let image = Array2::from_elem((2, 2), f64::NAN);
        let err = image_heatmap("Error Image (V)", &image, &ExperimentInfo::default(), None)
            .unwrap_err();
        assert_eq!(err.reason, "No finite pixels");
    }
}

// src/plot_functions/plot_image_log.rs

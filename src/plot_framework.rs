// src/plot_framework.rs

use log::{info, warn};
use ndarray::{Array1, Array2};
use plotters::backend::{BitMapBackend, DrawingBackend, SVGBackend};
use plotters::chart::{ChartBuilder, ChartContext, SeriesLabelPosition};
use plotters::coord::{CoordTranslate, Shift};
use plotters::drawing::{DrawingArea, IntoDrawingArea};
use plotters::element::{Circle, PathElement, Rectangle, Text};
use plotters::series::LineSeries;
use plotters::style::colors::{BLACK, RED, WHITE};
use plotters::style::{Color, IntoFont, RGBColor};

use std::error::Error;
use std::ops::Range;
use std::path::Path;

use crate::constants::LINE_WIDTH_LEGEND;
use crate::render_config::{OutputFormat, RenderConfig};

/// Calculate plot range with padding.
/// Adds 15% padding, or a fixed padding for very small ranges.
pub fn calculate_range(min_val: f64, max_val: f64) -> (f64, f64) {
    let (min, max) = if min_val <= max_val {
        (min_val, max_val)
    } else {
        (max_val, min_val)
    };
    let range = (max - min).abs();
    let padding = if range < 1e-6 { 0.5 } else { range * 0.15 };
    (min - padding, max + padding)
}

/// Min/max over the finite points of a series, if there are any.
pub fn finite_bounds<'a, I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = &'a f64>,
{
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Pairs `x` and `y` sample by sample, dropping points with a non-finite
/// coordinate so gaps in a log do not break the line.
pub fn line_points(x: &Array1<f64>, y: &Array1<f64>) -> Vec<(f64, f64)> {
    x.iter()
        .zip(y.iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(&a, &b)| (a, b))
        .collect()
}

/// Tick label text for a y value. Large magnitudes get `k`/`M` suffixes,
/// small fractional values keep decimals, and dB axes show whole numbers.
pub fn format_axis_value(y: f64, y_label: &str) -> String {
    if y_label.contains("dB") {
        return format!("{:.0}", y);
    }
    let magnitude = y.abs();
    if magnitude >= 1_000_000.0 {
        format!("{:.1}M", y / 1_000_000.0)
    } else if magnitude >= 1000.0 {
        format!("{:.0}k", y / 1000.0)
    } else if y.fract() == 0.0 {
        format!("{:.0}", y)
    } else if magnitude < 1.0 {
        format!("{:.2}", y)
    } else if magnitude < 10.0 {
        format!("{:.1}", y)
    } else {
        format!("{:.0}", y)
    }
}

#[derive(Clone, Debug)]
pub struct PlotSeries {
    pub data: Vec<(f64, f64)>,
    pub label: String,
    pub color: RGBColor,
    pub stroke_width: u32,
}

/// Right-hand y-axis with its own range, drawn over the primary chart.
#[derive(Clone, Debug)]
pub struct SecondaryAxis {
    pub y_range: Range<f64>,
    pub y_label: String,
    pub series: Vec<PlotSeries>,
}

/// One chart in a stacked figure.
#[derive(Clone, Debug)]
pub struct PanelConfig {
    pub title: String,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    pub series: Vec<PlotSeries>,
    pub x_label: String,
    pub y_label: String,
    pub secondary: Option<SecondaryAxis>,
}

/// Placeholder drawn in place of a panel that could not be computed.
#[derive(Clone, Debug, PartialEq)]
pub struct UnavailablePanel {
    pub title: String,
    pub reason: String,
}

impl UnavailablePanel {
    pub fn new(title: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            title: title.into(),
            reason: reason.to_string(),
        }
    }
}

pub type PanelResult = Result<PanelConfig, UnavailablePanel>;

/// Colour scale of a heatmap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeatmapPalette {
    #[default]
    Viridis,
    Plasma,
}

impl HeatmapPalette {
    fn gradient(&self) -> colorous::Gradient {
        match self {
            HeatmapPalette::Viridis => colorous::VIRIDIS,
            HeatmapPalette::Plasma => colorous::PLASMA,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HeatmapPlotConfig {
    pub title: String,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    /// Cell centres along x.
    pub x_bins: Vec<f64>,
    /// Cell centres along y.
    pub y_bins: Vec<f64>,
    /// Shape `(x_bins, y_bins)`.
    pub values: Array2<f64>,
    pub x_label: String,
    pub y_label: String,
    pub min_value: f64,
    pub max_value: f64,
    pub palette: HeatmapPalette,
}

pub type HeatmapResult = Result<HeatmapPlotConfig, UnavailablePanel>;

fn map_value_to_color(
    value: f64,
    min_value: f64,
    max_value: f64,
    palette: HeatmapPalette,
) -> RGBColor {
    if !value.is_finite() || !min_value.is_finite() || !max_value.is_finite() {
        return RGBColor(0, 0, 0);
    }
    let span = (max_value - min_value).abs().max(1e-9);
    let t = ((value.clamp(min_value, max_value) - min_value) / span).clamp(0.0, 1.0);
    let color = palette.gradient().eval_continuous(t);
    RGBColor(color.r, color.g, color.b)
}

/// Draw a "Data Unavailable" message on a plot area.
pub fn draw_unavailable_message<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &UnavailablePanel,
    config: &RenderConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    const CHAR_WIDTH_RATIO: f32 = 0.6;
    const LINE_HEIGHT_SPACING: i32 = 4;

    let (x_range, y_range) = area.get_pixel_range();
    let (width, height) = (x_range.end - x_range.start, y_range.end - y_range.start);
    let message = format!("{} Data Unavailable:\n{}", panel.title, panel.reason);
    let lines: Vec<&str> = message.lines().collect();

    let font_size = config.message.size;
    let char_width = (font_size as f32 * CHAR_WIDTH_RATIO) as i32;
    let line_height = font_size + LINE_HEIGHT_SPACING;
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as i32;
    let start_x = width / 2 - longest * char_width / 2;
    let start_y = height / 2 - lines.len() as i32 * line_height / 2;

    for (i, line) in lines.iter().enumerate() {
        let style = config.message.tuple().into_font().color(&RED);
        area.draw(&Text::new(
            line.to_string(),
            (start_x, start_y + i as i32 * line_height),
            style,
        ))?;
    }
    Ok(())
}

fn draw_legend<'a, DB, CT>(
    chart: &mut ChartContext<'a, DB, CT>,
    config: &RenderConfig,
) -> Result<(), Box<dyn Error>>
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    CT: CoordTranslate,
{
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font(config.legend.tuple())
        .draw()?;
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &PanelConfig,
    config: &RenderConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let mut builder = ChartBuilder::on(area);
    builder
        .caption(&panel.title, config.chart_title.tuple())
        .margin(5)
        .x_label_area_size(50)
        .y_label_area_size(70);
    if panel.secondary.is_some() {
        builder.right_y_label_area_size(70);
    }
    let mut chart = builder.build_cartesian_2d(panel.x_range.clone(), panel.y_range.clone())?;

    chart
        .configure_mesh()
        .x_desc(&panel.x_label)
        .y_desc(&panel.y_label)
        .x_labels(20)
        .y_labels(10)
        .x_label_formatter(&|x| format_axis_value(*x, &panel.x_label))
        .y_label_formatter(&|y| format_axis_value(*y, &panel.y_label))
        .light_line_style(WHITE.mix(0.7))
        .label_style(config.axis_label.tuple())
        .draw()?;

    let mut legend_entries = 0;
    for s in &panel.series {
        let color = s.color;
        if s.data.is_empty() {
            // Legend-only entry.
            if !s.label.is_empty() {
                chart
                    .draw_series(std::iter::once(Circle::new(
                        (panel.x_range.start, panel.y_range.start),
                        0,
                        color.filled(),
                    )))?
                    .label(&s.label)
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(0))
                    });
                legend_entries += 1;
            }
            continue;
        }
        let drawn = chart.draw_series(LineSeries::new(
            s.data.iter().copied(),
            color.stroke_width(s.stroke_width),
        ))?;
        if !s.label.is_empty() {
            drawn.label(&s.label).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(LINE_WIDTH_LEGEND))
            });
            legend_entries += 1;
        }
    }

    match &panel.secondary {
        Some(secondary) => {
            let mut chart =
                chart.set_secondary_coord(panel.x_range.clone(), secondary.y_range.clone());
            let axis_color = secondary.series.first().map_or(BLACK, |s| s.color);
            chart
                .configure_secondary_axes()
                .y_desc(&secondary.y_label)
                .y_labels(10)
                .y_label_formatter(&|y| format_axis_value(*y, &secondary.y_label))
                .label_style(config.axis_label.tuple().into_font().color(&axis_color))
                .axis_desc_style(config.axis_label.tuple().into_font().color(&axis_color))
                .draw()?;

            for s in &secondary.series {
                if s.data.is_empty() {
                    continue;
                }
                let color = s.color;
                let drawn = chart.draw_secondary_series(LineSeries::new(
                    s.data.iter().copied(),
                    color.stroke_width(s.stroke_width),
                ))?;
                if !s.label.is_empty() {
                    drawn.label(&s.label).legend(move |(x, y)| {
                        PathElement::new(
                            vec![(x, y), (x + 20, y)],
                            color.stroke_width(LINE_WIDTH_LEGEND),
                        )
                    });
                    legend_entries += 1;
                }
            }
            if legend_entries > 0 {
                draw_legend(&mut *chart, config)?;
            }
        }
        None => {
            if legend_entries > 0 {
                draw_legend(&mut chart, config)?;
            }
        }
    }
    Ok(())
}

fn draw_titles<DB: DrawingBackend>(
    root_area: &DrawingArea<DB, Shift>,
    title: &str,
    subtitle: Option<&str>,
    config: &RenderConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    root_area.fill(&WHITE)?;
    root_area.draw(&Text::new(
        title.to_string(),
        (10, 10),
        config.main_title.tuple().into_font().color(&BLACK),
    ))?;
    if let Some(subtitle) = subtitle.filter(|s| !s.is_empty()) {
        root_area.draw(&Text::new(
            subtitle.to_string(),
            (10, 10 + config.main_title.size + 6),
            config.subtitle.tuple().into_font().color(&BLACK),
        ))?;
    }
    Ok(())
}

fn title_margin(subtitle: Option<&str>, config: &RenderConfig) -> i32 {
    match subtitle {
        Some(s) if !s.is_empty() => config.main_title.size + config.subtitle.size + 30,
        _ => config.main_title.size + 26,
    }
}

fn render_grid<DB: DrawingBackend>(
    root_area: DrawingArea<DB, Shift>,
    title: &str,
    subtitle: Option<&str>,
    columns: usize,
    panels: &[PanelResult],
    config: &RenderConfig,
) -> Result<bool, Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    draw_titles(&root_area, title, subtitle, config)?;
    let margined = root_area.margin(title_margin(subtitle, config), 5, 5, 5);
    let columns = columns.max(1);
    let rows = panels.len().div_ceil(columns).max(1);
    let areas = margined.split_evenly((rows, columns));
    let mut any_panel_plotted = false;

    for (area, panel) in areas.iter().zip(panels) {
        match panel {
            Ok(panel) => {
                let has_data = panel.series.iter().any(|s| !s.data.is_empty());
                let valid_ranges = panel.x_range.end > panel.x_range.start
                    && panel.y_range.end > panel.y_range.start;
                if has_data && valid_ranges {
                    draw_panel(area, panel, config)?;
                    any_panel_plotted = true;
                } else {
                    let reason = if !has_data {
                        "No data points"
                    } else {
                        "Invalid ranges"
                    };
                    draw_unavailable_message(area, &UnavailablePanel::new(&panel.title, reason), config)?;
                }
            }
            Err(placeholder) => draw_unavailable_message(area, placeholder, config)?,
        }
    }

    root_area.present()?;
    Ok(any_panel_plotted)
}

/// Writes a figure of panels laid out row by row in `columns` columns.
///
/// Placeholders (and panels without data) show a red "Data Unavailable"
/// message in their slot so the layout stays stable.
pub fn draw_grid_plot(
    output_path: &Path,
    root_name: &str,
    plot_type_name: &str,
    subtitle: Option<&str>,
    columns: usize,
    panels: Vec<PanelResult>,
    config: &RenderConfig,
) -> Result<(), Box<dyn Error>> {
    let title = format!("{root_name} {plot_type_name}");
    let size = (config.width, config.height);
    let any_panel_plotted = match config.format {
        OutputFormat::Png => render_grid(
            BitMapBackend::new(output_path, size).into_drawing_area(),
            &title,
            subtitle,
            columns,
            &panels,
            config,
        )?,
        OutputFormat::Svg => render_grid(
            SVGBackend::new(output_path, size).into_drawing_area(),
            &title,
            subtitle,
            columns,
            &panels,
            config,
        )?,
    };

    if any_panel_plotted {
        info!("Plot saved as '{}'.", output_path.display());
    } else {
        warn!(
            "'{}' only contains placeholder messages: no data available for any panel.",
            output_path.display()
        );
    }
    Ok(())
}

/// Writes a figure of vertically stacked panels to `output_path`.
pub fn draw_stacked_plot(
    output_path: &Path,
    root_name: &str,
    plot_type_name: &str,
    subtitle: Option<&str>,
    panels: Vec<PanelResult>,
    config: &RenderConfig,
) -> Result<(), Box<dyn Error>> {
    draw_grid_plot(output_path, root_name, plot_type_name, subtitle, 1, panels, config)
}

fn draw_color_bar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    heatmap: &HeatmapPlotConfig,
    config: &RenderConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    const STEPS: usize = 100;
    let (lo, hi) = (heatmap.min_value, heatmap.max_value);
    let step = (hi - lo) / STEPS as f64;

    let mut chart = ChartBuilder::on(area)
        .margin(5)
        .margin_top(40)
        .y_label_area_size(60)
        .x_label_area_size(50)
        .build_cartesian_2d(0.0..1.0, lo..hi)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .disable_x_axis()
        .y_labels(10)
        .y_label_formatter(&|y| format!("{:.0}", y))
        .label_style(config.axis_label.tuple())
        .draw()?;
    chart.draw_series((0..STEPS).map(|i| {
        let y0 = lo + i as f64 * step;
        Rectangle::new(
            [(0.0, y0), (1.0, y0 + step)],
            map_value_to_color(y0 + step / 2.0, lo, hi, heatmap.palette).filled(),
        )
    }))?;
    Ok(())
}

fn draw_heatmap_cell<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    heatmap: &HeatmapPlotConfig,
    config: &RenderConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let area_width = area.dim_in_pixel().0;
    let bar_width = 120.min(area_width / 5);
    let plot_width = area_width.saturating_sub(bar_width);
    let (plot_area, bar_area) = area.split_horizontally(plot_width as i32);

    let mut chart = ChartBuilder::on(&plot_area)
        .caption(&heatmap.title, config.chart_title.tuple())
        .margin(5)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(heatmap.x_range.clone(), heatmap.y_range.clone())?;

    chart
        .configure_mesh()
        .x_desc(&heatmap.x_label)
        .y_desc(&heatmap.y_label)
        .x_labels(10)
        .y_labels(10)
        .x_label_formatter(&|x| format_axis_value(*x, &heatmap.x_label))
        .y_label_formatter(&|y| format_axis_value(*y, &heatmap.y_label))
        .light_line_style(WHITE.mix(0.7))
        .label_style(config.axis_label.tuple())
        .draw()?;

    let bin_width = |bins: &[f64]| {
        if bins.len() > 1 {
            bins[1] - bins[0]
        } else {
            1.0
        }
    };
    let x_bin_width = bin_width(&heatmap.x_bins);
    let y_bin_width = bin_width(&heatmap.y_bins);

    let cells = heatmap.x_bins.iter().enumerate().flat_map(|(xi, &x)| {
        heatmap.y_bins.iter().enumerate().filter_map(move |(yi, &y)| {
            heatmap.values.get((xi, yi)).map(|&value| {
                Rectangle::new(
                    [
                        (x - x_bin_width * 0.5, y - y_bin_width * 0.5),
                        (x + x_bin_width * 0.5, y + y_bin_width * 0.5),
                    ],
                    map_value_to_color(value, heatmap.min_value, heatmap.max_value, heatmap.palette)
                        .filled(),
                )
            })
        })
    });
    chart.draw_series(cells)?;

    if bar_width > 0 {
        draw_color_bar(&bar_area, heatmap, config)?;
    }
    Ok(())
}

fn render_heatmaps<DB: DrawingBackend>(
    root_area: DrawingArea<DB, Shift>,
    title: &str,
    subtitle: Option<&str>,
    heatmaps: &[HeatmapResult],
    config: &RenderConfig,
) -> Result<bool, Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    draw_titles(&root_area, title, subtitle, config)?;
    let margined = root_area.margin(title_margin(subtitle, config), 5, 5, 5);
    let areas = margined.split_evenly((1, heatmaps.len().max(1)));
    let mut any_drawn = false;

    for (area, heatmap) in areas.iter().zip(heatmaps) {
        match heatmap {
            Ok(heatmap) if !heatmap.x_bins.is_empty() && !heatmap.y_bins.is_empty() => {
                draw_heatmap_cell(area, heatmap, config)?;
                any_drawn = true;
            }
            Ok(heatmap) => draw_unavailable_message(
                area,
                &UnavailablePanel::new(&heatmap.title, "No cells to draw"),
                config,
            )?,
            Err(placeholder) => draw_unavailable_message(area, placeholder, config)?,
        }
    }

    root_area.present()?;
    Ok(any_drawn)
}

/// Writes heatmaps side by side, each with its own colour bar. Placeholders
/// keep their slot with a "Data Unavailable" message.
pub fn draw_heatmap_row(
    output_path: &Path,
    root_name: &str,
    plot_type_name: &str,
    subtitle: Option<&str>,
    heatmaps: Vec<HeatmapResult>,
    config: &RenderConfig,
) -> Result<(), Box<dyn Error>> {
    let title = format!("{root_name} {plot_type_name}");
    let size = (config.width, config.height);
    let any_drawn = match config.format {
        OutputFormat::Png => render_heatmaps(
            BitMapBackend::new(output_path, size).into_drawing_area(),
            &title,
            subtitle,
            &heatmaps,
            config,
        )?,
        OutputFormat::Svg => render_heatmaps(
            SVGBackend::new(output_path, size).into_drawing_area(),
            &title,
            subtitle,
            &heatmaps,
            config,
        )?,
    };
    if any_drawn {
        info!("Heatmap plot saved as '{}'.", output_path.display());
    } else {
        warn!(
            "'{}' only contains placeholder messages: no heatmap could be drawn.",
            output_path.display()
        );
    }
    Ok(())
}

/// Writes a single heatmap with its colour bar.
pub fn draw_heatmap_plot(
    output_path: &Path,
    root_name: &str,
    plot_type_name: &str,
    subtitle: Option<&str>,
    heatmap: &HeatmapPlotConfig,
    config: &RenderConfig,
) -> Result<(), Box<dyn Error>> {
    if heatmap.x_bins.is_empty() || heatmap.y_bins.is_empty() {
        return Err(format!("Heatmap '{}' has no cells to draw", heatmap.title).into());
    }
    draw_heatmap_row(
        output_path,
        root_name,
        plot_type_name,
        subtitle,
        vec![Ok(heatmap.clone())],
        config,
    )
}

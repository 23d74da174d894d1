// src/constants.rs

use plotters::style::colors::full_palette::{BLUE_700, GREY_700, ORANGE, RED};
use plotters::style::RGBColor;

// Plot dimensions.
pub const PLOT_WIDTH: u32 = 1920;
pub const PLOT_HEIGHT: u32 = 1080;

// Font sizes.
pub const FONT_SIZE_MAIN_TITLE: i32 = 24;
pub const FONT_SIZE_SUBTITLE: i32 = 16;
pub const FONT_SIZE_CHART_TITLE: i32 = 20;
pub const FONT_SIZE_AXIS_LABEL: i32 = 14;
pub const FONT_SIZE_LEGEND: i32 = 14;
pub const FONT_SIZE_MESSAGE: i32 = 20;
pub const FONT_FAMILY: &str = "sans-serif";

// --- Acquisition defaults ---
// The RT loop runs off a 1 kHz clock with a 10 tick loop delay.
pub const RT_CLOCK_HZ: f64 = 1000.0;
pub const RT_LOOP_DELAY_TICKS: f64 = 10.0;
pub const DEFAULT_SAMPLE_RATE_HZ: f64 = RT_CLOCK_HZ / RT_LOOP_DELAY_TICKS;

// --- Period overlay ---
pub const DEFAULT_POLY_ORDER: usize = 3;
pub const MIN_SMOOTHING_WINDOW: usize = 5;
pub const SMOOTHING_WINDOW_DIVISOR: f64 = 10.0; // window ~ sample_rate / 10
pub const PERIOD_AXIS_HEADROOM: f64 = 1.25;

// --- Pressure step response ---
pub const DEFAULT_STEP_HIGH_PSI: f64 = 0.2;
pub const DEFAULT_STEP_LOW_PSI: f64 = 0.0;
pub const DEFAULT_SETTLING_TOLERANCE: f64 = 0.05;
pub const DEFAULT_PRESSURE_SAMPLE_PERIOD_S: f64 = 0.01;
pub const DEFAULT_SETTLING_MAX_ROWS: usize = 2100;
pub const DEFAULT_SETTLING_X_MAX_S: f64 = 5.0;

// --- Spectrogram ---
pub const SPECTROGRAM_WINDOW_S: f64 = 2.0;
pub const SPECTROGRAM_OVERLAP_RATIO: f64 = 0.75;
pub const SPECTROGRAM_POWER_FLOOR: f64 = 1e-20;
pub const SPECTROGRAM_DYNAMIC_RANGE_DB: f64 = 80.0;

// --- Signal distributions ---
pub const DISTRIBUTION_BINS: usize = 50;
pub const DISTRIBUTION_Y_SCALE: f64 = 1.25; // signal axes span ± this × max of the last signal
pub const DEFAULT_OBD_COLUMNS: [&str; 3] = ["OBD X (V)", "OBD Y (V)", "OBD SUM (V)"];

// --- XY command path ---
pub const DEFAULT_XY_COLUMNS: (&str, &str) = ("X Command (um)", "Y Command (um)");

// --- Folder log layout ---
pub const FOLDER_INFO_FILE: &str = "experiment-info.csv";
pub const FOLDER_PRESSURE_READING_FILE: &str = "pressure-reading.csv";
pub const FOLDER_TOPOGRAPHY_FILE: &str = "topo-image.csv";
pub const FOLDER_ERROR_IMAGE_FILE: &str = "error-image.csv";
/// (file name, column name, required for a complete log)
pub const FOLDER_SIGNAL_FILES: [(&str, &str, bool); 8] = [
    ("x-command.csv", "X Command (um)", true),
    ("y-command.csv", "Y Command (um)", true),
    ("z-command.csv", "Z Command (um)", true),
    ("obd-x.csv", "OBD X (V)", true),
    ("obd-y.csv", "OBD Y (V)", true),
    ("obd-sum.csv", "OBD SUM (V)", true),
    ("pressure.csv", "Pressure (psi)", false),
    ("rt-time-samples.csv", "RT Time Samples", false),
];

// --- Plot Color Assignments ---
pub const COLOR_SIGNAL: &RGBColor = &BLUE_700;
pub const COLOR_CONTEXT_SIGNAL: &RGBColor = &GREY_700;
pub const COLOR_PERIOD_OVERLAY: &RGBColor = &RED;
pub const COLOR_RESPONSE: &RGBColor = &BLUE_700;
pub const COLOR_COMMAND: &RGBColor = &ORANGE;
pub const COLOR_HISTOGRAM: &RGBColor = &BLUE_700;
pub const COLOR_PATH: &RGBColor = &BLUE_700;

// Stroke widths for lines
pub const LINE_WIDTH_PLOT: u32 = 1;
pub const LINE_WIDTH_OVERLAY: u32 = 2;
pub const LINE_WIDTH_LEGEND: u32 = 2;

// src/constants.rs

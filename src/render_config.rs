// src/render_config.rs

// Rendering configuration passed explicitly to every plot function.
// Nothing here is global: two figures can be drawn with different settings
// in the same process.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::constants::{
    FONT_FAMILY, FONT_SIZE_AXIS_LABEL, FONT_SIZE_CHART_TITLE, FONT_SIZE_LEGEND,
    FONT_SIZE_MAIN_TITLE, FONT_SIZE_MESSAGE, FONT_SIZE_SUBTITLE, PLOT_HEIGHT, PLOT_WIDTH,
};

/// Image format written by the plot functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(format!("unsupported output format '{other}' (expected png or svg)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Represents a font style (family + size).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontStyle {
    pub family: &'static str,
    pub size: i32,
}

impl FontStyle {
    pub const fn new(size: i32) -> Self {
        Self {
            family: FONT_FAMILY,
            size,
        }
    }

    /// Tuple form accepted by plotters' `IntoFont`.
    pub fn tuple(&self) -> (&'static str, i32) {
        (self.family, self.size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub main_title: FontStyle,
    pub subtitle: FontStyle,
    pub chart_title: FontStyle,
    pub axis_label: FontStyle,
    pub legend: FontStyle,
    pub message: FontStyle,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: PLOT_WIDTH,
            height: PLOT_HEIGHT,
            output_dir: PathBuf::from("."),
            format: OutputFormat::default(),
            main_title: FontStyle::new(FONT_SIZE_MAIN_TITLE),
            subtitle: FontStyle::new(FONT_SIZE_SUBTITLE),
            chart_title: FontStyle::new(FONT_SIZE_CHART_TITLE),
            axis_label: FontStyle::new(FONT_SIZE_AXIS_LABEL),
            legend: FontStyle::new(FONT_SIZE_LEGEND),
            message: FontStyle::new(FONT_SIZE_MESSAGE),
        }
    }
}

impl RenderConfig {
    /// `<output_dir>/<root_name>_<plot_suffix>.<ext>`
    pub fn output_path(&self, root_name: &str, plot_suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{root_name}_{plot_suffix}.{}", self.format.extension()))
    }
}

/// File stem used to name plots generated from `input`. Folder logs use the
/// folder name.
pub fn root_name_for(input: &Path) -> String {
    let stem = if input.is_dir() {
        input.file_name()
    } else {
        input.file_stem()
    };
    stem.map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "log".to_string())
}

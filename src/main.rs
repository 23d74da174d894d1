// src/main.rs

#![allow(non_snake_case)]

use clap::{Args, Parser, Subcommand};
use log::{error, info};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use afm_csv_render::constants::{
    DEFAULT_POLY_ORDER, DEFAULT_PRESSURE_SAMPLE_PERIOD_S, DEFAULT_SAMPLE_RATE_HZ,
    DEFAULT_SETTLING_MAX_ROWS, DEFAULT_SETTLING_TOLERANCE, DEFAULT_SETTLING_X_MAX_S,
    DEFAULT_STEP_HIGH_PSI, DEFAULT_STEP_LOW_PSI, DEFAULT_XY_COLUMNS, DISTRIBUTION_BINS,
    DISTRIBUTION_Y_SCALE, SPECTROGRAM_OVERLAP_RATIO, SPECTROGRAM_WINDOW_S,
};
use afm_csv_render::data_input::log_data::{AfmLog, ColumnSelector};
use afm_csv_render::data_input::log_parser::{load_image_log, load_log, load_pressure_log};
use afm_csv_render::plot_functions::plot_image_log::plot_image_log;
use afm_csv_render::plot_functions::plot_log_columns::{plot_log_columns, TimeUnits};
use afm_csv_render::plot_functions::plot_obd_distributions::{
    plot_obd_distributions, DistributionSettings,
};
use afm_csv_render::plot_functions::plot_period_overlay::{
    plot_period_overlay, PeriodOverlaySettings,
};
use afm_csv_render::plot_functions::plot_settling_times::{plot_settling_times, SettlingSettings};
use afm_csv_render::plot_functions::plot_spectrogram::plot_spectrogram;
use afm_csv_render::plot_functions::plot_xy_path::plot_xy_path;
use afm_csv_render::render_config::{root_name_for, OutputFormat, RenderConfig};

/// Plots and analyses AFM scanner and pressure controller logs.
#[derive(Parser, Debug)]
#[command(name = "AFM_CSV_Render", author, version, about, long_about = None)]
struct Cli {
    /// Directory the figures are written to
    #[arg(long, global = true, default_value = ".")]
    output_dir: PathBuf,

    /// Image format: png or svg
    #[arg(long, global = true, default_value_t = OutputFormat::Png)]
    format: OutputFormat,

    /// Figure width in pixels
    #[arg(long, global = true)]
    width: Option<u32>,

    /// Figure height in pixels
    #[arg(long, global = true)]
    height: Option<u32>,

    /// Field delimiter for single-file logs (auto-detected when omitted)
    #[arg(long, global = true, value_parser = parse_delimiter)]
    delimiter: Option<u8>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Overlay the trough-to-trough period on scan signals
    Period(PeriodArgs),
    /// Measure pressure step settling times across several logs
    Settling(SettlingArgs),
    /// Short-time power spectrum of one column
    Spectrogram(SpectrogramArgs),
    /// Stacked time series of log columns
    Plot(PlotArgs),
    /// Topography and error images side by side
    Image(ImageArgs),
    /// Value distribution next to each OBD signal
    Distributions(DistributionsArgs),
    /// Path traced by two columns, Y command against X command by default
    Xy(XyArgs),
    /// Print columns, row count and scan parameters of a log
    Info(InfoArgs),
}

#[derive(Args, Debug)]
struct PeriodArgs {
    /// Log file or log folder
    input: PathBuf,
    /// Signal to analyse (index or header name); repeatable
    #[arg(long = "column", required = true)]
    columns: Vec<ColumnSelector>,
    /// Extra column drawn above the signals without analysis; repeatable
    #[arg(long = "context-column")]
    context_columns: Vec<ColumnSelector>,
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE_HZ)]
    sample_rate: f64,
    /// Smoothing window in samples (odd); derived from the sample rate when omitted
    #[arg(long)]
    window: Option<usize>,
    #[arg(long, default_value_t = DEFAULT_POLY_ORDER)]
    poly_order: usize,
}

#[derive(Args, Debug)]
struct SettlingArgs {
    /// Pressure logs or experiment folders holding pressure-reading.csv, one panel each
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    #[arg(long, default_value = "0")]
    response_column: ColumnSelector,
    #[arg(long, default_value = "2")]
    command_column: ColumnSelector,
    /// Sample counter column, scaled by the sample period
    #[arg(long, default_value = "1")]
    time_column: ColumnSelector,
    /// Use row numbers instead of the sample counter column
    #[arg(long)]
    row_time: bool,
    #[arg(long, default_value_t = DEFAULT_STEP_HIGH_PSI)]
    step_high: f64,
    #[arg(long, default_value_t = DEFAULT_STEP_LOW_PSI)]
    step_low: f64,
    /// Settled once the response is at or below this fraction of step-high
    #[arg(long, default_value_t = DEFAULT_SETTLING_TOLERANCE)]
    tolerance: f64,
    /// Seconds per sample
    #[arg(long, default_value_t = DEFAULT_PRESSURE_SAMPLE_PERIOD_S)]
    sample_period: f64,
    /// Rows read from each log (0 = all)
    #[arg(long, default_value_t = DEFAULT_SETTLING_MAX_ROWS)]
    max_rows: usize,
    /// Upper limit of the time axis in seconds
    #[arg(long, default_value_t = DEFAULT_SETTLING_X_MAX_S)]
    x_max: f64,
}

#[derive(Args, Debug)]
struct SpectrogramArgs {
    input: PathBuf,
    #[arg(long)]
    column: ColumnSelector,
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE_HZ)]
    sample_rate: f64,
    /// STFT window length in seconds
    #[arg(long, default_value_t = SPECTROGRAM_WINDOW_S)]
    window_s: f64,
    /// Fraction of each window shared with the next, in [0, 1)
    #[arg(long, default_value_t = SPECTROGRAM_OVERLAP_RATIO)]
    overlap: f64,
}

#[derive(Args, Debug)]
struct PlotArgs {
    input: PathBuf,
    /// Column to plot; repeatable, all columns when omitted
    #[arg(long = "column")]
    columns: Vec<ColumnSelector>,
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE_HZ)]
    sample_rate: f64,
    /// s, ms or min
    #[arg(long, default_value_t = TimeUnits::Seconds)]
    time_units: TimeUnits,
}

#[derive(Args, Debug)]
struct ImageArgs {
    /// Image folder (topo-image.csv, error-image.csv, experiment-info.csv) or a single image file
    input: PathBuf,
    /// Lower topography colour limit
    #[arg(long, requires = "topo_high", allow_negative_numbers = true)]
    topo_low: Option<f64>,
    /// Upper topography colour limit
    #[arg(long, requires = "topo_low", allow_negative_numbers = true)]
    topo_high: Option<f64>,
}

#[derive(Args, Debug)]
struct DistributionsArgs {
    input: PathBuf,
    /// Signal column; repeatable, OBD X, OBD Y and OBD SUM when omitted
    #[arg(long = "column")]
    columns: Vec<ColumnSelector>,
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE_HZ)]
    sample_rate: f64,
    #[arg(long, default_value_t = TimeUnits::Minutes)]
    time_units: TimeUnits,
    /// Signal axes span ± this factor times the maximum of the last column
    #[arg(long, default_value_t = DISTRIBUTION_Y_SCALE)]
    scale_factor: f64,
    #[arg(long, default_value_t = DISTRIBUTION_BINS)]
    bins: usize,
}

#[derive(Args, Debug)]
struct XyArgs {
    input: PathBuf,
    #[arg(long, default_value = DEFAULT_XY_COLUMNS.0)]
    x_column: ColumnSelector,
    #[arg(long, default_value = DEFAULT_XY_COLUMNS.1)]
    y_column: ColumnSelector,
    /// Fix both axes to ±LIMIT
    #[arg(long)]
    limit: Option<f64>,
    #[arg(long, default_value = "XY Nanocube Commands")]
    title: String,
}

#[derive(Args, Debug)]
struct InfoArgs {
    input: PathBuf,
}

fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "\\t" | "\t" | "tab" => Ok(b'\t'),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c as u8),
                _ => Err(format!("delimiter must be a single ASCII character, got '{s}'")),
            }
        }
    }
}

fn render_config(cli: &Cli) -> RenderConfig {
    let defaults = RenderConfig::default();
    RenderConfig {
        width: cli.width.unwrap_or(defaults.width),
        height: cli.height.unwrap_or(defaults.height),
        output_dir: cli.output_dir.clone(),
        format: cli.format,
        ..defaults
    }
}

fn log_info(log: &AfmLog) {
    info!("Source: {}", log.source.display());
    info!("Rows: {}", log.len());
    info!("Columns:");
    for (i, name) in log.column_names.iter().enumerate() {
        info!("  [{i}] {name}");
    }
    let experiment = log.experiment_info();
    if experiment.is_empty() {
        info!("No scan parameters found");
    } else {
        info!("Scan parameters: {}", experiment.format_for_title());
    }
    for (key, value) in &log.metadata {
        info!("  {key} = {value}");
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = render_config(cli);
    let needs_output = !matches!(cli.command, Command::Info(_));
    if needs_output {
        fs::create_dir_all(&config.output_dir)?;
    }

    match &cli.command {
        Command::Period(args) => {
            let log = load_log(&args.input, cli.delimiter)?;
            let settings = PeriodOverlaySettings {
                sample_rate: args.sample_rate,
                window_size: args.window,
                poly_order: args.poly_order,
            };
            plot_period_overlay(
                &log,
                &args.columns,
                &args.context_columns,
                settings,
                &root_name_for(&args.input),
                &config,
            )
        }
        Command::Settling(args) => {
            let logs = args
                .inputs
                .iter()
                .map(|path| load_pressure_log(path, cli.delimiter))
                .collect::<Result<Vec<_>, _>>()?;
            let settings = SettlingSettings {
                response_column: args.response_column.clone(),
                command_column: args.command_column.clone(),
                time_column: (!args.row_time).then(|| args.time_column.clone()),
                step_high: args.step_high,
                step_low: args.step_low,
                tolerance: args.tolerance,
                sample_period: args.sample_period,
                max_rows: (args.max_rows > 0).then_some(args.max_rows),
                x_max: args.x_max,
            };
            let root_name = match args.inputs.as_slice() {
                [single] => root_name_for(single),
                _ => "pressure".to_string(),
            };
            let summaries = plot_settling_times(&logs, &settings, &root_name, &config)?;
            info!(
                "Measured {} of {} settling times",
                summaries.len(),
                args.inputs.len()
            );
            Ok(())
        }
        Command::Spectrogram(args) => {
            let log = load_log(&args.input, cli.delimiter)?;
            plot_spectrogram(
                &log,
                &args.column,
                args.sample_rate,
                args.window_s,
                args.overlap,
                &root_name_for(&args.input),
                &config,
            )
        }
        Command::Plot(args) => {
            let log = load_log(&args.input, cli.delimiter)?;
            plot_log_columns(
                &log,
                &args.columns,
                args.sample_rate,
                args.time_units,
                &root_name_for(&args.input),
                &config,
            )
        }
        Command::Image(args) => {
            let image_log = load_image_log(&args.input)?;
            let topography_range = args.topo_low.zip(args.topo_high);
            plot_image_log(
                &image_log,
                topography_range,
                &root_name_for(&args.input),
                &config,
            )
        }
        Command::Distributions(args) => {
            let log = load_log(&args.input, cli.delimiter)?;
            let settings = DistributionSettings {
                sample_rate: args.sample_rate,
                time_units: args.time_units,
                y_scale: args.scale_factor,
                bins: args.bins,
            };
            plot_obd_distributions(
                &log,
                &args.columns,
                settings,
                &root_name_for(&args.input),
                &config,
            )
        }
        Command::Xy(args) => {
            let log = load_log(&args.input, cli.delimiter)?;
            let root_name = root_name_for(&args.input);
            let title = format!("{} ({root_name})", args.title);
            plot_xy_path(
                &log,
                &args.x_column,
                &args.y_column,
                args.limit,
                &title,
                &root_name,
                &config,
            )
        }
        Command::Info(args) => {
            let log = load_log(&args.input, cli.delimiter)?;
            log_info(&log);
            Ok(())
        }
    }
}

fn input_paths(command: &Command) -> Vec<&Path> {
    match command {
        Command::Period(a) => vec![a.input.as_path()],
        Command::Settling(a) => a.inputs.iter().map(PathBuf::as_path).collect(),
        Command::Spectrogram(a) => vec![a.input.as_path()],
        Command::Plot(a) => vec![a.input.as_path()],
        Command::Image(a) => vec![a.input.as_path()],
        Command::Distributions(a) => vec![a.input.as_path()],
        Command::Xy(a) => vec![a.input.as_path()],
        Command::Info(a) => vec![a.input.as_path()],
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    info!("AFM_CSV_Render {}", env!("CARGO_PKG_VERSION"));
    for path in input_paths(&cli.command) {
        info!("Input: {}", path.display());
    }

    if let Err(e) = run(&cli) {
        error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_values() {
        assert_eq!(parse_delimiter(","), Ok(b','));
        assert_eq!(parse_delimiter("\\t"), Ok(b'\t'));
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert!(parse_delimiter(";;").is_err());
    }

    #[test]
    fn cli_parses_period_command() {
        let cli = Cli::try_parse_from([
            "AFM_CSV_Render",
            "--format",
            "svg",
            "period",
            "scan.csv",
            "--column",
            "X Command (um)",
            "--column",
            "4",
            "--context-column",
            "RT Time Samples",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Svg);
        match cli.command {
            Command::Period(args) => {
                assert_eq!(args.columns.len(), 2);
                assert_eq!(args.columns[1], ColumnSelector::Index(4));
                assert_eq!(args.sample_rate, DEFAULT_SAMPLE_RATE_HZ);
                assert_eq!(args.window, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_settling_defaults() {
        let cli = Cli::try_parse_from(["AFM_CSV_Render", "settling", "a.csv", "b.csv"]).unwrap();
        match cli.command {
            Command::Settling(args) => {
                assert_eq!(args.inputs.len(), 2);
                assert_eq!(args.response_column, ColumnSelector::Index(0));
                assert_eq!(args.command_column, ColumnSelector::Index(2));
                assert_eq!(args.time_column, ColumnSelector::Index(1));
                assert!(!args.row_time);
                assert_eq!(args.max_rows, DEFAULT_SETTLING_MAX_ROWS);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_image_limits_come_in_pairs() {
        assert!(
            Cli::try_parse_from(["AFM_CSV_Render", "image", "scan", "--topo-low", "-1"]).is_err()
        );
        let cli = Cli::try_parse_from([
            "AFM_CSV_Render",
            "image",
            "scan",
            "--topo-low",
            "-1",
            "--topo-high",
            "2",
        ])
        .unwrap();
        match cli.command {
            Command::Image(args) => {
                assert_eq!(args.topo_low.zip(args.topo_high), Some((-1.0, 2.0)))
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_xy_and_distribution_defaults() {
        let cli = Cli::try_parse_from(["AFM_CSV_Render", "xy", "data-log"]).unwrap();
        match cli.command {
            Command::Xy(args) => {
                assert_eq!(args.x_column, ColumnSelector::Name("X Command (um)".into()));
                assert_eq!(args.y_column, ColumnSelector::Name("Y Command (um)".into()));
                assert_eq!(args.limit, None);
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["AFM_CSV_Render", "distributions", "data-log"]).unwrap();
        match cli.command {
            Command::Distributions(args) => {
                assert!(args.columns.is_empty());
                assert_eq!(args.time_units, TimeUnits::Minutes);
                assert_eq!(args.bins, DISTRIBUTION_BINS);
                assert_eq!(args.scale_factor, DISTRIBUTION_Y_SCALE);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}

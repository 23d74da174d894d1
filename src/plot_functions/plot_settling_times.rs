// src/plot_functions/plot_settling_times.rs

use log::{info, warn};
use ndarray::Array1;
use std::error::Error;

use crate::constants::{COLOR_COMMAND, COLOR_RESPONSE, LINE_WIDTH_PLOT};
use crate::data_analysis::settling_time::{estimate_settling_time, estimate_time_constant};
use crate::data_input::log_data::{AfmLog, ColumnSelector};
use crate::error::AnalysisError;
use crate::plot_framework::{
    draw_stacked_plot, PanelConfig, PanelResult, PlotSeries, UnavailablePanel,
};
use crate::render_config::{root_name_for, RenderConfig};

/// Column layout and step definition for a batch of pressure logs.
#[derive(Debug, Clone)]
pub struct SettlingSettings {
    pub response_column: ColumnSelector,
    pub command_column: ColumnSelector,
    /// Sample counter column; the row index is used when absent.
    pub time_column: Option<ColumnSelector>,
    pub step_high: f64,
    pub step_low: f64,
    pub tolerance: f64,
    pub sample_period: f64,
    pub max_rows: Option<usize>,
    pub x_max: f64,
}

/// Settling time and time constant of one log, for the summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlingSummary {
    pub name: String,
    pub settling_time_s: f64,
    pub time_constant_s: Option<f64>,
}

fn settling_panel(
    log: &AfmLog,
    settings: &SettlingSettings,
) -> Result<(PanelConfig, SettlingSummary), UnavailablePanel> {
    let name = root_name_for(&log.source);
    let mut log = log.clone();
    if let Some(max_rows) = settings.max_rows {
        log.truncate(max_rows);
    }

    let column = |selector: &ColumnSelector| {
        log.column(selector)
            .map(|(_, values)| values.clone())
            .ok_or_else(|| {
                UnavailablePanel::new(&name, format!("Column {selector} not found in log"))
            })
    };
    let response = column(&settings.response_column)?;
    let command = column(&settings.command_column)?;
    let time_ticks = match &settings.time_column {
        Some(selector) => column(selector)?,
        None => Array1::from_shape_fn(log.len(), |i| i as f64),
    };

    let result = estimate_settling_time(
        &response,
        &command,
        settings.step_high,
        settings.step_low,
        settings.tolerance,
        settings.sample_period,
    )
    .map_err(|e: AnalysisError| UnavailablePanel::new(&name, &e))?;

    let time_constant_s = match estimate_time_constant(
        &response,
        &command,
        settings.step_high,
        settings.step_low,
        settings.sample_period,
    ) {
        Ok((tau, _)) => Some(tau),
        Err(e) => {
            warn!("{name}: time constant unavailable: {e}");
            None
        }
    };

    let t0 = time_ticks[result.transition_index] * settings.sample_period;
    let in_window = |t: f64| (0.0..=settings.x_max).contains(&t);
    let points = |values: &Array1<f64>| -> Vec<(f64, f64)> {
        time_ticks
            .iter()
            .zip(values.iter())
            .map(|(&tick, &v)| (tick * settings.sample_period - t0, v))
            .filter(|&(t, v)| in_window(t) && v.is_finite())
            .collect()
    };

    let y_low = settings.step_low.min(0.0);
    let y_high = settings.step_high.max(settings.step_low) * 1.25;
    let panel = PanelConfig {
        title: name.clone(),
        x_range: 0.0..settings.x_max,
        y_range: y_low..y_high,
        series: vec![
            PlotSeries {
                data: points(&response),
                label: format!(
                    "Pressure Reading, Transition Time: {:.2} s",
                    result.settling_time_s
                ),
                color: *COLOR_RESPONSE,
                stroke_width: LINE_WIDTH_PLOT,
            },
            PlotSeries {
                data: points(&command),
                label: "Command Pressure".to_string(),
                color: *COLOR_COMMAND,
                stroke_width: LINE_WIDTH_PLOT,
            },
        ],
        x_label: "Time (s)".to_string(),
        y_label: "Pressure (psi)".to_string(),
        secondary: None,
    };
    let summary = SettlingSummary {
        name,
        settling_time_s: result.settling_time_s,
        time_constant_s,
    };
    Ok((panel, summary))
}

/// Generates one stacked figure with a settling-time panel per pressure log.
/// Logs whose step cannot be measured get a placeholder panel.
pub fn plot_settling_times(
    logs: &[AfmLog],
    settings: &SettlingSettings,
    root_name: &str,
    config: &RenderConfig,
) -> Result<Vec<SettlingSummary>, Box<dyn Error>> {
    if logs.is_empty() {
        return Err("No pressure logs given for the settling time plot".into());
    }

    let mut panels: Vec<PanelResult> = Vec::with_capacity(logs.len());
    let mut summaries = Vec::new();
    for log in logs {
        match settling_panel(log, settings) {
            Ok((panel, summary)) => {
                match summary.time_constant_s {
                    Some(tau) => info!(
                        "{}: settling time {:.2} s, time constant {:.3} s",
                        summary.name, summary.settling_time_s, tau
                    ),
                    None => info!(
                        "{}: settling time {:.2} s",
                        summary.name, summary.settling_time_s
                    ),
                }
                panels.push(Ok(panel));
                summaries.push(summary);
            }
            Err(placeholder) => {
                warn!("{}: {}", placeholder.title, placeholder.reason);
                panels.push(Err(placeholder));
            }
        }
    }

    draw_stacked_plot(
        &config.output_path(root_name, "SettlingTimes"),
        root_name,
        "Pressure Settling Times",
        None,
        panels,
        config,
    )?;
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_input::log_parser::load_pressure_log;
    use std::path::PathBuf;

    fn pressure_log() -> AfmLog {
        let n = 400;
        let command = Array1::from_shape_fn(n, |i| if i < 100 { 0.2 } else { 0.0 });
        let response = Array1::from_shape_fn(n, |i| {
            if i < 100 {
                0.2
            } else {
                0.2 * (-((i - 100) as f64) * 0.01 / 0.5).exp()
            }
        });
        let ticks = Array1::from_shape_fn(n, |i| i as f64);
        AfmLog {
            source: PathBuf::from("p=2-pressure.csv"),
            metadata: vec![],
            column_names: vec!["Pressure".into(), "Tick".into(), "Command".into()],
            columns: vec![response, ticks, command],
        }
    }

    fn settings() -> SettlingSettings {
        SettlingSettings {
            response_column: ColumnSelector::Index(0),
            command_column: ColumnSelector::Index(2),
            time_column: Some(ColumnSelector::Index(1)),
            step_high: 0.2,
            step_low: 0.0,
            tolerance: 0.05,
            sample_period: 0.01,
            max_rows: Some(2100),
            x_max: 5.0,
        }
    }

    #[test]
    fn panel_is_rezeroed_at_transition() {
        let (panel, summary) = settling_panel(&pressure_log(), &settings()).unwrap();
        assert_eq!(summary.name, "p=2-pressure");
        assert!((summary.settling_time_s - 1.5).abs() < 0.011);
        assert!((summary.time_constant_s.unwrap() - 0.5).abs() < 0.011);
        let first = panel.series[0].data[0];
        assert!(first.0.abs() < 1e-12);
        assert!(panel.series[0].label.starts_with("Pressure Reading, Transition Time: 1.5"));
        assert!((panel.y_range.end - 0.25).abs() < 1e-12);
    }

    #[test]
    fn experiment_folder_uses_its_pressure_reading() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("p=3-data-log-[18-19-45]-experiment");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(dir.join("z-command.csv"), "0\n0\n0\n").unwrap();
        let mut content = String::from("Pressure,Tick,Command\n");
        let log = pressure_log();
        for i in 0..log.len() {
            content.push_str(&format!(
                "{},{},{}\n",
                log.columns[0][i], log.columns[1][i], log.columns[2][i]
            ));
        }
        std::fs::write(dir.join("pressure-reading.csv"), content).unwrap();

        let loaded = load_pressure_log(&dir, None).unwrap();
        let (panel, summary) = settling_panel(&loaded, &settings()).unwrap();
        assert_eq!(summary.name, "p=3-data-log-[18-19-45]-experiment");
        assert!((summary.settling_time_s - 1.5).abs() < 0.011);
        assert!(panel.series[0].data[0].0.abs() < 1e-12);
    }

    #[test]
    fn missing_column_becomes_placeholder() {
        let mut s = settings();
        s.command_column = ColumnSelector::Name("Command Pressure".into());
        let err = settling_panel(&pressure_log(), &s).unwrap_err();
        assert_eq!(err.title, "p=2-pressure");
        assert!(err.reason.contains("Command Pressure"));
    }

    #[test]
    fn no_transition_becomes_placeholder() {
        let mut s = settings();
        s.max_rows = Some(50);
        let err = settling_panel(&pressure_log(), &s).unwrap_err();
        assert!(err.reason.contains("transition"));
    }
}

// src/plot_functions/plot_settling_times.rs

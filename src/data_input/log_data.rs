// src/data_input/log_data.rs

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use ndarray::{s, Array1};

use crate::data_input::experiment_info::ExperimentInfo;

/// Column reference given on the command line: a zero-based index if the
/// text is all digits, otherwise a header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    Index(usize),
    Name(String),
}

impl FromStr for ColumnSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("column selector must not be empty".to_string());
        }
        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            trimmed
                .parse::<usize>()
                .map(ColumnSelector::Index)
                .map_err(|e| format!("invalid column index '{trimmed}': {e}"))
        } else {
            Ok(ColumnSelector::Name(trimmed.to_string()))
        }
    }
}

impl fmt::Display for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSelector::Index(i) => write!(f, "column #{i}"),
            ColumnSelector::Name(name) => write!(f, "'{name}'"),
        }
    }
}

/// A loaded log: named numeric columns plus the parameter block that
/// preceded them. Missing cells are `NaN`.
#[derive(Debug, Clone, Default)]
pub struct AfmLog {
    pub source: PathBuf,
    pub metadata: Vec<(String, String)>,
    pub column_names: Vec<String>,
    pub columns: Vec<Array1<f64>>,
}

impl AfmLog {
    /// Number of rows (all columns share the same length).
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves a selector. Names match exactly first, then ignoring case.
    pub fn column_index(&self, selector: &ColumnSelector) -> Option<usize> {
        match selector {
            ColumnSelector::Index(i) => (*i < self.columns.len()).then_some(*i),
            ColumnSelector::Name(name) => self
                .column_names
                .iter()
                .position(|n| n == name)
                .or_else(|| {
                    self.column_names
                        .iter()
                        .position(|n| n.eq_ignore_ascii_case(name))
                }),
        }
    }

    pub fn column(&self, selector: &ColumnSelector) -> Option<(&str, &Array1<f64>)> {
        self.column_index(selector)
            .map(|i| (self.column_names[i].as_str(), &self.columns[i]))
    }

    /// Like [`AfmLog::column`] but with an error listing what is available.
    pub fn require_column(
        &self,
        selector: &ColumnSelector,
    ) -> Result<(&str, &Array1<f64>), Box<dyn Error>> {
        self.column(selector).ok_or_else(|| {
            format!(
                "Column {} not found in '{}'. Available columns: {}",
                selector,
                self.source.display(),
                self.column_names
                    .iter()
                    .enumerate()
                    .map(|(i, n)| format!("[{i}] {n}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )
            .into()
        })
    }

    /// Keeps at most `max_rows` rows.
    pub fn truncate(&mut self, max_rows: usize) {
        if max_rows >= self.len() {
            return;
        }
        for column in self.columns.iter_mut() {
            *column = column.slice(s![..max_rows]).to_owned();
        }
    }

    /// Uniform time base `i / sample_rate` for every row.
    pub fn time_base(&self, sample_rate: f64) -> Array1<f64> {
        Array1::from_shape_fn(self.len(), |i| i as f64 / sample_rate)
    }

    pub fn experiment_info(&self) -> ExperimentInfo {
        ExperimentInfo::from_metadata(&self.metadata)
    }
}

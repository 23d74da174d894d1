// src/data_input/log_parser.rs

use csv::ReaderBuilder;
use log::{debug, info, warn};
use ndarray::{s, Array1, Array2};
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::constants::{
    FOLDER_ERROR_IMAGE_FILE, FOLDER_INFO_FILE, FOLDER_PRESSURE_READING_FILE, FOLDER_SIGNAL_FILES,
    FOLDER_TOPOGRAPHY_FILE,
};
use crate::data_input::image_log::ImageLog;
use crate::data_input::log_data::AfmLog;

/// How a single CSV row is interpreted.
#[derive(Debug, Clone, PartialEq)]
enum RowKind {
    /// Every non-empty cell parses as a number. Empty cells become `NaN`.
    Numeric(Vec<f64>),
    /// `name, number, name, number, ...` as written by the acquisition
    /// software for scan parameters.
    Parameters(Vec<(String, String)>),
    /// Anything else: a header or a free-text preamble line.
    Names(Vec<String>),
}

fn classify_row(cells: &[String]) -> Option<RowKind> {
    let non_empty: Vec<&str> = cells
        .iter()
        .map(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .collect();
    if non_empty.is_empty() {
        return None;
    }

    if non_empty.iter().all(|c| c.parse::<f64>().is_ok()) {
        let values = cells
            .iter()
            .map(|c| c.parse::<f64>().unwrap_or(f64::NAN))
            .collect();
        return Some(RowKind::Numeric(values));
    }

    let is_parameter_row = non_empty.len() % 2 == 0
        && non_empty.chunks(2).all(|pair| {
            pair[0].parse::<f64>().is_err() && pair[1].parse::<f64>().is_ok()
        });
    if is_parameter_row {
        let pairs = non_empty
            .chunks(2)
            .map(|pair| (pair[0].to_string(), pair[1].to_string()))
            .collect();
        return Some(RowKind::Parameters(pairs));
    }

    Some(RowKind::Names(cells.to_vec()))
}

/// A preamble line that turned out not to be the header is kept as a
/// `key, value` pair (remaining cells joined).
fn fold_names_into_metadata(names: Vec<String>, metadata: &mut Vec<(String, String)>) {
    let mut cells = names.into_iter().filter(|c| !c.is_empty());
    if let Some(key) = cells.next() {
        let value = cells.collect::<Vec<_>>().join(", ");
        metadata.push((key, value));
    }
}

/// Rows of a file sorted into preamble, header and data.
#[derive(Debug, Default)]
struct ScannedLog {
    metadata: Vec<(String, String)>,
    header: Option<Vec<String>>,
    rows: Vec<Vec<f64>>,
    skipped_rows: usize,
}

fn detect_delimiter(content: &str) -> u8 {
    let first_line = content.lines().find(|l| !l.trim().is_empty());
    match first_line {
        Some(line) if line.contains('\t') => b'\t',
        _ => b',',
    }
}

fn scan_rows(content: &str, delimiter: u8) -> Result<ScannedLog, Box<dyn Error>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut scanned = ScannedLog::default();
    let mut pending_names: Option<Vec<String>> = None;

    for (row_index, result) in reader.records().enumerate() {
        let record = result?;
        let cells: Vec<String> = record
            .iter()
            .map(|c| c.trim_matches('"').trim().to_string())
            .collect();
        let Some(kind) = classify_row(&cells) else {
            continue;
        };

        match kind {
            RowKind::Numeric(values) => {
                if scanned.rows.is_empty() {
                    scanned.header = pending_names.take();
                }
                scanned.rows.push(values);
            }
            RowKind::Parameters(pairs) if scanned.rows.is_empty() => {
                scanned.metadata.extend(pairs);
            }
            RowKind::Names(names) if scanned.rows.is_empty() => {
                if let Some(previous) = pending_names.replace(names) {
                    fold_names_into_metadata(previous, &mut scanned.metadata);
                }
            }
            _ => {
                warn!("Skipping non-numeric row {} inside the data block", row_index + 1);
                scanned.skipped_rows += 1;
            }
        }
    }

    if scanned.rows.is_empty() {
        scanned.header = pending_names;
    }
    Ok(scanned)
}

fn build_log(source: &Path, scanned: ScannedLog) -> AfmLog {
    let header = scanned.header.unwrap_or_default();
    let widest_row = scanned.rows.iter().map(|r| r.len()).max().unwrap_or(0);
    let num_columns = header.len().max(widest_row);

    let column_names: Vec<String> = (0..num_columns)
        .map(|i| match header.get(i) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("column {i}"),
        })
        .collect();

    let columns: Vec<Array1<f64>> = (0..num_columns)
        .map(|col| {
            scanned
                .rows
                .iter()
                .map(|row| row.get(col).copied().unwrap_or(f64::NAN))
                .collect()
        })
        .collect();

    AfmLog {
        source: source.to_path_buf(),
        metadata: scanned.metadata,
        column_names,
        columns,
    }
}

/// Parses one CSV (or tab-separated) log file.
///
/// Parameter rows and free-text lines above the data become metadata; the
/// last text row directly above the first numeric row is the column header.
/// Files without a header get `column 0`, `column 1`, ... names.
pub fn parse_log_file(
    input_file_path: &Path,
    delimiter: Option<u8>,
) -> Result<AfmLog, Box<dyn Error>> {
    info!("Parsing log file: {}", input_file_path.display());
    let content = fs::read_to_string(input_file_path)?;
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));
    debug!("Using delimiter {:?}", delimiter as char);

    let scanned = scan_rows(&content, delimiter)?;
    if scanned.rows.is_empty() {
        return Err(format!(
            "No numeric data rows found in '{}'",
            input_file_path.display()
        )
        .into());
    }

    info!("Extracted {} metadata entries", scanned.metadata.len());
    for (key, value) in scanned.metadata.iter().take(5) {
        debug!("  '{key}' = '{value}'");
    }
    if scanned.header.is_none() {
        info!("No header row found; columns will be numbered");
    }
    if scanned.skipped_rows > 0 {
        warn!("Skipped {} non-numeric rows", scanned.skipped_rows);
    }

    let log = build_log(input_file_path, scanned);
    debug!("Header mapping status:");
    for (i, name) in log.column_names.iter().enumerate() {
        debug!("  [{i}] '{name}'");
    }
    info!(
        "Read {} rows x {} columns from {}",
        log.len(),
        log.column_names.len(),
        input_file_path.display()
    );
    Ok(log)
}

/// Scan parameters from a folder's `experiment-info.csv`, empty when the
/// file is absent.
fn read_folder_metadata(dir: &Path) -> Result<Vec<(String, String)>, Box<dyn Error>> {
    let info_path = dir.join(FOLDER_INFO_FILE);
    if !info_path.is_file() {
        debug!("{FOLDER_INFO_FILE} not found in {}", dir.display());
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(&info_path)?;
    let mut scanned = scan_rows(&content, detect_delimiter(&content))?;
    if let Some(names) = scanned.header.take() {
        fold_names_into_metadata(names, &mut scanned.metadata);
    }
    info!(
        "Extracted {} metadata entries from {}",
        scanned.metadata.len(),
        FOLDER_INFO_FILE
    );
    Ok(scanned.metadata)
}

/// Parses a log folder: one single-column CSV per signal plus an optional
/// `experiment-info.csv` holding the scan parameters.
pub fn parse_log_folder(dir: &Path) -> Result<AfmLog, Box<dyn Error>> {
    info!("Parsing log folder: {}", dir.display());

    let metadata = read_folder_metadata(dir)?;

    let mut column_names = Vec::new();
    let mut columns: Vec<Array1<f64>> = Vec::new();
    for (file_name, column_name, required) in FOLDER_SIGNAL_FILES {
        let path = dir.join(file_name);
        if !path.is_file() {
            if required {
                warn!("Expected signal file {file_name} is missing");
            } else {
                debug!("Optional signal file {file_name} not present");
            }
            continue;
        }
        let signal_log = parse_log_file(&path, None)?;
        match signal_log.columns.into_iter().next() {
            Some(column) => {
                column_names.push(column_name.to_string());
                columns.push(column);
            }
            None => warn!("{file_name} has no columns"),
        }
    }

    if columns.is_empty() {
        return Err(format!("No signal files found in folder '{}'", dir.display()).into());
    }

    let shortest = columns.iter().map(|c| c.len()).min().unwrap_or(0);
    if columns.iter().any(|c| c.len() != shortest) {
        warn!("Signal files differ in length; truncating all to {shortest} rows");
        for column in columns.iter_mut() {
            *column = column.slice(s![..shortest]).to_owned();
        }
    }

    info!("Read {} rows x {} columns from {}", shortest, columns.len(), dir.display());
    Ok(AfmLog {
        source: dir.to_path_buf(),
        metadata,
        column_names,
        columns,
    })
}

/// Loads either a single log file or a log folder.
pub fn load_log(path: &Path, delimiter: Option<u8>) -> Result<AfmLog, Box<dyn Error>> {
    if path.is_dir() {
        parse_log_folder(path)
    } else if path.is_file() {
        parse_log_file(path, delimiter)
    } else {
        Err(format!("Input path '{}' does not exist", path.display()).into())
    }
}

/// Loads a pressure-controller log. A folder resolves to its
/// `pressure-reading.csv`; the log keeps the folder as its source so plots
/// are named after the experiment.
pub fn load_pressure_log(path: &Path, delimiter: Option<u8>) -> Result<AfmLog, Box<dyn Error>> {
    if !path.is_dir() {
        return load_log(path, delimiter);
    }
    let reading_path = path.join(FOLDER_PRESSURE_READING_FILE);
    if !reading_path.is_file() {
        return Err(format!(
            "Pressure folder '{}' has no {FOLDER_PRESSURE_READING_FILE}",
            path.display()
        )
        .into());
    }
    let mut log = parse_log_file(&reading_path, delimiter)?;
    log.source = path.to_path_buf();
    Ok(log)
}

/// Reads a raster image (rows of numbers, tab or comma separated). Ragged
/// rows are padded with `NaN`; text rows are ignored.
pub fn parse_image_file(path: &Path) -> Result<Array2<f64>, Box<dyn Error>> {
    let content = fs::read_to_string(path)?;
    let scanned = scan_rows(&content, detect_delimiter(&content))?;
    let width = scanned.rows.iter().map(|r| r.len()).max().unwrap_or(0);
    if scanned.rows.is_empty() || width == 0 {
        return Err(format!("No image rows found in '{}'", path.display()).into());
    }
    let height = scanned.rows.len();
    let image = Array2::from_shape_fn((height, width), |(i, j)| {
        scanned.rows[i].get(j).copied().unwrap_or(f64::NAN)
    });
    debug!("Read {height} x {width} image from {}", path.display());
    Ok(image)
}

/// Loads an image log. A folder holds `topo-image.csv`, an optional
/// `error-image.csv` and `experiment-info.csv`; a single file is read as the
/// topography alone.
pub fn load_image_log(path: &Path) -> Result<ImageLog, Box<dyn Error>> {
    if path.is_file() {
        return Ok(ImageLog {
            source: path.to_path_buf(),
            metadata: Vec::new(),
            topography: parse_image_file(path)?,
            error: None,
        });
    }
    if !path.is_dir() {
        return Err(format!("Input path '{}' does not exist", path.display()).into());
    }

    let topo_path = path.join(FOLDER_TOPOGRAPHY_FILE);
    if !topo_path.is_file() {
        return Err(format!(
            "Image folder '{}' has no {FOLDER_TOPOGRAPHY_FILE}",
            path.display()
        )
        .into());
    }
    let topography = parse_image_file(&topo_path)?;

    let error_path = path.join(FOLDER_ERROR_IMAGE_FILE);
    let error = if error_path.is_file() {
        Some(parse_image_file(&error_path)?)
    } else {
        warn!("{FOLDER_ERROR_IMAGE_FILE} not found in {}", path.display());
        None
    };

    let (rows, cols) = topography.dim();
    info!("Read {rows} x {cols} topography image from {}", path.display());
    Ok(ImageLog {
        source: path.to_path_buf(),
        metadata: read_folder_metadata(path)?,
        topography,
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn cells(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn classifies_rows() {
        match classify_row(&cells(&["1.5", "", "-2e-3"])) {
            Some(RowKind::Numeric(v)) => {
                assert_eq!(v[0], 1.5);
                assert!(v[1].is_nan());
                assert_eq!(v[2], -2e-3);
            }
            other => panic!("expected numeric row, got {other:?}"),
        }
        assert_eq!(
            classify_row(&cells(&["P", "0.001", "LPS", "0.5"])),
            Some(RowKind::Parameters(vec![
                ("P".to_string(), "0.001".to_string()),
                ("LPS".to_string(), "0.5".to_string()),
            ]))
        );
        assert_eq!(
            classify_row(&cells(&["Time (s)", "Pressure (psi)"])),
            Some(RowKind::Names(cells(&["Time (s)", "Pressure (psi)"])))
        );
        assert_eq!(classify_row(&cells(&["", ""])), None);
    }

    #[test]
    fn delimiter_detection() {
        assert_eq!(detect_delimiter("\n\na\tb\n1\t2"), b'\t');
        assert_eq!(detect_delimiter("a,b\n1,2"), b',');
        assert_eq!(detect_delimiter(""), b',');
    }

    #[test]
    fn header_is_last_text_row_before_data() {
        let content = "Scan notes,tip 3\n\
                       P,0.001,I,0.0002\n\
                       X Command (um),OBD SUM (V)\n\
                       1,0.5\n\
                       2,0.6\n\
                       oops,text\n\
                       3\n";
        let scanned = scan_rows(content, b',').unwrap();
        assert_eq!(
            scanned.header,
            Some(cells(&["X Command (um)", "OBD SUM (V)"]))
        );
        assert_eq!(scanned.metadata.len(), 3);
        assert_eq!(scanned.metadata[0], ("P".to_string(), "0.001".to_string()));
        assert_eq!(scanned.metadata[2], ("Scan notes".to_string(), "tip 3".to_string()));
        assert_eq!(scanned.rows.len(), 3);
        assert_eq!(scanned.skipped_rows, 1);

        let log = build_log(&PathBuf::from("scan.csv"), scanned);
        assert_eq!(log.len(), 3);
        assert_eq!(log.columns[0].to_vec(), vec![1.0, 2.0, 3.0]);
        assert!(log.columns[1][2].is_nan());
    }

    #[test]
    fn headerless_columns_are_numbered() {
        let scanned = scan_rows("1\t2\t3\n4\t5\t6\n", b'\t').unwrap();
        let log = build_log(&PathBuf::from("raw.tsv"), scanned);
        assert_eq!(log.column_names, cells(&["column 0", "column 1", "column 2"]));
        assert_eq!(log.columns[2].to_vec(), vec![3.0, 6.0]);
    }
}

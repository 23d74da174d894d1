// tests/log_parser_test.rs

use afm_csv_render::data_input::log_data::ColumnSelector;
use afm_csv_render::data_input::log_parser::{
    load_image_log, load_log, load_pressure_log, parse_log_file, parse_log_folder,
};
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

fn write_temp(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn scan_log_with_parameter_block() {
    let file = write_temp(
        "P,0.001,I,0.0002,D,0\n\
         LPS,0.5,Size X,50000,Size Y,50000\n\
         Z Set Point,0.2,Offset X,1000,Offset Y,1000\n\
         X Command (um),Y Command (um),OBD SUM (V)\n\
         0.0,0.0,1.5\n\
         0.5,0.0,1.6\n\
         1.0,0.1,1.7\n",
        ".csv",
    );
    let log = parse_log_file(file.path(), None).unwrap();

    assert_eq!(log.len(), 3);
    assert_eq!(
        log.column_names,
        vec!["X Command (um)", "Y Command (um)", "OBD SUM (V)"]
    );
    let (_, obd) = log
        .column(&ColumnSelector::Name("obd sum (v)".to_string()))
        .unwrap();
    assert_eq!(obd.to_vec(), vec![1.5, 1.6, 1.7]);

    let info = log.experiment_info();
    assert_eq!(info.p_gain, Some(0.001));
    assert_eq!(info.lines_per_second, Some(0.5));
    assert_eq!(
        info.format_for_title(),
        "Kp = 1.0e-3, Ki = 2.0e-4, Kd = 0.0e0, LPS = 0.50, Lx = 50 µm, Ly = 50 µm, \
         r(t) = 0.20 V, δx = 1.0 µm, δy = 1.0 µm"
    );
}

#[test]
fn tab_separated_log_is_detected() {
    let file = write_temp("Time\tPressure (psi)\n0\t0.2\n1\t0.19\n", ".tsv");
    let log = parse_log_file(file.path(), None).unwrap();
    assert_eq!(log.column_names, vec!["Time", "Pressure (psi)"]);
    assert_eq!(log.columns[1].to_vec(), vec![0.2, 0.19]);
}

#[test]
fn headerless_pressure_log() {
    let file = write_temp("0.2,0,0.2\n0.2,1,0.2\n0.1,2,0\n", ".csv");
    let log = parse_log_file(file.path(), None).unwrap();
    assert_eq!(log.column_names, vec!["column 0", "column 1", "column 2"]);
    assert_eq!(log.columns[2].to_vec(), vec![0.2, 0.2, 0.0]);
}

#[test]
fn explicit_delimiter_overrides_detection() {
    let file = write_temp("a;b\n1;2\n3;4\n", ".csv");
    let log = parse_log_file(file.path(), Some(b';')).unwrap();
    assert_eq!(log.column_names, vec!["a", "b"]);
    assert_eq!(log.len(), 2);
}

#[test]
fn file_without_numbers_is_an_error() {
    let file = write_temp("just,some\ntext,here\n", ".csv");
    let err = parse_log_file(file.path(), None).unwrap_err();
    assert!(err.to_string().contains("No numeric data rows"));
}

#[test]
fn folder_log_is_truncated_to_shortest_signal() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("experiment-info.csv"),
        "P,0.001\nLPS,1.0\nSize X,20000\n",
    )
    .unwrap();
    fs::write(dir.path().join("x-command.csv"), "0\n1\n2\n3\n").unwrap();
    fs::write(dir.path().join("y-command.csv"), "5\n6\n7\n").unwrap();
    fs::write(dir.path().join("obd-sum.csv"), "1.1\n1.2\n1.3\n1.4\n1.5\n").unwrap();

    let log = parse_log_folder(dir.path()).unwrap();
    assert_eq!(
        log.column_names,
        vec!["X Command (um)", "Y Command (um)", "OBD SUM (V)"]
    );
    assert_eq!(log.len(), 3);
    assert!(log.columns.iter().all(|c| c.len() == 3));
    assert_eq!(log.experiment_info().size_x_nm, Some(20000.0));

    let via_dispatch = load_log(dir.path(), None).unwrap();
    assert_eq!(via_dispatch.column_names, log.column_names);
}

#[test]
fn empty_folder_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(parse_log_folder(dir.path()).is_err());
}

#[test]
fn missing_path_is_an_error() {
    let dir = tempdir().unwrap();
    let err = load_log(&dir.path().join("nope.csv"), None).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn pressure_folder_reads_pressure_reading_file() {
    let root = tempdir().unwrap();
    let dir = root.path().join("p=2-data-log-[18-20-49]-experiment");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("x-command.csv"), "0\n1\n2\n").unwrap();
    fs::write(
        dir.join("pressure-reading.csv"),
        "Pressure,Tick,Command\n0.2,0,0.2\n0.2,1,0.2\n0.1,2,0\n0.01,3,0\n",
    )
    .unwrap();

    let log = load_pressure_log(&dir, None).unwrap();
    assert_eq!(log.source, dir);
    assert_eq!(log.column_names, vec!["Pressure", "Tick", "Command"]);
    assert_eq!(log.columns[2].to_vec(), vec![0.2, 0.2, 0.0, 0.0]);

    let single = load_pressure_log(&dir.join("pressure-reading.csv"), None).unwrap();
    assert_eq!(single.len(), 4);
}

#[test]
fn pressure_folder_without_reading_file_is_an_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("x-command.csv"), "0\n1\n").unwrap();
    let err = load_pressure_log(dir.path(), None).unwrap_err();
    assert!(err.to_string().contains("pressure-reading.csv"));
}

#[test]
fn image_folder_reads_topography_error_and_info() {
    let root = tempdir().unwrap();
    let dir = root.path().join("img-data-log-[13-34-28]-experiment");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("topo-image.csv"), "0.1\t0.2\t0.3\n0.4\t0.5\t0.6\n").unwrap();
    fs::write(dir.join("error-image.csv"), "1\t2\t3\n4\t5\n").unwrap();
    fs::write(
        dir.join("experiment-info.csv"),
        "P,0.001,I,0.0002,D,0\nLPS,0.5,Size X,20000,Size Y,20000\n",
    )
    .unwrap();

    let image_log = load_image_log(&dir).unwrap();
    assert_eq!(image_log.topography.dim(), (2, 3));
    assert_eq!(image_log.topography[[1, 2]], 0.6);
    let error = image_log.error.as_ref().unwrap();
    assert!(error[[1, 2]].is_nan());
    assert_eq!(image_log.experiment_info().size_x_nm, Some(20000.0));
    assert_eq!(image_log.experiment_time().as_deref(), Some("13:34"));
}

#[test]
fn image_folder_without_error_image_still_loads() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("topo-image.csv"), "1,2\n3,4\n").unwrap();
    let image_log = load_image_log(dir.path()).unwrap();
    assert!(image_log.error.is_none());
    assert!(image_log.metadata.is_empty());
}

#[test]
fn image_folder_without_topography_is_an_error() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("error-image.csv"), "1,2\n").unwrap();
    let err = load_image_log(dir.path()).unwrap_err();
    assert!(err.to_string().contains("topo-image.csv"));
}

// src/data_input/image_log.rs

use ndarray::Array2;
use std::path::PathBuf;

use crate::data_input::experiment_info::ExperimentInfo;

/// Raster images recorded by a scan. Row `i` of each image is the `i`-th
/// position along X, column `j` the `j`-th line from the top of the scan.
#[derive(Debug, Clone)]
pub struct ImageLog {
    pub source: PathBuf,
    pub metadata: Vec<(String, String)>,
    /// Height map in µm.
    pub topography: Array2<f64>,
    /// Controller error in V, when the scan recorded it.
    pub error: Option<Array2<f64>>,
}

impl ImageLog {
    pub fn experiment_info(&self) -> ExperimentInfo {
        ExperimentInfo::from_metadata(&self.metadata)
    }

    /// `HH:MM` taken from a `...[HH-MM-SS]...` folder or file name.
    pub fn experiment_time(&self) -> Option<String> {
        let name = self.source.file_name()?.to_string_lossy().into_owned();
        let start = name.rfind('[')? + 1;
        let end = start + name[start..].find(']')?;
        let mut fields = name[start..end].split('-');
        let hours = fields.next().filter(|h| !h.is_empty())?;
        let minutes = fields.next().filter(|m| !m.is_empty())?;
        Some(format!("{hours}:{minutes}"))
    }
}


// src/data_input/image_log.rs

// src/data_input/experiment_info.rs

use std::collections::HashMap;

/// Scan parameters recorded in the block above the data columns.
/// Lengths in the log are nanometres.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperimentInfo {
    pub p_gain: Option<f64>,
    pub i_gain: Option<f64>,
    pub d_gain: Option<f64>,
    pub lines_per_second: Option<f64>,
    pub size_x_nm: Option<f64>,
    pub size_y_nm: Option<f64>,
    pub z_setpoint_v: Option<f64>,
    pub offset_x_nm: Option<f64>,
    pub offset_y_nm: Option<f64>,
}

impl ExperimentInfo {
    /// Picks the known parameters out of `key, value` metadata pairs.
    /// Keys are matched case-insensitively; unknown keys are ignored.
    pub fn from_metadata(metadata: &[(String, String)]) -> Self {
        let map: HashMap<String, f64> = metadata
            .iter()
            .filter_map(|(k, v)| {
                v.trim()
                    .parse::<f64>()
                    .ok()
                    .map(|value| (k.trim().to_lowercase(), value))
            })
            .collect();
        let get = |key: &str| map.get(key).copied();

        Self {
            p_gain: get("p"),
            i_gain: get("i"),
            d_gain: get("d"),
            lines_per_second: get("lps"),
            size_x_nm: get("size x"),
            size_y_nm: get("size y"),
            z_setpoint_v: get("z set point"),
            offset_x_nm: get("offset x"),
            offset_y_nm: get("offset y"),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// One-line summary for plot subtitles, e.g.
    /// `Kp = 1.0e-3, Ki = 2.0e-4, Kd = 0.0e0, LPS = 0.50, Lx = 50 µm, ...`.
    /// Absent fields are left out.
    pub fn format_for_title(&self) -> String {
        let mut parts = Vec::new();

        if let Some(p) = self.p_gain {
            parts.push(format!("Kp = {p:.1e}"));
        }
        if let Some(i) = self.i_gain {
            parts.push(format!("Ki = {i:.1e}"));
        }
        if let Some(d) = self.d_gain {
            parts.push(format!("Kd = {d:.1e}"));
        }
        if let Some(lps) = self.lines_per_second {
            parts.push(format!("LPS = {lps:.2}"));
        }
        if let Some(x) = self.size_x_nm {
            parts.push(format!("Lx = {:.0} µm", (x / 1000.0).trunc()));
        }
        if let Some(y) = self.size_y_nm {
            parts.push(format!("Ly = {:.0} µm", (y / 1000.0).trunc()));
        }
        if let Some(z) = self.z_setpoint_v {
            parts.push(format!("r(t) = {z:.2} V"));
        }
        if let Some(x) = self.offset_x_nm {
            parts.push(format!("δx = {:.1} µm", x / 1000.0));
        }
        if let Some(y) = self.offset_y_nm {
            parts.push(format!("δy = {:.1} µm", y / 1000.0));
        }

        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn full_header_title() {
        let metadata = pairs(&[
            ("P", "0.001"),
            ("LPS", "0.5"),
            ("Z Set Point", "0.2"),
            ("I", "0.0002"),
            ("Size X", "50000"),
            ("Offset X", "1000"),
            ("D", "0"),
            ("Size Y", "50500"),
            ("Offset Y", "-2500"),
        ]);
        let info = ExperimentInfo::from_metadata(&metadata);
        assert_eq!(info.size_x_nm, Some(50000.0));
        assert_eq!(
            info.format_for_title(),
            "Kp = 1.0e-3, Ki = 2.0e-4, Kd = 0.0e0, LPS = 0.50, Lx = 50 µm, Ly = 50 µm, \
             r(t) = 0.20 V, δx = 1.0 µm, δy = -2.5 µm"
        );
    }

    #[test]
    fn keys_are_case_insensitive_and_non_numeric_values_skipped() {
        let metadata = pairs(&[("lps", "1.25"), ("size x", "abc"), ("Operator", "ML")]);
        let info = ExperimentInfo::from_metadata(&metadata);
        assert_eq!(info.lines_per_second, Some(1.25));
        assert_eq!(info.size_x_nm, None);
        assert_eq!(info.format_for_title(), "LPS = 1.25");
    }

    #[test]
    fn empty_metadata() {
        let info = ExperimentInfo::from_metadata(&[]);
        assert!(info.is_empty());
        assert_eq!(info.format_for_title(), "");
    }
}

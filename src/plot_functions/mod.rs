// src/plot_functions/mod.rs

pub mod plot_image_log;
pub mod plot_log_columns;
pub mod plot_obd_distributions;
pub mod plot_period_overlay;
pub mod plot_settling_times;
pub mod plot_spectrogram;
pub mod plot_xy_path;

// src/plot_functions/mod.rs

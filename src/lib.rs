// src/lib.rs - Library interface for internal module access

pub mod constants;
pub mod data_analysis;
pub mod data_input;
pub mod error;
pub mod plot_framework;
pub mod plot_functions;
pub mod render_config;

pub use error::{AnalysisError, AnalysisResult};

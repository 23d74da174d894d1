// src/data_input/mod.rs

pub mod experiment_info;
pub mod image_log;
pub mod log_data;
pub mod log_parser;

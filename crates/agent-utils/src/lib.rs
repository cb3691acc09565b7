//! Shared utilities for the consensus engine
//!
//! This crate provides common functionality used across the workspace,
//! including logging setup and configuration file loading.

pub mod config;
pub mod logging;

pub use config::{ConfigFileError, load_json_file, path_from_env};
pub use logging::{init_tracing, init_tracing_json, init_tracing_with_filter};

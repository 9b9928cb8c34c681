//! # configs
//!
//! Layered settings for the question service and the tracing bootstrap.

pub mod settings;
pub mod telemetry;

pub use settings::{ConfigError, DatabaseSettings, LogFormat, LogSettings, Settings};
pub use telemetry::init_tracing;

//! pushmon-core — config snapshot and check definitions for pushmon.

pub mod config;
pub mod error;

pub use config::{CheckSpec, Config, LoggingConfig, CONFIG_LOCATIONS};
pub use error::{ConfigError, ConfigResult};

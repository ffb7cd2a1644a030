//! Application configuration

mod app_config;

pub use app_config::{AppConfig, LockoutConfig, LogFormat, LoggingConfig, SeedConfig, StorageConfig};

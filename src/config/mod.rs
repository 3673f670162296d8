//! Application configuration

mod app_config;

pub use app_config::{
    AdminConfig, AppConfig, GatekeeperConfig, GeneratorConfig, LogFormat, LoggingConfig,
    ServerConfig, StorageSettings,
};

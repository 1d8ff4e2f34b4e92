//! Configuration Module
//!
//! Configuration loading for the price service.

mod settings;

pub use settings::{
    ApiKey, ConfigError, DEFAULT_CRYPTOCOMPARE_BASE_URL, ScheduleSettings, ServerSettings,
    ServiceConfig, UpstreamSettings,
};

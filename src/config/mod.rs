//! Configuration module for dashql.
//!
//! Handles the settings file and environment variables.

mod settings;

pub use settings::{
    expand_env_vars, DashboardSettings, LoggingSettings, PeriodSettings, Settings, SettingsError,
};

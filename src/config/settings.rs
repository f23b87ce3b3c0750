//! TOML-based settings for dashql.
//!
//! Supports a settings file (dashql.toml) with environment variable expansion
//! in path values.
//!
//! Example configuration:
//! ```toml
//! [dashboards]
//! dir = "${DASHQL_HOME}/dashboards"
//! default = "standard"
//!
//! [period]
//! reference_date = "2025-12-15"
//!
//! [logging]
//! filter = "dashql=debug"
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Dashboard not found: {0}")]
    DashboardNotFound(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Where dashboard files live.
    pub dashboards: DashboardSettings,

    /// Period resolution.
    pub period: PeriodSettings,

    /// Log output.
    pub logging: LoggingSettings,
}

/// Dashboard lookup settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Directory searched for `<name>.toml` and `<name>.json` (supports
    /// `${ENV_VAR}` expansion).
    pub dir: String,

    /// Dashboard used when none is named.
    pub default: Option<String>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            dir: "dashboards".to_string(),
            default: None,
        }
    }
}

/// Period settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PeriodSettings {
    /// Pin "today" for relative presets. The local date when unset.
    pub reference_date: Option<NaiveDate>,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "dashql=info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `DASHQL_CONFIG`
    /// 2. `./dashql.toml`
    /// 3. `~/.config/dashql/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("DASHQL_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("dashql.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("dashql").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// The reference date for relative presets.
    pub fn today(&self) -> NaiveDate {
        self.period
            .reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// The dashboard directory with environment variables expanded.
    pub fn dashboard_dir(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.dashboards.dir).map(PathBuf::from)
    }

    /// Find a dashboard file.
    ///
    /// `name` is used as-is when it names an existing file; otherwise
    /// `<dir>/<name>.toml` and `<dir>/<name>.json` are tried.
    pub fn find_dashboard(&self, name: &str) -> Result<PathBuf, SettingsError> {
        let direct = PathBuf::from(name);
        if direct.is_file() {
            return Ok(direct);
        }

        let dir = self.dashboard_dir()?;
        ["toml", "json"]
            .iter()
            .map(|ext| dir.join(format!("{}.{}", name, ext)))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| SettingsError::DashboardNotFound(name.to_string()))
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let braced = chars.next_if_eq(&'{').is_some();
        let mut var_name = String::new();
        if braced {
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
        }

        if var_name.is_empty() && !braced {
            // lone `$`
            result.push('$');
            continue;
        }
        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}

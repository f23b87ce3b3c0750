//! Dashboard definitions, read from TOML or JSON files.
//!
//! Example dashboard:
//! ```toml
//! title = "Page views"
//! date_filter = "created_at"
//! default_period = "current-month"
//!
//! [[filters]]
//! name = "website_id"
//! kind = "text"
//! required = true
//! default = "35abb2b7-3f97-42ce-931b-cf547d40d967"
//!
//! [[filters]]
//! name = "url_sti"
//! kind = "path"
//! operator = "starts-with"
//!
//! [[charts]]
//! title = "Views per day"
//! type = "line"
//! sql = """
//! SELECT DATE(created_at) AS day, COUNT(*) AS views
//! FROM events
//! WHERE website_id = '{{website_id}}'
//! AND url_path [[ {{url_sti}} --]] = '/'
//! [[AND {{created_at}} ]]
//! GROUP BY day
//! """
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::filter::{FilterDef, FilterKind};
use crate::period::{PeriodPresets, PresetDef, CUSTOM_TAG};

/// Name of the filter fed by the period picker when none is configured.
pub const DEFAULT_DATE_FILTER: &str = "created_at";

/// Error type for dashboard files.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read dashboard file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse dashboard TOML: {0}")]
    Toml(String),

    #[error("Failed to parse dashboard JSON: {0}")]
    Json(String),

    #[error("Unsupported dashboard file format: {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("Invalid dashboard: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err.to_string())
    }
}

/// One dashboard: its filters, period presets and charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub filters: Vec<FilterDef>,

    /// Period presets offered by the picker. The standard presets when absent.
    #[serde(default)]
    pub periods: Option<Vec<PresetDef>>,

    /// The date-range filter the period selection is written to.
    #[serde(default = "default_date_filter")]
    pub date_filter: String,

    /// Initially selected preset. The first preset when absent.
    #[serde(default)]
    pub default_period: Option<String>,

    /// Shown in place of every chart while a required filter is unset.
    #[serde(default)]
    pub required_message: Option<String>,

    #[serde(default)]
    pub charts: Vec<ChartConfig>,
}

fn default_date_filter() -> String {
    DEFAULT_DATE_FILTER.to_string()
}

/// One chart. Layout keys such as `width` are accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    pub title: String,

    #[serde(rename = "type")]
    pub chart_type: String,

    /// Query template. Text-only charts have none.
    #[serde(default)]
    pub sql: Option<String>,
}

impl ChartConfig {
    pub fn new(title: impl Into<String>, chart_type: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            chart_type: chart_type.into(),
            sql: None,
        }
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }
}

impl DashboardConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            filters: Vec::new(),
            periods: None,
            date_filter: default_date_filter(),
            default_period: None,
            required_message: None,
            charts: Vec::new(),
        }
    }

    /// Load a dashboard, choosing the format by file extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content)?,
            Some("json") => Self::from_json_str(&content)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        tracing::debug!(path = %path.display(), charts = config.charts.len(), "dashboard loaded");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the parts that cross-reference each other.
    ///
    /// Filter and preset definitions themselves are validated when a
    /// session builds its store and presets from them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(def) = self.filters.iter().find(|d| d.name == self.date_filter) {
            if !matches!(def.kind, FilterKind::DateRange { .. }) {
                return Err(ConfigError::Invalid(format!(
                    "date filter '{}' is declared as a {} filter",
                    self.date_filter,
                    def.kind.name()
                )));
            }
        }

        if let Some(tag) = &self.default_period {
            let known = tag == CUSTOM_TAG
                || match &self.periods {
                    Some(periods) => periods.iter().any(|p| &p.tag == tag),
                    None => PeriodPresets::standard().get(tag).is_some(),
                };
            if !known {
                return Err(ConfigError::Invalid(format!("default period '{}' is not a configured preset", tag)));
            }
        }

        Ok(())
    }

    /// The filters of a session: the declared ones, plus the date filter
    /// when it is not declared. An undeclared date filter constrains the
    /// column of the same name.
    pub fn filter_defs(&self) -> Vec<FilterDef> {
        let mut defs = self.filters.clone();
        if !defs.iter().any(|d| d.name == self.date_filter) {
            defs.push(FilterDef::new(
                self.date_filter.clone(),
                FilterKind::DateRange {
                    column: Some(self.date_filter.clone()),
                },
            ));
        }
        defs
    }

    pub fn chart(&self, index: usize) -> Option<&ChartConfig> {
        self.charts.get(index)
    }
}

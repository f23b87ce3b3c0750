//! Filter definitions and the per-session store of committed values.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::binding::FilterBinding;
use super::value::{check_column, check_name, check_text, DateRange, FilterValue, PathCondition, PathOperator, SqlFragment};
use crate::period::parse_date_text;

/// Errors raised by the filter store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Invalid value for filter '{name}': {reason}")]
    InvalidFilterValue { name: String, reason: String },

    #[error("Missing required filter: {0}")]
    MissingRequiredFilter(String),

    #[error("Invalid definition for filter '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },
}

pub type FilterResult<T> = Result<T, FilterError>;

/// One selectable option of a select or path filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub label: String,
    pub value: String,
}

/// The declared kind of a filter, which decides the values it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FilterKind {
    /// Free text, or a number.
    Text,
    /// Integer or finite decimal.
    Number,
    /// One of a fixed list of values; any safe text when the list is empty.
    Select {
        #[serde(default)]
        options: Vec<FilterOption>,
    },
    /// A URL path compared with `operator`.
    Path {
        #[serde(default)]
        operator: PathOperator,
        #[serde(default)]
        options: Vec<FilterOption>,
    },
    /// A date range. With a `column`, the range is bound as a condition on
    /// that column instead of as a bare range.
    DateRange {
        #[serde(default)]
        column: Option<String>,
    },
}

impl FilterKind {
    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::Text => "text",
            FilterKind::Number => "number",
            FilterKind::Select { .. } => "select",
            FilterKind::Path { .. } => "path",
            FilterKind::DateRange { .. } => "date-range",
        }
    }

    /// Check a value against this kind, returning its normalised form.
    fn accept(&self, value: FilterValue) -> Result<FilterValue, String> {
        match (self, value) {
            (_, FilterValue::Fragment(_)) => {
                Err("SQL fragments cannot be set as filter values".to_string())
            }
            (FilterKind::Text, FilterValue::Text(s)) => {
                check_text(&s).map_err(|e| e.to_string())?;
                Ok(FilterValue::Text(s))
            }
            (FilterKind::Text | FilterKind::Number, value @ FilterValue::Integer(_)) => Ok(value),
            (FilterKind::Text | FilterKind::Number, value @ FilterValue::Decimal(_)) => {
                value.validate().map_err(|e| e.to_string())?;
                Ok(value)
            }
            (FilterKind::Select { options }, FilterValue::Text(s)) => {
                check_text(&s).map_err(|e| e.to_string())?;
                check_option(options, &s)?;
                Ok(FilterValue::Text(s))
            }
            (FilterKind::Path { operator, options }, FilterValue::Text(path)) => {
                let condition = PathCondition::new(*operator, path);
                condition.validate().map_err(|e| e.to_string())?;
                check_option(options, &condition.path)?;
                Ok(FilterValue::Path(condition))
            }
            (FilterKind::Path { options, .. }, FilterValue::Path(condition)) => {
                condition.validate().map_err(|e| e.to_string())?;
                check_option(options, &condition.path)?;
                Ok(FilterValue::Path(condition))
            }
            (FilterKind::DateRange { .. }, FilterValue::DateRange(range)) => Ok(FilterValue::DateRange(range)),
            (FilterKind::DateRange { .. }, FilterValue::Date(d)) => {
                Ok(FilterValue::DateRange(DateRange::new(d, d)))
            }
            (kind, value) => Err(format!(
                "a {} filter does not accept a {} value",
                kind.name(),
                value.kind_name()
            )),
        }
    }

    /// Parse raw text (configuration defaults, CLI arguments) into a value.
    pub fn parse_value(&self, raw: &str) -> Result<FilterValue, String> {
        let raw = raw.trim();
        match self {
            FilterKind::Text | FilterKind::Select { .. } | FilterKind::Path { .. } => {
                Ok(FilterValue::Text(raw.to_string()))
            }
            FilterKind::Number => parse_number(raw),
            FilterKind::DateRange { .. } => parse_range(raw).map(FilterValue::DateRange),
        }
    }
}

fn check_option(options: &[FilterOption], value: &str) -> Result<(), String> {
    if options.is_empty() || options.iter().any(|o| o.value == value) {
        Ok(())
    } else {
        Err(format!("{:?} is not one of the configured options", value))
    }
}

fn parse_number(raw: &str) -> Result<FilterValue, String> {
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(FilterValue::Integer(n));
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(FilterValue::Decimal(f)),
        _ => Err(format!("{:?} is not a number", raw)),
    }
}

/// Parse `start..end`, where each side is `YYYY-MM-DD`, `dd.MM.yyyy` or empty.
fn parse_range(raw: &str) -> Result<DateRange, String> {
    let (start, end) = raw
        .split_once("..")
        .ok_or_else(|| format!("{:?} is not a date range (expected start..end)", raw))?;
    let bound = |s: &str| -> Result<Option<NaiveDate>, String> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| parse_date_text(s))
            .map(Some)
            .map_err(|_| format!("{:?} is not a valid date", s))
    };
    Ok(DateRange {
        start: bound(start)?,
        end: bound(end)?,
    })
}

/// Declaration of one dashboard filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDef {
    /// Name used by templates (`{{name}}`).
    pub name: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(flatten)]
    pub kind: FilterKind,

    /// Resolution is refused while a required filter is unset.
    #[serde(default)]
    pub required: bool,

    /// Raw default value, parsed with the kind's parser.
    #[serde(default)]
    pub default: Option<String>,
}

impl FilterDef {
    pub fn new(name: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            name: name.into(),
            label: None,
            kind,
            required: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, raw: impl Into<String>) -> Self {
        self.default = Some(raw.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Committed filter values for one dashboard session.
///
/// Every write is validated against the filter's declared kind; a rejected
/// write leaves the store untouched.
#[derive(Debug, Clone)]
pub struct FilterStore {
    defs: Vec<FilterDef>,
    values: BTreeMap<String, FilterValue>,
}

impl FilterStore {
    /// Create a store for the given definitions and apply their defaults.
    pub fn new(defs: Vec<FilterDef>) -> FilterResult<Self> {
        let mut seen = HashSet::new();
        for def in &defs {
            let invalid = |reason: String| FilterError::InvalidDefinition {
                name: def.name.clone(),
                reason,
            };
            check_name(&def.name).map_err(|e| invalid(e.to_string()))?;
            if !seen.insert(def.name.as_str()) {
                return Err(invalid("declared more than once".to_string()));
            }
            if let FilterKind::DateRange { column: Some(column) } = &def.kind {
                check_column(column).map_err(|e| invalid(e.to_string()))?;
            }
        }

        let mut store = Self {
            defs,
            values: BTreeMap::new(),
        };
        let defaults: Vec<(String, String)> = store
            .defs
            .iter()
            .filter_map(|d| d.default.clone().map(|v| (d.name.clone(), v)))
            .collect();
        for (name, raw) in defaults {
            store.set_text(&name, &raw).map_err(|e| FilterError::InvalidDefinition {
                name: name.clone(),
                reason: format!("bad default: {}", e),
            })?;
        }
        Ok(store)
    }

    pub fn definitions(&self) -> &[FilterDef] {
        &self.defs
    }

    pub fn definition(&self, name: &str) -> Option<&FilterDef> {
        self.defs.iter().find(|d| d.name == name)
    }

    /// Validate and commit a value. Empty values clear the filter.
    pub fn set(&mut self, name: &str, value: FilterValue) -> FilterResult<()> {
        let def = self
            .definition(name)
            .ok_or_else(|| FilterError::UnknownFilter(name.to_string()))?;
        if value.is_empty() {
            self.values.remove(name);
            tracing::debug!(filter = name, "filter cleared");
            return Ok(());
        }
        let value = def
            .kind
            .accept(value)
            .map_err(|reason| FilterError::InvalidFilterValue {
                name: name.to_string(),
                reason,
            })?;
        if let FilterValue::DateRange(range) = &value {
            if range.is_inverted() {
                tracing::warn!(filter = name, range = %range, "date range starts after it ends");
            }
        }
        tracing::debug!(filter = name, kind = value.kind_name(), "filter set");
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Parse raw text with the filter kind's parser, then [`set`](Self::set) it.
    pub fn set_text(&mut self, name: &str, raw: &str) -> FilterResult<()> {
        let def = self
            .definition(name)
            .ok_or_else(|| FilterError::UnknownFilter(name.to_string()))?;
        let value = def
            .kind
            .parse_value(raw)
            .map_err(|reason| FilterError::InvalidFilterValue {
                name: name.to_string(),
                reason,
            })?;
        self.set(name, value)
    }

    pub fn clear(&mut self, name: &str) -> FilterResult<Option<FilterValue>> {
        if self.definition(name).is_none() {
            return Err(FilterError::UnknownFilter(name.to_string()));
        }
        Ok(self.values.remove(name))
    }

    /// The committed value, if any.
    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.values.get(name)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Required filters that currently have no value, in declaration order.
    pub fn missing_required(&self) -> impl Iterator<Item = &FilterDef> {
        self.defs
            .iter()
            .filter(|d| d.required && !self.values.contains_key(&d.name))
    }

    /// Fail if any required filter is unset, whatever template is about to run.
    pub fn check_required(&self) -> FilterResult<()> {
        match self.missing_required().next() {
            Some(def) => Err(FilterError::MissingRequiredFilter(def.name.clone())),
            None => Ok(()),
        }
    }

    /// Export the committed values for template resolution.
    ///
    /// Date-range filters declared with a column are exported as a
    /// condition on that column.
    pub fn binding(&self) -> FilterResult<FilterBinding> {
        let mut binding = FilterBinding::new();
        for (name, value) in &self.values {
            let column = match self.definition(name).map(|d| &d.kind) {
                Some(FilterKind::DateRange { column: Some(column) }) => Some(column),
                _ => None,
            };
            match (column, value) {
                (Some(column), FilterValue::DateRange(range)) => {
                    let fragment = SqlFragment::date_range_condition(column, range).map_err(|e| {
                        FilterError::InvalidDefinition {
                            name: name.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                    if let Some(fragment) = fragment {
                        binding.insert(name.clone(), fragment);
                    }
                }
                _ => binding.insert(name.clone(), value.clone()),
            }
        }
        Ok(binding)
    }
}

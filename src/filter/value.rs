//! Typed filter values and their SQL text form.
//!
//! Every value kind has exactly one stringification, so resolving the same
//! template against the same binding always produces the same bytes.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Characters that may never reach a template through a text value.
static UNSAFE_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"`\\;\x00-\x1f\x7f]|--|/\*|\*/"#).unwrap());

/// A filter name, matching the placeholder grammar (`{{name}}`).
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Identifier accepted as a column reference, optionally dotted.
static COLUMN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap());

/// Reasons a value cannot be substituted into SQL text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("text {0:?} contains characters that are not allowed in a query")]
    UnsafeText(String),

    #[error("number {0} is not finite")]
    NonFinite(f64),

    #[error("path {0:?} must start with '/'")]
    InvalidPath(String),

    #[error("{0:?} is not a valid column identifier")]
    InvalidColumn(String),

    #[error("{0:?} is not a valid filter name")]
    InvalidName(String),
}

/// Check that free text can be placed between quotes in a query.
pub fn check_text(text: &str) -> Result<(), ValueError> {
    if UNSAFE_TEXT.is_match(text) {
        return Err(ValueError::UnsafeText(text.to_string()));
    }
    Ok(())
}

/// Check that a filter name can be referenced from a template placeholder.
pub fn check_name(name: &str) -> Result<(), ValueError> {
    if !NAME_PATTERN.is_match(name) {
        return Err(ValueError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Check that a string is a plain (optionally dotted) column identifier.
pub fn check_column(column: &str) -> Result<(), ValueError> {
    if !COLUMN_PATTERN.is_match(column) {
        return Err(ValueError::InvalidColumn(column.to_string()));
    }
    Ok(())
}

/// An inclusive calendar date range with optional bounds.
///
/// Bounds are kept as entered: `start > end` is not reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// A range with neither bound carries no filter.
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Both bounds set and the start after the end.
    pub fn is_inverted(&self) -> bool {
        matches!((self.start, self.end), (Some(s), Some(e)) if s > e)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        write!(f, "{}..{}", bound(self.start), bound(self.end))
    }
}

/// How a URL path filter compares against the stored path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathOperator {
    #[default]
    Equals,
    StartsWith,
}

impl PathOperator {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "equals" | "eq" | "=" => Some(PathOperator::Equals),
            "starts-with" | "starts_with" | "prefix" => Some(PathOperator::StartsWith),
            _ => None,
        }
    }
}

impl fmt::Display for PathOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathOperator::Equals => write!(f, "equals"),
            PathOperator::StartsWith => write!(f, "starts-with"),
        }
    }
}

/// A URL path plus comparison operator.
///
/// The rendered text carries its own operator (`= '/p'` or `LIKE '/p%'`),
/// so a template places the placeholder right after the column and keeps
/// the operator inside the fallback: `url_path [[ {{url_sti}} --]] = '/'`.
/// Writing `url_path = [[ {{url_sti}} --]] '/'` would render `= = '/p'`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathCondition {
    pub operator: PathOperator,
    pub path: String,
}

impl PathCondition {
    pub fn new(operator: PathOperator, path: impl Into<String>) -> Self {
        Self {
            operator,
            path: path.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValueError> {
        if !self.path.starts_with('/') {
            return Err(ValueError::InvalidPath(self.path.clone()));
        }
        check_text(&self.path)
    }

    /// Comparison text to follow a column reference.
    ///
    /// `starts-with` renders as a LIKE prefix match. Backslash, `%` and `_`
    /// in the path are escaped for LIKE, and the escape backslash is itself
    /// doubled inside the string literal (`'/a\\_b%'` matches `/a_b...`).
    pub fn to_sql(&self) -> Result<String, ValueError> {
        self.validate()?;
        Ok(match self.operator {
            PathOperator::Equals => format!("= {}", quote_string(&self.path)),
            PathOperator::StartsWith => {
                let escaped = self
                    .path
                    .replace('\\', r"\\\\")
                    .replace('%', r"\\%")
                    .replace('_', r"\\_");
                format!("LIKE {}", quote_string(&format!("{}%", escaped)))
            }
        })
    }
}

/// SQL text produced by this crate rather than by a user.
///
/// Fragments are inserted verbatim, so they can only be built from typed
/// inputs or explicitly marked as trusted by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SqlFragment(String);

impl SqlFragment {
    /// Wrap SQL text the caller vouches for.
    pub fn trusted(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    /// A `column` condition covering whole days of `range`.
    ///
    /// The end bound is exclusive at the start of the following day so the
    /// full last day is included for timestamp columns. Returns `None` for an
    /// empty range.
    pub fn date_range_condition(column: &str, range: &DateRange) -> Result<Option<Self>, ValueError> {
        check_column(column)?;
        let lower = range
            .start
            .map(|start| format!("{} >= TIMESTAMP('{}')", column, start.format("%Y-%m-%d")));
        let upper = range.end.map(|end| match end.succ_opt() {
            Some(next) => format!("{} < TIMESTAMP('{}')", column, next.format("%Y-%m-%d")),
            None => format!("{} <= TIMESTAMP('{} 23:59:59.999999')", column, end.format("%Y-%m-%d")),
        });
        Ok(match (lower, upper) {
            (Some(lower), Some(upper)) => Some(Self(format!("{} AND {}", lower, upper))),
            (Some(one), None) | (None, Some(one)) => Some(Self(one)),
            (None, None) => None,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SqlFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A committed filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Date(NaiveDate),
    DateRange(DateRange),
    Path(PathCondition),
    Fragment(SqlFragment),
}

impl FilterValue {
    pub fn text(s: impl Into<String>) -> Self {
        FilterValue::Text(s.into())
    }

    /// Values that carry nothing: empty text and a range with no bounds.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Text(s) => s.is_empty(),
            FilterValue::DateRange(range) => range.is_empty(),
            FilterValue::Fragment(fragment) => fragment.as_str().is_empty(),
            _ => false,
        }
    }

    /// Short name of the value kind, for messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FilterValue::Text(_) => "text",
            FilterValue::Integer(_) => "integer",
            FilterValue::Decimal(_) => "decimal",
            FilterValue::Date(_) => "date",
            FilterValue::DateRange(_) => "date range",
            FilterValue::Path(_) => "path",
            FilterValue::Fragment(_) => "fragment",
        }
    }

    /// Check the value without rendering it.
    pub fn validate(&self) -> Result<(), ValueError> {
        match self {
            FilterValue::Text(s) => check_text(s),
            FilterValue::Decimal(f) if !f.is_finite() => Err(ValueError::NonFinite(*f)),
            FilterValue::Path(condition) => condition.validate(),
            _ => Ok(()),
        }
    }

    /// The text substituted for a placeholder bound to this value.
    pub fn to_sql(&self) -> Result<String, ValueError> {
        self.validate()?;
        Ok(match self {
            FilterValue::Text(s) => s.clone(),
            FilterValue::Integer(n) => n.to_string(),
            FilterValue::Decimal(f) => {
                let mut buffer = ryu::Buffer::new();
                buffer.format_finite(*f).to_string()
            }
            FilterValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FilterValue::DateRange(range) => date_range_sql(range),
            FilterValue::Path(condition) => condition.to_sql()?,
            FilterValue::Fragment(fragment) => fragment.as_str().to_string(),
        })
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Integer(n)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(d: NaiveDate) -> Self {
        FilterValue::Date(d)
    }
}

impl From<DateRange> for FilterValue {
    fn from(range: DateRange) -> Self {
        FilterValue::DateRange(range)
    }
}

impl From<PathCondition> for FilterValue {
    fn from(condition: PathCondition) -> Self {
        FilterValue::Path(condition)
    }
}

impl From<SqlFragment> for FilterValue {
    fn from(fragment: SqlFragment) -> Self {
        FilterValue::Fragment(fragment)
    }
}

fn date_range_sql(range: &DateRange) -> String {
    let date = |d: NaiveDate| quote_string(&d.format("%Y-%m-%d").to_string());
    match (range.start, range.end) {
        (Some(s), Some(e)) => format!("BETWEEN {} AND {}", date(s), date(e)),
        (Some(s), None) => format!(">= {}", date(s)),
        (None, Some(e)) => format!("<= {}", date(e)),
        (None, None) => String::new(),
    }
}

/// Quote a string with single quotes (standard SQL).
fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

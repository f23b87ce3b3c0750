//! Free-text date entry.
//!
//! A date box holds whatever the user typed; the committed date only moves
//! when the text is a complete, valid `dd.mm.yyyy` date.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// chrono format of the text entry.
pub const DATE_TEXT_FORMAT: &str = "%d.%m.%Y";

/// Length of a complete entry.
pub const DATE_TEXT_LEN: usize = 10;

static DATE_TEXT_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateTextError {
    #[error("Invalid date text {text:?}: expected a calendar date as dd.mm.yyyy")]
    InvalidDateText { text: String },
}

/// Parse a complete `dd.mm.yyyy` entry.
pub fn parse_date_text(text: &str) -> Result<NaiveDate, DateTextError> {
    let invalid = || DateTextError::InvalidDateText {
        text: text.to_string(),
    };
    if text.len() != DATE_TEXT_LEN || !DATE_TEXT_SHAPE.is_match(text) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(text, DATE_TEXT_FORMAT).map_err(|_| invalid())
}

pub fn format_date_text(date: NaiveDate) -> String {
    date.format(DATE_TEXT_FORMAT).to_string()
}

/// One date entry box: the typed text plus the last committed date.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DateInput {
    text: String,
    committed: Option<NaiveDate>,
}

impl DateInput {
    pub fn new(committed: Option<NaiveDate>) -> Self {
        Self {
            text: committed.map(format_date_text).unwrap_or_default(),
            committed,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn committed(&self) -> Option<NaiveDate> {
        self.committed
    }

    /// Record typed text. Returns the date when the edit commits one.
    ///
    /// Partial or invalid text only updates the displayed text.
    pub fn edit(&mut self, text: impl Into<String>) -> Option<NaiveDate> {
        self.text = text.into();
        match parse_date_text(&self.text) {
            Ok(date) => {
                self.committed = Some(date);
                Some(date)
            }
            Err(err) => {
                tracing::trace!(error = %err, "date entry not committed");
                None
            }
        }
    }

    /// Follow a date changed elsewhere (range picker, preset selection).
    pub fn sync(&mut self, date: Option<NaiveDate>) {
        self.committed = date;
        self.text = date.map(format_date_text).unwrap_or_default();
    }
}

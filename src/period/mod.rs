//! Period selection and date-range canonicalization.
//!
//! A dashboard period is either one of a closed set of named presets or an
//! explicit `custom` range. Presets map to a canonical `(start, end)` pair
//! ([`PeriodPresets::resolve_preset`]) and a pair can be mapped back to the
//! preset it equals ([`PeriodPresets::recognize_preset`]), which is what the
//! picker displays.
//!
//! State changes are explicit calls on [`PeriodSelection`]; nothing observes
//! the selection and recomputes behind the caller's back. The resulting range
//! is pushed into the date filter by the dashboard session.
//!
//! ```
//! use chrono::NaiveDate;
//! use dashql::period::{PeriodPresets, PeriodSelection, PeriodTag};
//!
//! let presets = PeriodPresets::standard();
//! let today = NaiveDate::from_ymd_opt(2025, 12, 15).unwrap();
//!
//! let selection = PeriodSelection::preset(&presets, "current-month", today).unwrap();
//! assert_eq!(selection.start(), NaiveDate::from_ymd_opt(2025, 12, 1));
//! assert_eq!(selection.end(), NaiveDate::from_ymd_opt(2025, 12, 31));
//! assert_eq!(selection.display_tag(&presets, today), PeriodTag::Preset("current-month".into()));
//! ```

mod input;
mod preset;
mod selection;

pub use input::{format_date_text, parse_date_text, DateInput, DateTextError, DATE_TEXT_FORMAT, DATE_TEXT_LEN};
pub use preset::{month_bounds, PeriodPresets, PeriodTag, PresetDef, PresetKind, CUSTOM_TAG};
pub use selection::PeriodSelection;

use chrono::NaiveDate;

/// Errors from preset configuration and resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeriodError {
    #[error("Unknown period preset: {0}")]
    UnknownPreset(String),

    #[error("Invalid period preset '{tag}': {reason}")]
    InvalidPreset { tag: String, reason: String },

    #[error("Reference date {0} is outside the supported calendar range")]
    OutOfRange(NaiveDate),
}

pub type PeriodResult<T> = Result<T, PeriodError>;

//! Named period presets and their canonical date ranges.

use std::collections::HashSet;
use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{PeriodError, PeriodResult};

/// The tag reserved for explicitly entered ranges.
pub const CUSTOM_TAG: &str = "custom";

/// How a preset computes its range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PresetKind {
    /// The reference date alone.
    Today,
    /// First to last day of the reference date's month.
    CurrentMonth,
    /// First to last day of the month before the reference date's month.
    PreviousMonth,
    /// A range pinned to fixed dates, for datasets that only cover a known
    /// calendar period.
    Fixed { start: NaiveDate, end: NaiveDate },
}

impl PresetKind {
    /// The canonical `(start, end)` for this preset on `today`.
    pub fn range(&self, today: NaiveDate) -> PeriodResult<(NaiveDate, NaiveDate)> {
        let out_of_range = || PeriodError::OutOfRange(today);
        match self {
            PresetKind::Today => Ok((today, today)),
            PresetKind::CurrentMonth => month_bounds(today).ok_or_else(out_of_range),
            PresetKind::PreviousMonth => today
                .with_day(1)
                .and_then(|first| first.pred_opt())
                .and_then(month_bounds)
                .ok_or_else(out_of_range),
            PresetKind::Fixed { start, end } => Ok((*start, *end)),
        }
    }

    /// Whether the range moves with the reference date.
    pub fn is_relative(&self) -> bool {
        !matches!(self, PresetKind::Fixed { .. })
    }
}

/// First and last calendar day of the month containing `anchor`.
pub fn month_bounds(anchor: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let first = anchor.with_day(1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((first, last))
}

/// A named preset offered by the period picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetDef {
    pub tag: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(flatten)]
    pub kind: PresetKind,
}

impl PresetDef {
    pub fn new(tag: impl Into<String>, kind: PresetKind) -> Self {
        Self {
            tag: tag.into(),
            label: None,
            kind,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// The selected period's tag: a preset or an explicit range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PeriodTag {
    Preset(String),
    Custom,
}

impl PeriodTag {
    pub fn parse(s: &str) -> Self {
        if s == CUSTOM_TAG {
            PeriodTag::Custom
        } else {
            PeriodTag::Preset(s.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PeriodTag::Preset(tag) => tag,
            PeriodTag::Custom => CUSTOM_TAG,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, PeriodTag::Custom)
    }
}

impl fmt::Display for PeriodTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of presets a dashboard offers. `custom` is always
/// available in addition to these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodPresets {
    presets: Vec<PresetDef>,
}

impl PeriodPresets {
    /// Validate and wrap preset definitions. Tags must be unique, non-empty
    /// and different from `custom`.
    pub fn new(presets: Vec<PresetDef>) -> PeriodResult<Self> {
        let mut seen = HashSet::new();
        for preset in &presets {
            let tag = preset.tag.as_str();
            if tag.is_empty() || tag == CUSTOM_TAG {
                return Err(PeriodError::InvalidPreset {
                    tag: tag.to_string(),
                    reason: format!("tag must be non-empty and not '{}'", CUSTOM_TAG),
                });
            }
            if !seen.insert(tag) {
                return Err(PeriodError::InvalidPreset {
                    tag: tag.to_string(),
                    reason: "declared more than once".to_string(),
                });
            }
        }
        Ok(Self { presets })
    }

    /// `today`, `current-month` and `previous-month`.
    pub fn standard() -> Self {
        Self {
            presets: vec![
                PresetDef::new("today", PresetKind::Today).with_label("Today"),
                PresetDef::new("current-month", PresetKind::CurrentMonth).with_label("This month"),
                PresetDef::new("previous-month", PresetKind::PreviousMonth).with_label("Last month"),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PresetDef> {
        self.presets.iter()
    }

    pub fn get(&self, tag: &str) -> Option<&PresetDef> {
        self.presets.iter().find(|p| p.tag == tag)
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Canonical range of the preset `tag` on `today`.
    pub fn resolve_preset(&self, tag: &str, today: NaiveDate) -> PeriodResult<(NaiveDate, NaiveDate)> {
        let preset = self
            .get(tag)
            .ok_or_else(|| PeriodError::UnknownPreset(tag.to_string()))?;
        preset.kind.range(today)
    }

    /// The first preset whose canonical range is exactly `(start, end)`,
    /// or `Custom` if none is.
    pub fn recognize_preset(&self, start: NaiveDate, end: NaiveDate, today: NaiveDate) -> PeriodTag {
        self.presets
            .iter()
            .find(|p| matches!(p.kind.range(today), Ok(range) if range == (start, end)))
            .map(|p| PeriodTag::Preset(p.tag.clone()))
            .unwrap_or(PeriodTag::Custom)
    }
}

impl Default for PeriodPresets {
    fn default() -> Self {
        Self::standard()
    }
}

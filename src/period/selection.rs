//! The selected period: a tag plus concrete dates kept in agreement.

use chrono::NaiveDate;

use super::preset::{PeriodPresets, PeriodTag, CUSTOM_TAG};
use super::PeriodResult;
use crate::filter::DateRange;

/// Period picker state.
///
/// The fields are private: every change goes through one of the update
/// methods below, each of which leaves the tag and dates consistent. While
/// the tag is a preset, the dates equal that preset's canonical range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSelection {
    tag: PeriodTag,
    range: DateRange,
}

impl PeriodSelection {
    /// An explicit, possibly open, range.
    pub fn custom(range: DateRange) -> Self {
        Self {
            tag: PeriodTag::Custom,
            range,
        }
    }

    /// A preset selection on `today`.
    pub fn preset(presets: &PeriodPresets, tag: &str, today: NaiveDate) -> PeriodResult<Self> {
        let mut selection = Self::custom(DateRange::default());
        selection.select_preset(presets, tag, today)?;
        Ok(selection)
    }

    /// The stored tag. A custom range that happens to match a preset is
    /// still `Custom` here; see [`display_tag`](Self::display_tag).
    pub fn tag(&self) -> &PeriodTag {
        &self.tag
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.range.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.range.end
    }

    /// Select a preset, replacing any previous range.
    ///
    /// Selecting `custom` keeps the current dates and only switches the tag.
    /// An unknown tag leaves the selection unchanged.
    pub fn select_preset(&mut self, presets: &PeriodPresets, tag: &str, today: NaiveDate) -> PeriodResult<()> {
        if tag == CUSTOM_TAG {
            self.tag = PeriodTag::Custom;
            return Ok(());
        }
        let (start, end) = presets.resolve_preset(tag, today)?;
        self.tag = PeriodTag::Preset(tag.to_string());
        self.range = DateRange::new(start, end);
        tracing::debug!(preset = tag, %start, %end, "period preset selected");
        Ok(())
    }

    /// Store an explicitly entered range as `custom`, exactly as given.
    pub fn select_custom(&mut self, range: DateRange) {
        if range.is_inverted() {
            tracing::warn!(range = %range, "custom period starts after it ends");
        }
        self.tag = PeriodTag::Custom;
        self.range = range;
    }

    /// Change the start date; the selection becomes `custom`.
    pub fn set_start(&mut self, start: Option<NaiveDate>) {
        self.select_custom(DateRange {
            start,
            end: self.range.end,
        });
    }

    /// Change the end date; the selection becomes `custom`.
    pub fn set_end(&mut self, end: Option<NaiveDate>) {
        self.select_custom(DateRange {
            start: self.range.start,
            end,
        });
    }

    /// Recompute a preset's dates for a new reference date.
    ///
    /// Returns true when the dates changed. Custom selections are untouched.
    pub fn refresh(&mut self, presets: &PeriodPresets, today: NaiveDate) -> PeriodResult<bool> {
        let PeriodTag::Preset(tag) = &self.tag else {
            return Ok(false);
        };
        let (start, end) = presets.resolve_preset(tag, today)?;
        let range = DateRange::new(start, end);
        let changed = range != self.range;
        self.range = range;
        Ok(changed)
    }

    /// The tag the picker should show as selected.
    ///
    /// A custom range equal to a preset's canonical range shows as that
    /// preset. The stored tag is not changed.
    pub fn display_tag(&self, presets: &PeriodPresets, today: NaiveDate) -> PeriodTag {
        match (&self.tag, self.range.start, self.range.end) {
            (PeriodTag::Custom, Some(start), Some(end)) => presets.recognize_preset(start, end, today),
            (tag, _, _) => tag.clone(),
        }
    }
}

impl Default for PeriodSelection {
    fn default() -> Self {
        Self::custom(DateRange::default())
    }
}

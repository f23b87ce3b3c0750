//! A dashboard session: one user's filter values and period selection.

use chrono::NaiveDate;
use uuid::Uuid;

use super::config::DashboardConfig;
use super::{DashboardError, DashboardResult};
use crate::filter::{DateRange, FilterBinding, FilterStore, FilterValue};
use crate::period::{DateInput, PeriodPresets, PeriodSelection, PeriodTag, CUSTOM_TAG};
use crate::template::{resolve, TemplateCache};

/// One chart's resolved query.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartQuery {
    /// Position of the chart in the dashboard.
    pub index: usize,
    pub title: String,
    pub result: DashboardResult<String>,
}

/// Filter and period state of one open dashboard.
///
/// All state changes are synchronous event methods. Period events write the
/// selected range through to the date filter before returning, so the
/// filter store never lags behind the picker.
#[derive(Debug, Clone)]
pub struct DashboardSession {
    id: Uuid,
    config: DashboardConfig,
    presets: PeriodPresets,
    store: FilterStore,
    period: PeriodSelection,
    start_input: DateInput,
    end_input: DateInput,
    today: NaiveDate,
}

impl DashboardSession {
    /// Open a session with the dashboard's default filter values and period.
    pub fn new(config: DashboardConfig, today: NaiveDate) -> DashboardResult<Self> {
        config.validate()?;
        let presets = match &config.periods {
            Some(periods) => PeriodPresets::new(periods.clone())?,
            None => PeriodPresets::standard(),
        };
        let store = FilterStore::new(config.filter_defs())?;

        let default_tag = config
            .default_period
            .clone()
            .or_else(|| presets.iter().next().map(|p| p.tag.clone()));
        let period = match default_tag.as_deref() {
            Some(tag) if tag != CUSTOM_TAG => PeriodSelection::preset(&presets, tag, today)?,
            _ => PeriodSelection::default(),
        };

        let mut session = Self {
            id: Uuid::new_v4(),
            config,
            presets,
            store,
            start_input: DateInput::default(),
            end_input: DateInput::default(),
            period,
            today,
        };
        session.sync_period()?;
        tracing::info!(session = %session.id, dashboard = %session.config.title, %today, "dashboard session opened");
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn presets(&self) -> &PeriodPresets {
        &self.presets
    }

    pub fn filters(&self) -> &FilterStore {
        &self.store
    }

    pub fn period(&self) -> &PeriodSelection {
        &self.period
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// The start date entry box.
    pub fn start_input(&self) -> &DateInput {
        &self.start_input
    }

    /// The end date entry box.
    pub fn end_input(&self) -> &DateInput {
        &self.end_input
    }

    /// The tag the period picker shows as selected.
    pub fn display_tag(&self) -> PeriodTag {
        self.period.display_tag(&self.presets, self.today)
    }

    // =========================================================================
    // Period events
    // =========================================================================

    pub fn select_preset(&mut self, tag: &str) -> DashboardResult<()> {
        self.period.select_preset(&self.presets, tag, self.today)?;
        tracing::info!(session = %self.id, preset = tag, "period preset selected");
        self.sync_period()
    }

    pub fn select_custom(&mut self, range: DateRange) -> DashboardResult<()> {
        self.period.select_custom(range);
        tracing::info!(session = %self.id, range = %range, "custom period selected");
        self.sync_period()
    }

    pub fn set_start(&mut self, start: Option<NaiveDate>) -> DashboardResult<()> {
        self.period.set_start(start);
        self.sync_period()
    }

    pub fn set_end(&mut self, end: Option<NaiveDate>) -> DashboardResult<()> {
        self.period.set_end(end);
        self.sync_period()
    }

    /// Typed text in the start box. Returns true when it committed a date;
    /// incomplete or invalid text changes nothing but the box.
    pub fn edit_start_text(&mut self, text: &str) -> DashboardResult<bool> {
        match self.start_input.edit(text) {
            Some(date) => self.set_start(Some(date)).map(|()| true),
            None => Ok(false),
        }
    }

    /// Typed text in the end box. See [`edit_start_text`](Self::edit_start_text).
    pub fn edit_end_text(&mut self, text: &str) -> DashboardResult<bool> {
        match self.end_input.edit(text) {
            Some(date) => self.set_end(Some(date)).map(|()| true),
            None => Ok(false),
        }
    }

    /// Move the reference date. Relative presets are recomputed; returns
    /// true when the selected range changed.
    pub fn set_today(&mut self, today: NaiveDate) -> DashboardResult<bool> {
        self.today = today;
        let changed = self.period.refresh(&self.presets, today)?;
        if changed {
            self.sync_period()?;
        }
        Ok(changed)
    }

    // =========================================================================
    // Filter events
    // =========================================================================

    pub fn set_filter(&mut self, name: &str, value: impl Into<FilterValue>) -> DashboardResult<()> {
        self.store.set(name, value.into())?;
        self.after_filter_write(name);
        tracing::info!(session = %self.id, filter = name, "filter set");
        Ok(())
    }

    /// Set a filter from raw text, parsed according to the filter's kind.
    pub fn set_filter_text(&mut self, name: &str, raw: &str) -> DashboardResult<()> {
        self.store.set_text(name, raw)?;
        self.after_filter_write(name);
        tracing::info!(session = %self.id, filter = name, "filter set");
        Ok(())
    }

    pub fn clear_filter(&mut self, name: &str) -> DashboardResult<()> {
        self.store.clear(name)?;
        self.after_filter_write(name);
        tracing::info!(session = %self.id, filter = name, "filter cleared");
        Ok(())
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// The binding charts are resolved against.
    ///
    /// Fails while any required filter is unset, whether or not a given
    /// template refers to it.
    pub fn binding(&self) -> DashboardResult<FilterBinding> {
        if let Some(def) = self.store.missing_required().next() {
            let message = self
                .config
                .required_message
                .clone()
                .unwrap_or_else(|| format!("Select a value for '{}' to show this dashboard.", def.name));
            return Err(DashboardError::FilterRequired {
                name: def.name.clone(),
                message,
            });
        }
        Ok(self.store.binding()?)
    }

    /// Resolve one chart's query.
    pub fn resolve_chart(&self, index: usize, cache: &TemplateCache) -> DashboardResult<String> {
        let chart = self.config.chart(index).ok_or(DashboardError::ChartNotFound(index))?;
        let sql = chart.sql.as_deref().ok_or(DashboardError::NoQuery(index))?;
        let binding = self.binding()?;
        self.resolve_sql(index, sql, &binding, cache)
    }

    /// Resolve every chart that has a query.
    ///
    /// A failing chart does not affect the others. While a required filter
    /// is unset every query chart carries the same error.
    pub fn resolve_charts(&self, cache: &TemplateCache) -> Vec<ChartQuery> {
        let binding = self.binding();
        self.config
            .charts
            .iter()
            .enumerate()
            .filter_map(|(index, chart)| {
                let sql = chart.sql.as_deref()?;
                let result = match &binding {
                    Ok(binding) => self.resolve_sql(index, sql, binding, cache),
                    Err(err) => Err(err.clone()),
                };
                Some(ChartQuery {
                    index,
                    title: chart.title.clone(),
                    result,
                })
            })
            .collect()
    }

    fn resolve_sql(
        &self,
        index: usize,
        sql: &str,
        binding: &FilterBinding,
        cache: &TemplateCache,
    ) -> DashboardResult<String> {
        let template = cache.get_or_parse(sql)?;
        match resolve(&template, binding) {
            Ok(query) => {
                tracing::debug!(session = %self.id, chart = index, bytes = query.len(), "chart resolved");
                Ok(query)
            }
            Err(err) => {
                tracing::debug!(session = %self.id, chart = index, error = %err, "chart not resolved");
                Err(err.into())
            }
        }
    }

    // =========================================================================
    // Period and date filter agreement
    // =========================================================================

    /// Write the selected range to the date filter and the entry boxes.
    fn sync_period(&mut self) -> DashboardResult<()> {
        let range = self.period.range();
        self.start_input.sync(range.start);
        self.end_input.sync(range.end);
        let date_filter = self.config.date_filter.clone();
        self.store.set(&date_filter, FilterValue::DateRange(range))?;
        Ok(())
    }

    /// A direct write to the date filter becomes a custom period.
    fn after_filter_write(&mut self, name: &str) {
        if name != self.config.date_filter {
            return;
        }
        let range = match self.store.get(name) {
            Some(FilterValue::DateRange(range)) => *range,
            _ => DateRange::default(),
        };
        self.period.select_custom(range);
        self.start_input.sync(range.start);
        self.end_input.sync(range.end);
    }
}

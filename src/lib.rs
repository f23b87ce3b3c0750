//! # dashql
//!
//! Filter-driven SQL query templates for analytics dashboards.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Dashboard (TOML / JSON)                     │
//! │  (filters, period presets, charts with SQL templates)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [dashboard::DashboardSession]
//! ┌─────────────────────────────────────────────────────────┐
//! │       PeriodSelection ──► FilterStore ──► FilterBinding  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [template::parse + resolve]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Template (literals, {{placeholders}}, [[blocks]])      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [dashboard::dispatch]
//! ┌─────────────────────────────────────────────────────────┐
//! │                    SQL Query                             │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod dashboard;
pub mod filter;
pub mod period;
pub mod template;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::dashboard::{
        dispatch, ChartConfig, ChartQuery, DashboardConfig, DashboardError, DashboardSession, QueryBackend,
    };
    pub use crate::filter::{
        DateRange, FilterBinding, FilterDef, FilterKind, FilterStore, FilterValue, PathCondition, PathOperator,
        SqlFragment,
    };
    pub use crate::period::{PeriodPresets, PeriodSelection, PeriodTag, PresetDef, PresetKind};
    pub use crate::template::{parse, resolve, ParseError, ResolveError, Template, TemplateCache};
}

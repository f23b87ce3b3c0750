//! Dashboards: configuration, per-user sessions and query dispatch.
//!
//! ```text
//! selection events ──► DashboardSession ──► FilterStore ──► FilterBinding
//!                                                              │
//! chart sql ──► TemplateCache::get_or_parse ──► resolve ◄──────┘
//!                                                  │
//!                                                  ▼
//!                                     dispatch ──► QueryBackend
//! ```

mod backend;
mod config;
mod session;

pub use backend::{
    dispatch, BackendError, ChartData, ChartError, QueryBackend, WithTimeout, DEFAULT_QUERY_TIMEOUT_SECS,
};
pub use config::{ChartConfig, ConfigError, DashboardConfig, DEFAULT_DATE_FILTER};
pub use session::{ChartQuery, DashboardSession};

use crate::filter::FilterError;
use crate::period::PeriodError;
use crate::template::{ParseError, ResolveError};

/// Errors from dashboard sessions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DashboardError {
    #[error("Template error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Period(#[from] PeriodError),

    /// A required filter is unset. `message` is what the dashboard shows.
    #[error("{message}")]
    FilterRequired { name: String, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Chart {0} not found")]
    ChartNotFound(usize),

    #[error("Chart {0} has no query")]
    NoQuery(usize),
}

pub type DashboardResult<T> = Result<T, DashboardError>;

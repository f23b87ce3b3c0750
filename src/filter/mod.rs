//! Filter values, definitions and the filter value store.
//!
//! - [`FilterValue`]: a typed, committed value (text, number, date, date
//!   range, URL path, or a crate-built SQL fragment)
//! - [`FilterBinding`]: the name to value map a template is resolved against
//! - [`FilterStore`]: per-session store that validates every write against
//!   the filter's declared [`FilterKind`] and enforces required filters

mod binding;
mod store;
mod value;

pub use binding::FilterBinding;
pub use store::{FilterDef, FilterError, FilterKind, FilterOption, FilterResult, FilterStore};
pub use value::{
    check_column, check_name, check_text, DateRange, FilterValue, PathCondition, PathOperator, SqlFragment, ValueError,
};

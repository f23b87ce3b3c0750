//! Query templates: parsing and resolution.
//!
//! A template is SQL text with two kinds of markers:
//!
//! - `{{name}}` placeholders, replaced by the value bound to `name`
//! - `[[ ... ]]` optional blocks, emitted only when the first placeholder
//!   inside them (the block's trigger) is bound
//!
//! A block may contain one `--` fallback separator. `[[ present -- fallback ]]`
//! emits `present` when the trigger is bound and `fallback` otherwise. When
//! nothing follows the separator inside the block, the rest of the line after
//! `]]` is the fallback:
//!
//! ```text
//! AND url_path [[ {{url_sti}} --]] = '/'
//! ```
//!
//! Outside blocks `--` is ordinary SQL.
//!
//! Path filters render with their own operator (`= '/p'` or `LIKE '/p%'`),
//! so the operator belongs in the fallback, not before the block. Write
//! `url_path [[ {{url_sti}} --]] = '/'` rather than
//! `url_path = [[ {{url_sti}} --]] '/'`, which renders as `= = '/p'`.
//!
//! # Example
//!
//! ```
//! use dashql::filter::FilterBinding;
//! use dashql::template::{parse, resolve};
//!
//! let template = parse("WHERE website_id = '{{website_id}}' [[AND {{created_at}}]]").unwrap();
//!
//! let binding = FilterBinding::new().with("website_id", "abc");
//! assert_eq!(resolve(&template, &binding).unwrap(), "WHERE website_id = 'abc' ");
//! ```

mod ast;
mod cache;
pub mod lexer;
mod parser;
mod resolve;

pub use ast::{OptionalBlock, PlaceholderRef, Segment, Template};
pub use cache::TemplateCache;
pub use parser::{parse, ParseError, Span};
pub use resolve::{resolve, ResolveError};

use crate::filter::FilterBinding;

/// Either stage of turning raw template text into a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Parse and resolve in one step, without caching.
pub fn render(raw: &str, binding: &FilterBinding) -> Result<String, TemplateError> {
    let template = parse(raw)?;
    Ok(resolve(&template, binding)?)
}

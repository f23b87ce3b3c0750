//! Resolution of a parsed template against a filter binding.

use super::ast::{Segment, Template};
use crate::filter::FilterBinding;

/// Errors raised while resolving a template.
///
/// Resolution is all-or-nothing: on error no partial query is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Missing required filter: {0}")]
    MissingRequiredFilter(String),

    #[error("Invalid value for filter '{name}': {reason}")]
    InvalidFilterValue { name: String, reason: String },
}

/// Resolve `template` to query text.
///
/// Walks the segments depth-first, left to right. Literals are copied,
/// placeholders are replaced by their value's SQL text, and optional blocks
/// are emitted or skipped according to whether their trigger is bound.
/// Placeholders inside a skipped block are never looked up.
///
/// The output depends only on the two arguments.
pub fn resolve(template: &Template, binding: &FilterBinding) -> Result<String, ResolveError> {
    let mut out = String::new();
    write_segments(&template.segments, binding, &mut out)?;
    Ok(out)
}

fn write_segments(segments: &[Segment], binding: &FilterBinding, out: &mut String) -> Result<(), ResolveError> {
    for segment in segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(placeholder) => {
                let name = &placeholder.name;
                let value = binding
                    .get(name)
                    .ok_or_else(|| ResolveError::MissingRequiredFilter(name.clone()))?;
                let text = value.to_sql().map_err(|e| ResolveError::InvalidFilterValue {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
                out.push_str(&text);
            }
            Segment::Optional(block) => {
                if block.is_emitted(binding.contains(&block.trigger)) {
                    write_segments(&block.segments, binding, out)?;
                }
            }
        }
    }
    Ok(())
}

//! Read-through cache of parsed templates.
//!
//! Keyed by the raw template string. Parsing is pure, so two threads racing
//! to fill the same entry produce equal templates and either may win.

use std::sync::Arc;

use dashmap::DashMap;

use super::ast::Template;
use super::parser::{parse, ParseError};

/// Shared cache of parsed templates.
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: DashMap<String, Arc<Template>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached parse of `raw`, parsing it on first use.
    ///
    /// Parse failures are returned and not cached.
    pub fn get_or_parse(&self, raw: &str) -> Result<Arc<Template>, ParseError> {
        if let Some(entry) = self.entries.get(raw) {
            return Ok(Arc::clone(entry.value()));
        }
        let template = Arc::new(parse(raw)?);
        tracing::debug!(bytes = raw.len(), segments = template.segments.len(), "template parsed");
        let entry = self.entries.entry(raw.to_string()).or_insert(template);
        Ok(Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

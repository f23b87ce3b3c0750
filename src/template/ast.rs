//! Parsed form of a query template.

use std::collections::BTreeSet;

/// A parsed query template: an ordered sequence of segments.
///
/// Templates are immutable once parsed and can be shared between
/// resolutions (see [`TemplateCache`](super::TemplateCache)).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    pub segments: Vec<Segment>,
}

/// One piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied verbatim into the output.
    Literal(String),
    /// A `{{name}}` slot filled from the filter binding.
    Placeholder(PlaceholderRef),
    /// A `[[ ... ]]` fragment emitted only when its trigger condition holds.
    Optional(OptionalBlock),
}

/// A named reference to a filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRef {
    pub name: String,
}

impl PlaceholderRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A conditionally emitted fragment.
///
/// The block is emitted iff `negate == (binding[trigger] is absent)`:
/// a plain block needs its trigger bound, a negated block (the fallback
/// half of a `[[ ... -- ... ]]` pair) needs it unbound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalBlock {
    pub trigger: String,
    pub negate: bool,
    pub segments: Vec<Segment>,
}

impl OptionalBlock {
    /// Whether the block is emitted for the given trigger state.
    pub fn is_emitted(&self, trigger_bound: bool) -> bool {
        self.negate != trigger_bound
    }
}

impl Template {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Returns true if the template contains only literal text.
    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    /// All placeholder names referenced anywhere in the template, sorted.
    pub fn placeholders(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        collect_placeholders(&self.segments, true, &mut names);
        names
    }

    /// Placeholder names outside every optional block.
    ///
    /// These must always be bound for the template to resolve.
    pub fn unguarded(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        collect_placeholders(&self.segments, false, &mut names);
        names
    }

    /// Names of all optional block triggers, sorted.
    pub fn triggers(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        collect_triggers(&self.segments, &mut names);
        names
    }
}

fn collect_placeholders<'a>(segments: &'a [Segment], descend: bool, out: &mut BTreeSet<&'a str>) {
    for segment in segments {
        match segment {
            Segment::Literal(_) => {}
            Segment::Placeholder(p) => {
                out.insert(p.name.as_str());
            }
            Segment::Optional(block) if descend => {
                collect_placeholders(&block.segments, descend, out);
            }
            Segment::Optional(_) => {}
        }
    }
}

fn collect_triggers<'a>(segments: &'a [Segment], out: &mut BTreeSet<&'a str>) {
    for segment in segments {
        if let Segment::Optional(block) = segment {
            out.insert(block.trigger.as_str());
            collect_triggers(&block.segments, out);
        }
    }
}

/// Find the first placeholder in scan order, descending into nested blocks.
pub(crate) fn first_placeholder(segments: &[Segment]) -> Option<&str> {
    segments.iter().find_map(|segment| match segment {
        Segment::Literal(_) => None,
        Segment::Placeholder(p) => Some(p.name.as_str()),
        Segment::Optional(block) => first_placeholder(&block.segments),
    })
}

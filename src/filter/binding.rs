//! The set of filter values a template is resolved against.

use std::collections::BTreeMap;

use super::value::FilterValue;

/// Filter name to committed value.
///
/// A name that is not present is "not set". The map is ordered so that
/// iteration, debug output and logging are deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterBinding {
    values: BTreeMap<String, FilterValue>,
}

impl FilterBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Bind a value. Empty values unbind the name instead.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FilterValue>) {
        let name = name.into();
        let value = value.into();
        if value.is_empty() {
            self.values.remove(&name);
        } else {
            self.values.insert(name, value);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FilterValue> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<FilterValue>> FromIterator<(K, V)> for FilterBinding {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut binding = FilterBinding::new();
        for (name, value) in iter {
            binding.insert(name, value);
        }
        binding
    }
}

use std::collections::BTreeMap;

use serde::Serialize;

/// Shown for a field whose raw value was null.
pub const NONE_TEXT: &str = "None";
/// Shown for a field name the record never produced.
pub const NOT_FOUND_TEXT: &str = "Field not found";
/// Shown for a field whose handler failed.
pub const ERROR_TEXT: &str = "Not available";

/// A handler failure that was contained to one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldFailure {
    pub field: String,
    pub details: String,
}

/// Lower-cased field name → rendered value for one record.
///
/// An optional fallback table answers names this one lacks (an open house
/// falls back to its embedded listing).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldTable {
    fields: BTreeMap<String, String>,
    #[serde(skip)]
    fallback: Option<Box<FieldTable>>,
    #[serde(skip)]
    failures: Vec<FieldFailure>,
}

impl FieldTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_lowercase(), value.into());
    }

    /// Case-insensitive lookup, consulting the fallback table on a miss.
    pub fn get(&self, name: &str) -> Option<&str> {
        let key = name.to_lowercase();
        match self.fields.get(&key) {
            Some(value) => Some(value.as_str()),
            None => self.fallback.as_deref().and_then(|f| f.get(&key)),
        }
    }

    /// Display value; a miss reads `NOT_FOUND_TEXT`.
    pub fn field(&self, name: &str) -> String {
        self.get(name).unwrap_or(NOT_FOUND_TEXT).to_string()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Own entries only, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Replaces every own value with `text`.
    pub fn overwrite_all(&mut self, text: &str) {
        for value in self.fields.values_mut() {
            *value = text.to_string();
        }
    }

    pub fn set_fallback(&mut self, table: FieldTable) {
        self.fallback = Some(Box::new(table));
    }

    pub fn fallback(&self) -> Option<&FieldTable> {
        self.fallback.as_deref()
    }

    pub fn record_failure(&mut self, field: &str, details: impl Into<String>) {
        self.failures.push(FieldFailure {
            field: field.to_string(),
            details: details.into(),
        });
    }

    /// Contained handler failures, in processing order.
    pub fn failures(&self) -> &[FieldFailure] {
        &self.failures
    }
}

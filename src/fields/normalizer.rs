//! # Field Normalizer
//!
//! A `HandlerRegistry` is declared once per record type: a table from raw
//! top-level field name to a `FieldHandler`, the set of numeric field names,
//! and the derived fields computed from the whole record afterwards.
//!
//! `Normalizer::normalize` walks the record in its own key order. Registered
//! fields go through their handler; everything else goes through the generic
//! scalar formatter. A handler error never escapes: the field reads
//! `ERROR_TEXT` and the failure is kept on the table for logging.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::configs::VistaConfig;
use crate::core::error::VistaError;
use crate::fields::format::{Scalar, format_scalar};
use crate::fields::handlers;
use crate::fields::table::{ERROR_TEXT, FieldTable, NONE_TEXT};

/// Record-specific handler: `(writer, raw name, raw value)`.
pub type HandlerFn = fn(&mut FieldWriter<'_>, &str, &Value) -> Result<(), VistaError>;

/// Derived-field computation over the whole raw record.
pub type DerivedFn = fn(&mut FieldWriter<'_>, &Map<String, Value>) -> Result<(), VistaError>;

/// What to do with one raw top-level field.
#[derive(Clone, Copy)]
pub enum FieldHandler {
    /// Write each sub-field through the generic formatter, names prefixed.
    Flatten { prefix: &'static str },
    /// Ordinal photo slots plus a slideshow fragment.
    Photos { slots: usize },
    /// Timestamp split into a date field and a time field.
    SplitTimestamp {
        date_field: &'static str,
        time_field: &'static str,
    },
    /// Timestamp rendered in the configured timezone, under its own name.
    LocalTimestamp,
    /// Embedded record normalized with another registry and kept as fallback.
    Nested(fn() -> &'static HandlerRegistry),
    Custom(HandlerFn),
}

/// A field computed after the walk.
#[derive(Clone, Copy)]
pub enum DerivedField {
    /// `numerator / denominator`, each a path into the raw record.
    /// Missing numerator or zero/missing denominator reads `NONE_TEXT`.
    Ratio {
        output: &'static str,
        numerator: &'static [&'static str],
        denominator: &'static [&'static str],
    },
    Custom {
        output: &'static str,
        compute: DerivedFn,
    },
}

impl DerivedField {
    fn output(&self) -> &'static str {
        match self {
            DerivedField::Ratio { output, .. } | DerivedField::Custom { output, .. } => output,
        }
    }
}

pub struct HandlerRegistry {
    kind: &'static str,
    handlers: HashMap<&'static str, FieldHandler>,
    numeric: HashSet<&'static str>,
    derived: Vec<DerivedField>,
}

impl HandlerRegistry {
    pub fn builder(kind: &'static str) -> RegistryBuilder {
        RegistryBuilder {
            registry: HandlerRegistry {
                kind,
                handlers: HashMap::new(),
                numeric: HashSet::new(),
                derived: Vec::new(),
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn handler(&self, name: &str) -> Option<&FieldHandler> {
        self.handlers.get(name)
    }

    /// Numeric names match the raw API spelling exactly.
    pub fn is_numeric(&self, name: &str) -> bool {
        self.numeric.contains(name)
    }

    pub fn derived(&self) -> &[DerivedField] {
        &self.derived
    }
}

pub struct RegistryBuilder {
    registry: HandlerRegistry,
}

impl RegistryBuilder {
    pub fn handle(mut self, name: &'static str, handler: FieldHandler) -> Self {
        self.registry.handlers.insert(name, handler);
        self
    }

    pub fn numeric(mut self, names: &[&'static str]) -> Self {
        self.registry.numeric.extend(names.iter().copied());
        self
    }

    pub fn derive(mut self, field: DerivedField) -> Self {
        self.registry.derived.push(field);
        self
    }

    pub fn build(self) -> HandlerRegistry {
        self.registry
    }
}

/// Site settings some handlers need.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOptions {
    pub timezone: String,
    pub home_url: String,
    pub listing_page: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self::from_config(&VistaConfig::default())
    }
}

impl NormalizeOptions {
    pub fn from_config(config: &VistaConfig) -> Self {
        Self {
            timezone: config.timezone.clone(),
            home_url: config.home_url.clone(),
            listing_page: config.listing_page.clone(),
        }
    }

    /// Absolute URL of the single-listing page for `mls_id`.
    pub fn listing_url(&self, mls_id: &str) -> String {
        format!(
            "{}{}?listing={}",
            self.home_url.trim_end_matches('/'),
            self.listing_page,
            mls_id
        )
    }
}

/// Write access to the table being built, for handlers.
pub struct FieldWriter<'a> {
    table: &'a mut FieldTable,
    registry: &'a HandlerRegistry,
    options: &'a NormalizeOptions,
}

impl<'a> FieldWriter<'a> {
    pub fn options(&self) -> &NormalizeOptions {
        self.options
    }

    pub fn table(&self) -> &FieldTable {
        self.table
    }

    pub fn text(&mut self, name: &str, value: impl Into<String>) {
        self.table.insert(name, value);
    }

    pub fn none(&mut self, name: &str) {
        self.table.insert(name, NONE_TEXT);
    }

    pub fn error(&mut self, name: &str) {
        self.table.insert(name, ERROR_TEXT);
    }

    /// Generic formatter. Returns false when the value was nested and dropped.
    pub fn scalar(&mut self, name: &str, value: &Value) -> bool {
        match format_scalar(value, self.registry.is_numeric(name)) {
            Scalar::Text(text) => self.table.insert(name, text),
            Scalar::Null => self.table.insert(name, NONE_TEXT),
            Scalar::Nested => return false,
        }
        true
    }

    /// Like `scalar`, but a missing value reads `NONE_TEXT` too.
    pub fn optional(&mut self, name: &str, value: Option<&Value>) -> bool {
        self.scalar(name, value.unwrap_or(&Value::Null))
    }

    /// Writes every scalar sub-field of `value` with `prefix` on its name.
    /// Non-objects write nothing.
    pub fn flatten(&mut self, value: &Value, prefix: &str) {
        let Some(fields) = value.as_object() else {
            return;
        };
        for (name, sub) in fields {
            self.scalar(&format!("{}{}", prefix, name), sub);
        }
    }

    pub fn overwrite_all(&mut self, text: &str) {
        self.table.overwrite_all(text);
    }

    pub fn set_fallback(&mut self, table: FieldTable) {
        self.table.set_fallback(table);
    }
}

pub struct Normalizer<'r> {
    registry: &'r HandlerRegistry,
    options: &'r NormalizeOptions,
}

impl<'r> Normalizer<'r> {
    pub fn new(registry: &'r HandlerRegistry, options: &'r NormalizeOptions) -> Self {
        Self { registry, options }
    }

    /// Builds the field table for one raw record. Same input, same table.
    pub fn normalize(&self, record: &Value) -> FieldTable {
        let mut table = FieldTable::new();
        let Some(fields) = record.as_object() else {
            table.record_failure(self.registry.kind, "record is not a JSON object");
            return table;
        };

        for (name, value) in fields {
            let outcome = match self.registry.handler(name) {
                Some(handler) => self.dispatch(&mut table, *handler, name, value),
                None => {
                    self.writer(&mut table).scalar(name, value);
                    Ok(())
                }
            };
            if let Err(e) = outcome {
                table.insert(name, ERROR_TEXT);
                table.record_failure(name, e.to_string());
            }
        }

        for derived in self.registry.derived() {
            let outcome = match derived {
                DerivedField::Ratio { output, numerator, denominator } => {
                    handlers::ratio(&mut self.writer(&mut table), fields, output, numerator, denominator);
                    Ok(())
                }
                DerivedField::Custom { compute, .. } => compute(&mut self.writer(&mut table), fields),
            };
            if let Err(e) = outcome {
                table.insert(derived.output(), ERROR_TEXT);
                table.record_failure(derived.output(), e.to_string());
            }
        }

        table
    }

    fn writer<'t>(&'t self, table: &'t mut FieldTable) -> FieldWriter<'t> {
        FieldWriter {
            table,
            registry: self.registry,
            options: self.options,
        }
    }

    fn dispatch(
        &self,
        table: &mut FieldTable,
        handler: FieldHandler,
        name: &str,
        value: &Value,
    ) -> Result<(), VistaError> {
        let mut writer = self.writer(table);
        match handler {
            FieldHandler::Flatten { prefix } => {
                writer.flatten(value, prefix);
                Ok(())
            }
            FieldHandler::Photos { slots } => handlers::photos(&mut writer, name, value, slots),
            FieldHandler::SplitTimestamp { date_field, time_field } => {
                handlers::split_timestamp(&mut writer, value, date_field, time_field);
                Ok(())
            }
            FieldHandler::LocalTimestamp => {
                handlers::local_timestamp(&mut writer, name, value);
                Ok(())
            }
            FieldHandler::Nested(registry) => {
                if value.is_object() {
                    let nested = Normalizer::new(registry(), self.options).normalize(value);
                    writer.set_fallback(nested);
                }
                Ok(())
            }
            FieldHandler::Custom(handler) => handler(&mut writer, name, value),
        }
    }
}

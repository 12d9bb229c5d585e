//! Open house records. Lookups that miss on the open house itself fall back
//! to the embedded listing.

use std::sync::LazyLock;

use serde_json::Value;

use crate::fields::normalizer::{FieldHandler, HandlerRegistry, NormalizeOptions, Normalizer};
use crate::fields::table::FieldTable;
use crate::records::listing;

static REGISTRY: LazyLock<HandlerRegistry> = LazyLock::new(|| {
    HandlerRegistry::builder("openhouse")
        .handle("listing", FieldHandler::Nested(listing::registry))
        .handle("startTime", FieldHandler::LocalTimestamp)
        .handle("endTime", FieldHandler::LocalTimestamp)
        .build()
});

pub fn registry() -> &'static HandlerRegistry {
    &REGISTRY
}

pub fn normalize(record: &Value, options: &NormalizeOptions) -> FieldTable {
    Normalizer::new(registry(), options).normalize(record)
}

//! Record types the API returns, each declared as one handler registry.

pub mod analytics;
pub mod listing;
pub mod openhouse;

use serde::Serialize;
use serde_json::Value;

use crate::fields::normalizer::NormalizeOptions;
use crate::fields::table::FieldTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordKind {
    Listing,
    OpenHouse,
    Analytics,
}

impl RecordKind {
    pub fn normalize(self, record: &Value, options: &NormalizeOptions) -> FieldTable {
        match self {
            RecordKind::Listing => listing::normalize(record, options),
            RecordKind::OpenHouse => openhouse::normalize(record, options),
            RecordKind::Analytics => analytics::normalize(record, options),
        }
    }
}

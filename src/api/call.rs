use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::core::error::VistaError;

/// Endpoints the listings proxy understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Properties,
    Property,
    OpenHouses,
    OpenHouse,
    Agents,
    Analytics,
    Analytic,
}

impl CallType {
    pub const ALL: [CallType; 7] = [
        CallType::Properties,
        CallType::Property,
        CallType::OpenHouses,
        CallType::OpenHouse,
        CallType::Agents,
        CallType::Analytics,
        CallType::Analytic,
    ];

    /// Value of the `endpoint` query parameter.
    pub fn endpoint(self) -> &'static str {
        match self {
            CallType::Properties => "properties",
            CallType::Property => "property",
            CallType::OpenHouses => "openhouses",
            CallType::OpenHouse => "openhouse",
            CallType::Agents => "agents",
            CallType::Analytics => "analytics",
            CallType::Analytic => "analytic",
        }
    }

    /// Whether the endpoint addresses one record and needs an `objectID`.
    pub fn is_record_scoped(self) -> bool {
        matches!(
            self,
            CallType::Property | CallType::OpenHouse | CallType::Analytic
        )
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.endpoint())
    }
}

impl FromStr for CallType {
    type Err = VistaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CallType::ALL
            .into_iter()
            .find(|t| t.endpoint() == s)
            .ok_or_else(|| VistaError::Configuration(format!("Bad call type: {}", s)))
    }
}

/// Which endpoint a request targets, and for record-scoped endpoints, which record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallDescriptor {
    call_type: CallType,
    record_id: Option<String>,
}

impl CallDescriptor {
    /// Fails with `Configuration` when a record-scoped type gets an empty id.
    /// Ids passed to collection endpoints are ignored.
    pub fn new(call_type: CallType, record_id: &str) -> Result<Self, VistaError> {
        if call_type.is_record_scoped() && record_id.is_empty() {
            return Err(VistaError::Configuration(format!(
                "Must set a record id with call type {}",
                call_type
            )));
        }

        Ok(Self {
            call_type,
            record_id: call_type
                .is_record_scoped()
                .then(|| record_id.to_string()),
        })
    }

    /// Descriptor for an endpoint that takes no id.
    pub fn collection(call_type: CallType) -> Result<Self, VistaError> {
        Self::new(call_type, "")
    }

    pub fn call_type(&self) -> CallType {
        self.call_type
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    /// Leading query pairs: `endpoint` and, when scoped, `objectID`.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![("endpoint", self.call_type.endpoint())];
        if let Some(id) = &self.record_id {
            pairs.push(("objectID", id.as_str()));
        }
        pairs
    }
}

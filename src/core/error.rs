//! # Core Error Module
//!
//! This module defines the central `VistaError` type used throughout the library.
//! It leverages `thiserror` for error message formatting and `serde` for serialization.
//!
//! Every message is written to be shown to a site visitor as-is: the display
//! layer substitutes it where a field or listing would have appeared.

use serde::Serialize;
use thiserror::Error;

/// Central error type for the `vista_listings` library.
#[derive(Debug, Clone, Error, Serialize, PartialEq)]
pub enum VistaError {
    /// Invalid construction, e.g. a record-scoped call without a record id.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection failure, timeout, or a body that is not JSON.
    #[error("API Error occurred: {0}")]
    Transport(String),

    /// The decoded envelope is missing its `headers` or `body` key.
    #[error("Malformed response from listings server at {endpoint}: {details}")]
    MalformedResponse {
        /// The endpoint that was called.
        endpoint: String,
        /// Description of why the structure was considered malformed.
        details: String,
    },

    /// The envelope carries an explicit error flag.
    #[error("Error returned by API: {message}")]
    Upstream {
        /// Message reported by the upstream service.
        message: String,
    },

    /// A single field handler failed. Never leaves the normalizer.
    #[error("Could not process field '{field}': {details}")]
    FieldHandler {
        /// Raw field name the handler was registered for.
        field: String,
        /// Why the handler gave up.
        details: String,
    },

    /// Parameters were added after the response was fetched.
    #[error("API has already been called with this client, more parameters cannot be added")]
    AlreadyCalled,

    /// Error related to internal logic or state.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VistaError {
    /// Shorthand used by field handlers.
    pub fn field(field: &str, details: impl Into<String>) -> Self {
        VistaError::FieldHandler {
            field: field.to_string(),
            details: details.into(),
        }
    }
}

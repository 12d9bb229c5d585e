//! The normalization engine: raw API records in, flat display-ready field
//! tables out.

pub mod format;
pub mod handlers;
pub mod normalizer;
pub mod table;

pub use format::{Scalar, format_scalar};
pub use normalizer::{
    DerivedField, FieldHandler, FieldWriter, HandlerRegistry, NormalizeOptions, Normalizer,
};
pub use table::{ERROR_TEXT, FieldFailure, FieldTable, NONE_TEXT, NOT_FOUND_TEXT};

pub mod api;
pub mod configs;
pub mod core;
pub mod display;
pub mod fields;
pub mod loggers;
pub mod records;
pub mod retrieve;
pub mod store;
pub mod utils;

pub use core::error::VistaError;

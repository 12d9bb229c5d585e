//! Request side of the listings API: parameters, call descriptors, the
//! query-string collectors and the single-shot client.

pub mod call;
pub mod client;
pub mod collector;
pub mod params;

pub use call::{CallDescriptor, CallType};
pub use client::{ApiClient, ApiContext, ApiResponse, ResponseHeaders};
pub use collector::{CollectOptions, ParamCollector, ParamMapping, QueryInput};
pub use params::{ParamValue, ParameterSet};

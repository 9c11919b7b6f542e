//! Normalization, data-quality auditing and aggregation of a
//! semicolon-delimited sales log.

pub mod aggregate;
pub mod audit;
pub mod error;
pub mod fields;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod reports;
pub mod stats;
pub mod types;
pub mod util;

pub use error::{Result, SalesError};
pub use types::{Record, RecordSet, Value};

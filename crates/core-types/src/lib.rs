//! # Marginscope Core Types
//!
//! The shared vocabulary of the workspace: the raw per-stock observation handed in by the
//! data-loading collaborator, the derived analytic record handed back out, and the two
//! classification enums that describe a record.
//!
//! As a Layer 0 crate it has no knowledge of configuration, models or datasets.

pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{MarginSafety, Recommendation};
pub use error::CoreError;
pub use structs::{DerivedStockRecord, RawStockObservation};

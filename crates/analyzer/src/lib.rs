//! # Marginscope Analyzer
//!
//! Holds a session's derived record collection and answers the presentation layer's
//! queries over it: ranking, structured filters, symbol search, top-N and lookup.
//!
//! The pipeline is `ingress -> MetricsCalculator -> RankingEngine -> AnalyticsDataset`,
//! with `RecordPredicate` and `SymbolSearchIndex` applied on read. Nothing in this crate
//! performs I/O; tables arrive already parsed into cells.

pub mod dataset;
pub mod error;
pub mod fields;
pub mod filter;
pub mod ingress;
pub mod ranking;
pub mod search;
pub mod summary;

pub use dataset::{AnalyticsDataset, LoadReport, RejectedObservation};
pub use error::AnalyzerError;
pub use fields::{FIELDS, FieldDescriptor};
pub use filter::{FilterCriteria, RecordPredicate};
pub use ingress::{IngressTable, REQUIRED_COLUMNS};
pub use ranking::RankingEngine;
pub use search::SymbolSearchIndex;
pub use summary::{DatasetSummary, SymbolMetric};

//! # Marginscope Analytics
//!
//! Turns one raw per-stock observation into its full analytic record: safety band,
//! margin-call probability, value-at-risk, position limits, risk-adjusted score and
//! recommendation.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of datasets,
//!   files or presentation.
//! - **Stateless Calculation:** `MetricsCalculator::derive` is a pure function of its
//!   input. Deriving the same observation twice yields identical records.
//!
//! ## Public API
//!
//! - `MetricsCalculator`: holds the scoring weights, sizer and margin-risk model.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

pub mod calculator;
pub mod error;

pub use calculator::MetricsCalculator;
pub use error::AnalyticsError;

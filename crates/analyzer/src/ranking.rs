use crate::error::AnalyzerError;
use core_types::DerivedStockRecord;
use std::cmp::Ordering;

/// Assigns `risk_adjusted_rank` across a whole collection.
///
/// Ranks run from 1 (best) to N with no gaps or repeats. Records are ordered by
/// risk-adjusted score descending, ties broken by ascending symbol, so the ranking is
/// fully deterministic. Only the rank field is written.
#[derive(Debug, Default, Clone, Copy)]
pub struct RankingEngine;

impl RankingEngine {
    pub fn new() -> Self {
        Self
    }

    /// Ranks `records` in place of their previous ranks and returns them in the
    /// original order.
    pub fn rank(
        &self,
        mut records: Vec<DerivedStockRecord>,
    ) -> Result<Vec<DerivedStockRecord>, AnalyzerError> {
        let order = self.rank_order(&records)?;
        for (position, &index) in order.iter().enumerate() {
            records[index].risk_adjusted_rank = rank_number(position)?;
        }
        Ok(records)
    }

    /// Indices of `records` from best to worst.
    pub fn rank_order(&self, records: &[DerivedStockRecord]) -> Result<Vec<usize>, AnalyzerError> {
        if records.is_empty() {
            return Err(AnalyzerError::EmptyDataset);
        }
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by(|&a, &b| compare(&records[a], &records[b]));
        Ok(order)
    }
}

/// Best-first ordering: higher score wins, then the lexicographically smaller symbol.
pub fn compare(a: &DerivedStockRecord, b: &DerivedStockRecord) -> Ordering {
    b.risk_adjusted_score
        .cmp(&a.risk_adjusted_score)
        .then_with(|| a.symbol.cmp(&b.symbol))
}

/// The 1-based rank for a 0-based position in the rank order.
fn rank_number(position: usize) -> Result<u32, AnalyzerError> {
    position
        .checked_add(1)
        .and_then(|rank| u32::try_from(rank).ok())
        .ok_or(AnalyzerError::TooManyRecords(position.saturating_add(1)))
}

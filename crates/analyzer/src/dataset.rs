use crate::error::AnalyzerError;
use crate::filter::{FilterCriteria, RecordPredicate};
use crate::ingress::{IngressTable, ParsedRow};
use crate::ranking::RankingEngine;
use crate::search::SymbolSearchIndex;
use crate::summary::DatasetSummary;
use analytics::{AnalyticsError, MetricsCalculator};
use configuration::{BadRecordPolicy, Config};
use core_types::{DerivedStockRecord, RawStockObservation};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// An observation that was left out of a load, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedObservation {
    /// Zero-based position in the submitted snapshot.
    pub position: usize,
    pub symbol: Option<String>,
    pub reason: String,
}

/// The outcome of a successful load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub rejected: Vec<RejectedObservation>,
}

/// Everything derived from one snapshot. Replaced as a whole on every load.
#[derive(Debug, Default)]
struct Snapshot {
    observations: Vec<RawStockObservation>,
    records: Vec<DerivedStockRecord>,
    /// Record positions from rank 1 to rank N.
    rank_order: Vec<usize>,
    by_symbol: HashMap<String, usize>,
    search: SymbolSearchIndex,
}

/// The aggregate root: one analyst session's derived and ranked record collection.
///
/// Records are kept in input order. Ranks are computed once per load over the whole
/// collection and never patched. A failed load leaves the previous snapshot untouched.
///
/// The dataset has a single owner; share it across threads only behind external
/// serialization of `load`.
#[derive(Debug)]
pub struct AnalyticsDataset {
    calculator: MetricsCalculator,
    ranking: RankingEngine,
    policy: BadRecordPolicy,
    snapshot: Snapshot,
}

impl AnalyticsDataset {
    /// Creates an empty dataset.
    pub fn new(calculator: MetricsCalculator, policy: BadRecordPolicy) -> Self {
        Self {
            calculator,
            ranking: RankingEngine::new(),
            policy,
            snapshot: Snapshot::default(),
        }
    }

    /// Creates an empty dataset with the calculator and policy the configuration selects.
    pub fn from_config(config: &Config) -> Result<Self, AnalyzerError> {
        let calculator = MetricsCalculator::from_config(config)
            .map_err(|e| AnalyzerError::Configuration(e.to_string()))?;
        Ok(Self::new(calculator, config.dataset.bad_record_policy))
    }

    pub fn policy(&self) -> BadRecordPolicy {
        self.policy
    }

    /// Derives and ranks `observations`, replacing the current snapshot.
    pub fn load(
        &mut self,
        observations: Vec<RawStockObservation>,
    ) -> Result<LoadReport, AnalyzerError> {
        let rows = observations.into_iter().map(Ok).collect();
        self.install(rows)
    }

    /// Validates the table's schema, then loads its rows.
    ///
    /// A missing required column fails with `SchemaError` before anything is derived.
    pub fn load_table(&mut self, table: &IngressTable) -> Result<LoadReport, AnalyzerError> {
        let rows = table.parse()?;
        self.install(rows)
    }

    /// Re-derives the current snapshot with a new calculator, e.g. after the scoring
    /// weights change. On failure both the calculator and the snapshot stay as they were.
    pub fn reload(&mut self, calculator: MetricsCalculator) -> Result<LoadReport, AnalyzerError> {
        let rows = self
            .snapshot
            .observations
            .iter()
            .cloned()
            .map(Ok)
            .collect();
        let (snapshot, report) = build_snapshot(&calculator, &self.ranking, self.policy, rows)?;
        self.calculator = calculator;
        self.snapshot = snapshot;
        Ok(report)
    }

    fn install(&mut self, rows: Vec<ParsedRow>) -> Result<LoadReport, AnalyzerError> {
        let (snapshot, report) = build_snapshot(&self.calculator, &self.ranking, self.policy, rows)?;
        self.snapshot = snapshot;
        Ok(report)
    }

    pub fn is_loaded(&self) -> bool {
        !self.snapshot.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.snapshot.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.records.is_empty()
    }

    /// The full collection in input order.
    pub fn all(&self) -> &[DerivedStockRecord] {
        &self.snapshot.records
    }

    /// The full collection from rank 1 to rank N.
    pub fn ranked(&self) -> impl Iterator<Item = &DerivedStockRecord> + '_ {
        self.snapshot
            .rank_order
            .iter()
            .map(|&i| &self.snapshot.records[i])
    }

    /// Records accepted by `predicate`, in rank order.
    ///
    /// No match is a valid, empty result.
    pub fn filtered(&self, predicate: &RecordPredicate) -> Vec<&DerivedStockRecord> {
        self.ranked().filter(|r| predicate.matches(r)).collect()
    }

    /// Records whose symbol contains `term`, case-insensitively, in rank order.
    pub fn search(&self, term: Option<&str>) -> Vec<&DerivedStockRecord> {
        self.resolve(
            self.snapshot
                .search
                .search_within(term, self.snapshot.rank_order.iter().copied()),
        )
    }

    /// Filter, then search: the structured criteria pick the view and the search term
    /// narrows it further. Results are in rank order.
    pub fn query(&self, criteria: &FilterCriteria, term: Option<&str>) -> Vec<&DerivedStockRecord> {
        let predicate = criteria.build();
        let unrestricted = predicate.is_unrestricted();
        let candidates = self
            .snapshot
            .rank_order
            .iter()
            .copied()
            .filter(|&i| unrestricted || predicate.matches(&self.snapshot.records[i]));
        self.resolve(self.snapshot.search.search_within(term, candidates))
    }

    /// The `n` best-ranked records, best first.
    pub fn top_n(&self, n: usize) -> Result<Vec<&DerivedStockRecord>, AnalyzerError> {
        if self.is_empty() {
            return Err(AnalyzerError::EmptyDataset);
        }
        Ok(self.ranked().take(n).collect())
    }

    /// The record for `symbol` (exact match).
    pub fn lookup(&self, symbol: &str) -> Result<&DerivedStockRecord, AnalyzerError> {
        self.snapshot
            .by_symbol
            .get(symbol)
            .map(|&i| &self.snapshot.records[i])
            .ok_or_else(|| AnalyzerError::NotFound(symbol.to_string()))
    }

    pub fn summary(&self) -> Result<DatasetSummary, AnalyzerError> {
        DatasetSummary::from_records(&self.snapshot.records)
    }

    fn resolve(&self, positions: Vec<usize>) -> Vec<&DerivedStockRecord> {
        positions
            .into_iter()
            .map(|i| &self.snapshot.records[i])
            .collect()
    }
}

/// Derives every row, applies the bad-record policy, and ranks the survivors.
fn build_snapshot(
    calculator: &MetricsCalculator,
    ranking: &RankingEngine,
    policy: BadRecordPolicy,
    rows: Vec<ParsedRow>,
) -> Result<(Snapshot, LoadReport), AnalyzerError> {
    if rows.is_empty() {
        return Err(AnalyzerError::EmptyDataset);
    }

    let mut observations = Vec::with_capacity(rows.len());
    let mut records = Vec::with_capacity(rows.len());
    let mut seen: HashSet<String> = HashSet::with_capacity(rows.len());
    let mut report = LoadReport::default();

    for (position, row) in rows.into_iter().enumerate() {
        let outcome = row.and_then(|observation| {
            let record = calculator.derive(&observation)?;
            if seen.contains(&record.symbol) {
                return Err(AnalyticsError::InvalidObservation {
                    symbol: record.symbol,
                    reason: "duplicate symbol".to_string(),
                });
            }
            seen.insert(record.symbol.clone());
            Ok((observation, record))
        });

        match outcome {
            Ok((observation, record)) => {
                observations.push(observation);
                records.push(record);
            }
            Err(e) => match policy {
                BadRecordPolicy::RejectLoad => {
                    tracing::error!(position, error = %e, "Rejecting load on invalid observation.");
                    return Err(AnalyzerError::InvalidObservation(e));
                }
                BadRecordPolicy::Skip => {
                    tracing::warn!(position, error = %e, "Skipping invalid observation.");
                    report.rejected.push(RejectedObservation {
                        position,
                        symbol: e.symbol().map(str::to_string),
                        reason: e.to_string(),
                    });
                }
            },
        }
    }

    if records.is_empty() {
        tracing::warn!(
            rejected = report.rejected.len(),
            "No valid observations in snapshot; keeping the previous dataset."
        );
        return Err(AnalyzerError::EmptyDataset);
    }

    let records = ranking.rank(records)?;

    let mut rank_order = vec![0; records.len()];
    for (i, record) in records.iter().enumerate() {
        rank_order[record.risk_adjusted_rank as usize - 1] = i;
    }

    let by_symbol = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.symbol.clone(), i))
        .collect();
    let search = SymbolSearchIndex::build(&records);

    report.loaded = records.len();
    tracing::info!(
        loaded = report.loaded,
        rejected = report.rejected.len(),
        "Dataset loaded and ranked."
    );

    Ok((
        Snapshot {
            observations,
            records,
            rank_order,
            by_symbol,
            search,
        },
        report,
    ))
}

use crate::error::AnalyzerError;
use analytics::AnalyticsError;
use core_types::RawStockObservation;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

pub const SYMBOL: &str = "Symbol";
pub const CURRENT_PRICE: &str = "Current_Price";
pub const PREDICTED_RETURN_5D: &str = "Predicted_Return_5d";
pub const MARGIN_CALL_PROBABILITY: &str = "Margin_Call_Probability";
pub const VALUE_AT_RISK_95: &str = "Value_at_Risk_95";
pub const VOLATILITY_20D: &str = "Volatility_20d";
pub const FUNDAMENTAL_STRENGTH: &str = "Fundamental_Strength";

/// Columns every ingress table must carry. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    SYMBOL,
    CURRENT_PRICE,
    PREDICTED_RETURN_5D,
    MARGIN_CALL_PROBABILITY,
    VALUE_AT_RISK_95,
    VOLATILITY_20D,
    FUNDAMENTAL_STRENGTH,
];

/// A tabular snapshot as handed over by the data-loading collaborator: a header row
/// and string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngressTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One parsed row: either an observation or the reason it was rejected.
pub type ParsedRow = Result<RawStockObservation, AnalyticsError>;

impl IngressTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Checks the header against the required columns.
    pub fn check_schema(&self) -> Result<(), AnalyzerError> {
        let present: Vec<&str> = self.headers.iter().map(|h| h.trim()).collect();
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|required| !present.contains(required))
            .map(|required| required.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AnalyzerError::SchemaError { missing })
        }
    }

    /// Parses every row into an observation.
    ///
    /// A missing required column fails the whole table with `SchemaError`. A row whose
    /// cells cannot be read is returned as an `InvalidObservation` in its position so the
    /// caller can apply its bad-record policy.
    pub fn parse(&self) -> Result<Vec<ParsedRow>, AnalyzerError> {
        self.check_schema()?;

        // First occurrence wins if a header is duplicated.
        let mut columns: HashMap<&str, usize> = HashMap::new();
        for (i, header) in self.headers.iter().enumerate() {
            columns.entry(header.trim()).or_insert(i);
        }

        Ok(self
            .rows
            .iter()
            .enumerate()
            .map(|(row_number, row)| parse_row(&columns, row_number, row))
            .collect())
    }
}

fn parse_row(columns: &HashMap<&str, usize>, row_number: usize, row: &[String]) -> ParsedRow {
    let cell = |name: &str| -> Option<&str> {
        columns
            .get(name)
            .and_then(|&i| row.get(i))
            .map(|c| c.trim())
    };

    let symbol = cell(SYMBOL).unwrap_or_default().to_string();
    let label = if symbol.is_empty() {
        format!("row {}", row_number + 1)
    } else {
        symbol.clone()
    };

    let number = |name: &str| -> Result<Decimal, AnalyticsError> {
        let raw = cell(name).ok_or_else(|| AnalyticsError::InvalidObservation {
            symbol: label.clone(),
            reason: format!("missing value for {}", name),
        })?;
        parse_decimal(raw).ok_or_else(|| AnalyticsError::InvalidObservation {
            symbol: label.clone(),
            reason: format!("{} is not a number: '{}'", name, raw),
        })
    };

    Ok(RawStockObservation {
        current_price: number(CURRENT_PRICE)?,
        predicted_return_5d: number(PREDICTED_RETURN_5D)?,
        volatility_20d: number(VOLATILITY_20D)?,
        fundamental_strength: number(FUNDAMENTAL_STRENGTH)?,
        margin_call_probability: number(MARGIN_CALL_PROBABILITY)?,
        value_at_risk_95: number(VALUE_AT_RISK_95)?,
        symbol,
    })
}

/// Accepts plain decimals as well as scientific notation (`1.5e-3`).
fn parse_decimal(raw: &str) -> Option<Decimal> {
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

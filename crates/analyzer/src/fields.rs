/// Name and meaning of one egress column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub description: &'static str,
}

const fn field(name: &'static str, description: &'static str) -> FieldDescriptor {
    FieldDescriptor { name, description }
}

/// The egress schema, in export column order. Names match the serialized field names
/// of `DerivedStockRecord`.
pub const FIELDS: [FieldDescriptor; 15] = [
    field("Symbol", "Stock ticker symbol"),
    field("Current_Price", "Current market price per share"),
    field("Margin_Safety", "Safety level for margin trading (Safe/Warning/Danger)"),
    field("Recommendation", "Trading recommendation based on the analysis"),
    field("Predicted_Return_5d", "Expected return over the next 5 trading days (fraction)"),
    field("Margin_Call_Probability", "Probability of facing a margin call (0-1)"),
    field("Value_at_Risk_95", "Maximum potential loss with 95% confidence (fraction)"),
    field("Volatility_20d", "20-day historical volatility (standard deviation of returns)"),
    field("Max_Position_$", "Maximum recommended investment amount"),
    field("Max_Shares", "Maximum shares to buy within risk limits"),
    field("Margin_Utilization_%", "Percentage of available margin the position uses"),
    field("Risk_per_Share", "Estimated loss per share at 95% confidence"),
    field("Fundamental_Strength", "Fundamental health score (0-1, 1 = strongest)"),
    field("Risk_Adjusted_Score", "Return net of risk penalties (higher is better)"),
    field("Risk_Adjusted_Rank", "Rank among peers by risk-adjusted score (1 = best)"),
];

/// Header row for delimited exports.
pub fn header() -> Vec<&'static str> {
    FIELDS.iter().map(|f| f.name).collect()
}

pub fn describe(name: &str) -> Option<&'static str> {
    FIELDS.iter().find(|f| f.name == name).map(|f| f.description)
}

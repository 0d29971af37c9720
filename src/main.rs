use analyzer::{AnalyticsDataset, DatasetSummary, FIELDS, FilterCriteria, IngressTable, LoadReport, fields};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use configuration::{BadRecordPolicy, Config, MarginModelKind, init_logging, load_config, load_config_from};
use core_types::{DerivedStockRecord, MarginSafety, Recommendation};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The main entry point for the Marginscope analytics application.
fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Load configuration, then apply command-line overrides on top of it
    let mut config = match &cli.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => load_config().context("Failed to load configuration")?,
    };
    if let Some(model) = cli.model {
        config.margin_model.kind = model;
    }
    if let Some(policy) = cli.policy {
        config.dataset.bad_record_policy = policy;
    }

    // The guard flushes the file log on drop, so it lives until main returns
    let _log_guard = init_logging(&config.logging).context("Failed to initialize logging")?;

    // Execute the appropriate command
    match cli.command {
        Commands::Rank(args) => handle_rank(&config, args),
        Commands::Lookup(args) => handle_lookup(&config, args),
        Commands::Summary(args) => handle_summary(&config, args),
        Commands::Describe(args) => handle_describe(args),
        Commands::Export(args) => handle_export(&config, args),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Margin-trading risk analytics over a per-stock observation snapshot.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file. Defaults to an optional `marginscope.toml` in the working directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured margin-risk model.
    #[arg(long, global = true, value_enum)]
    model: Option<MarginModelKind>,

    /// Overrides the configured handling of invalid rows.
    #[arg(long, global = true, value_enum)]
    policy: Option<BadRecordPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the ranked table, optionally filtered and searched.
    Rank(RankArgs),
    /// Show every field of a single stock.
    Lookup(LookupArgs),
    /// Show the headline metrics of the snapshot.
    Summary(SourceArgs),
    /// List the output fields and what they mean.
    Describe(DescribeArgs),
    /// Write the derived records, best rank first, to a CSV file.
    Export(ExportArgs),
}

#[derive(Args)]
struct SourceArgs {
    /// CSV snapshot with one observation per stock.
    #[arg(long, short)]
    input: PathBuf,
}

#[derive(Args)]
struct RankArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Keep only these safety levels (e.g. "safe,warning").
    #[arg(long, value_delimiter = ',')]
    safety: Option<Vec<MarginSafety>>,

    /// Keep only these recommendations (e.g. "buy-on-margin,hold").
    #[arg(long, value_delimiter = ',')]
    recommendation: Option<Vec<Recommendation>>,

    /// Inclusive rank range, as `LO:HI`.
    #[arg(long, value_parser = parse_range::<u32>)]
    rank_range: Option<(u32, u32)>,

    /// Inclusive price range, as `LO:HI`.
    #[arg(long, value_parser = parse_range::<Decimal>)]
    price_range: Option<(Decimal, Decimal)>,

    /// Case-insensitive symbol substring, applied after the filters.
    #[arg(long)]
    search: Option<String>,

    /// Show at most this many rows.
    #[arg(long)]
    top: Option<usize>,
}

#[derive(Args)]
struct LookupArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Exact ticker symbol, e.g. "INFY.NS".
    symbol: String,
}

#[derive(Args)]
struct DescribeArgs {
    /// A single field to explain, e.g. "Max_Shares". Lists every field when omitted.
    field: Option<String>,
}

#[derive(Args)]
struct ExportArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Destination CSV file.
    #[arg(long, short)]
    output: PathBuf,
}

fn parse_range<T>(raw: &str) -> Result<(T, T), String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let (lo, hi) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected LO:HI, got '{}'", raw))?;
    let lo = lo.trim().parse::<T>().map_err(|e| e.to_string())?;
    let hi = hi.trim().parse::<T>().map_err(|e| e.to_string())?;
    Ok((lo, hi))
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn handle_rank(config: &Config, args: RankArgs) -> Result<()> {
    let dataset = load_dataset(config, &args.source.input)?;

    let mut criteria = FilterCriteria::new();
    if let Some(levels) = args.safety {
        criteria = criteria.safety_in(levels);
    }
    if let Some(recommendations) = args.recommendation {
        criteria = criteria.recommendation_in(recommendations);
    }
    if let Some((lo, hi)) = args.rank_range {
        criteria = criteria.rank_range(lo, hi);
    }
    if let Some((lo, hi)) = args.price_range {
        criteria = criteria.price_range(lo, hi);
    }

    let mut rows = dataset.query(&criteria, args.search.as_deref());
    let matched = rows.len();
    if let Some(n) = args.top {
        rows.truncate(n);
    }

    println!("{}", ranked_table(&rows));
    println!("Showing {} of {} matching stocks ({} loaded).", rows.len(), matched, dataset.len());
    Ok(())
}

fn handle_lookup(config: &Config, args: LookupArgs) -> Result<()> {
    let dataset = load_dataset(config, &args.source.input)?;
    let record = dataset.lookup(&args.symbol)?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Field", "Value"]);
    for (field, value) in FIELDS.iter().zip(record_values(record)) {
        table.add_row(vec![Cell::new(field.name), Cell::new(value)]);
    }
    println!("{}", table);
    Ok(())
}

fn handle_summary(config: &Config, args: SourceArgs) -> Result<()> {
    let dataset = load_dataset(config, &args.input)?;
    let summary = dataset.summary()?;
    print_summary(&dataset, &summary);
    Ok(())
}

fn handle_describe(args: DescribeArgs) -> Result<()> {
    match args.field {
        Some(name) => {
            let description = fields::describe(&name).with_context(|| {
                format!("Unknown field '{}'; run `describe` to list them", name)
            })?;
            println!("{}: {}", name, description);
        }
        None => print_fields(),
    }
    Ok(())
}

fn handle_export(config: &Config, args: ExportArgs) -> Result<()> {
    let dataset = load_dataset(config, &args.source.input)?;

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    for record in dataset.ranked() {
        writer.serialize(record)?;
    }
    writer.flush()?;

    tracing::info!(path = %args.output.display(), records = dataset.len(), "Export written.");
    println!("Exported {} records to {}.", dataset.len(), args.output.display());
    Ok(())
}

// ==============================================================================
// Loading
// ==============================================================================

/// Reads the CSV snapshot and builds the ranked dataset from it.
fn load_dataset(config: &Config, input: &Path) -> Result<AnalyticsDataset> {
    let table = read_table(input)?;
    let mut dataset = AnalyticsDataset::from_config(config)?;
    let report = dataset
        .load_table(&table)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    report_rejections(&report);
    Ok(dataset)
}

fn read_table(path: &Path) -> Result<IngressTable> {
    // Ragged rows are passed through and rejected per row by the dataset.
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|row| row.map(|r| r.iter().map(str::to_string).collect()))
        .collect::<Result<Vec<Vec<String>>, _>>()
        .with_context(|| format!("Failed to read rows from {}", path.display()))?;

    Ok(IngressTable::new(headers, rows))
}

fn report_rejections(report: &LoadReport) {
    if report.rejected.is_empty() {
        return;
    }
    eprintln!("Skipped {} invalid row(s):", report.rejected.len());
    for rejected in &report.rejected {
        eprintln!("  row {}: {}", rejected.position + 1, rejected.reason);
    }
}

// ==============================================================================
// Rendering
// ==============================================================================

fn ranked_table(records: &[&DerivedStockRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Rank",
            "Symbol",
            "Price",
            "Safety",
            "Recommendation",
            "Return 5d",
            "Margin Call P",
            "VaR 95",
            "Max Position",
            "Max Shares",
            "Utilization %",
            "Score",
        ]);

    for record in records {
        table.add_row(vec![
            Cell::new(record.risk_adjusted_rank),
            Cell::new(&record.symbol),
            Cell::new(record.current_price.round_dp(2)),
            Cell::new(record.margin_safety).fg(safety_color(record.margin_safety)),
            Cell::new(record.recommendation),
            Cell::new(percent(record.predicted_return_5d)),
            Cell::new(record.margin_call_probability.round_dp(3)),
            Cell::new(percent(record.value_at_risk_95)),
            Cell::new(record.max_position_amount.round_dp(0)),
            Cell::new(record.max_shares),
            Cell::new(record.margin_utilization_pct.round_dp(1)),
            Cell::new(record.risk_adjusted_score.round_dp(5)),
        ]);
    }
    table
}

/// Every field as display text, in the same order as `FIELDS`.
fn record_values(record: &DerivedStockRecord) -> [String; 15] {
    [
        record.symbol.clone(),
        record.current_price.to_string(),
        record.margin_safety.to_string(),
        record.recommendation.to_string(),
        record.predicted_return_5d.to_string(),
        record.margin_call_probability.to_string(),
        record.value_at_risk_95.to_string(),
        record.volatility_20d.to_string(),
        record.max_position_amount.round_dp(2).to_string(),
        record.max_shares.to_string(),
        record.margin_utilization_pct.round_dp(2).to_string(),
        record.risk_per_share.to_string(),
        record.fundamental_strength.to_string(),
        record.risk_adjusted_score.to_string(),
        record.risk_adjusted_rank.to_string(),
    ]
}

fn print_summary(dataset: &AnalyticsDataset, summary: &DatasetSummary) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Metric", "Symbol", "Value"]);
    table.add_row(vec![
        "Best ranked".to_string(),
        summary.best_ranked.symbol.clone(),
        format!("#{}", summary.best_ranked.value),
    ]);
    table.add_row(vec![
        "Lowest risk per share".to_string(),
        summary.lowest_risk_per_share.symbol.clone(),
        summary.lowest_risk_per_share.value.round_dp(4).to_string(),
    ]);
    table.add_row(vec![
        "Highest predicted return".to_string(),
        summary.highest_predicted_return.symbol.clone(),
        percent(summary.highest_predicted_return.value),
    ]);
    println!("{}", table);

    let count = |level: MarginSafety| dataset.all().iter().filter(|r| r.margin_safety == level).count();
    println!(
        "{} stocks: {} safe, {} warning, {} danger.",
        dataset.len(),
        count(MarginSafety::Safe),
        count(MarginSafety::Warning),
        count(MarginSafety::Danger)
    );
}

fn print_fields() {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Field", "Description"]);
    for field in FIELDS.iter() {
        table.add_row(vec![field.name, field.description]);
    }
    println!("{}", table);
}

fn safety_color(level: MarginSafety) -> Color {
    match level {
        MarginSafety::Safe => Color::Green,
        MarginSafety::Warning => Color::Yellow,
        MarginSafety::Danger => Color::Red,
    }
}

fn percent(fraction: Decimal) -> String {
    match fraction.checked_mul(Decimal::ONE_HUNDRED) {
        Some(pct) => format!("{}%", pct.round_dp(2)),
        None => fraction.to_string(),
    }
}

//! Trendcast CLI: indicator and forecast commands.
//!
//! Commands:
//! - `indicators`: compute the indicator dashboard for a symbol and export CSV
//! - `forecast`: train a model on the history and project closes forward
//!
//! Price history is read from `{data_dir}/{SYMBOL}.csv`.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use trendcast_core::data::{forecast_to_csv, indicators_to_csv, CsvPriceSource, PriceSource};
use trendcast_core::{
    compute_indicators, predict_trend, Bar, EngineConfig, ForecastReport, IndicatorRow, Outlook,
};

#[derive(Parser)]
#[command(
    name = "trendcast",
    about = "Trendcast CLI: technical indicators and walk-forward price forecasts"
)]
struct Cli {
    /// Append logs to this file in addition to stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute MA/RSI/MACD/Bollinger/ATR for a symbol.
    Indicators {
        /// Symbol; reads {data_dir}/{SYMBOL}.csv.
        #[arg(long)]
        symbol: String,

        /// Directory holding price CSV files.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Start date (YYYY-MM-DD). Defaults to one year before --end.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Write CSV here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Forecast closing prices with a confidence band.
    Forecast {
        /// Symbol; reads {data_dir}/{SYMBOL}.csv.
        #[arg(long)]
        symbol: String,

        /// Directory holding price CSV files.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Start date (YYYY-MM-DD). Defaults to one year before --end.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Days to forecast.
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u16).range(7..=90))]
        horizon: u16,

        /// Engine config TOML ([forecast] and [model] tables).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the forecast CSV here.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the full report as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if let Some(path) = log_file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|err| anyhow!("failed to create log directory {parent:?}: {err}"))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| anyhow!("failed to open log file {path:?}: {err}"))?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file));
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(file_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing: {err}"))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Indicators {
            symbol,
            data_dir,
            start,
            end,
            output,
        } => run_indicators(&symbol, &data_dir, start, end, output),
        Commands::Forecast {
            symbol,
            data_dir,
            start,
            end,
            horizon,
            config,
            output,
            json,
        } => run_forecast(
            &symbol,
            &data_dir,
            start,
            end,
            usize::from(horizon),
            config,
            output,
            json,
        ),
    }
}

fn parse_range(start: Option<String>, end: Option<String>) -> Result<(NaiveDate, NaiveDate)> {
    let end_date = end
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("invalid --end date")?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let start_date = start
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("invalid --start date")?
        .unwrap_or_else(|| end_date - chrono::Duration::days(365));

    if start_date > end_date {
        anyhow::bail!("--start {start_date} is after --end {end_date}");
    }
    Ok((start_date, end_date))
}

fn load_rows(
    symbol: &str,
    data_dir: &Path,
    start: Option<String>,
    end: Option<String>,
) -> Result<(Vec<Bar>, Vec<IndicatorRow>)> {
    let (start_date, end_date) = parse_range(start, end)?;
    let source = CsvPriceSource::new(data_dir);
    let bars = source
        .fetch(symbol, start_date, end_date)
        .with_context(|| format!("failed to load prices for {symbol}"))?;
    info!(symbol, bars = bars.len(), %start_date, %end_date, "price history loaded");

    let rows = compute_indicators(&bars)
        .with_context(|| format!("no usable price history for {symbol} in {start_date}..={end_date}"))?;
    Ok((bars, rows))
}

fn write_or_print(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "written");
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn run_indicators(
    symbol: &str,
    data_dir: &Path,
    start: Option<String>,
    end: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let (_, rows) = load_rows(symbol, data_dir, start, end)?;
    let csv = indicators_to_csv(&rows)?;
    write_or_print(&csv, output.as_deref())
}

#[allow(clippy::too_many_arguments)]
fn run_forecast(
    symbol: &str,
    data_dir: &Path,
    start: Option<String>,
    end: Option<String>,
    horizon: usize,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let engine_config = match &config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let (bars, rows) = load_rows(symbol, data_dir, start, end)?;
    let report = predict_trend(&rows, horizon, &engine_config)
        .with_context(|| format!("forecast failed for {symbol}"))?;

    if let Some(path) = output.as_deref() {
        write_or_print(&forecast_to_csv(&report.forecast)?, Some(path))?;
    }

    if json {
        let text = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{text}");
    } else {
        let last_close = bars.last().map(|b| b.close).unwrap_or(f64::NAN);
        print_summary(symbol, last_close, &report);
    }
    Ok(())
}

fn print_summary(symbol: &str, last_close: f64, report: &ForecastReport) {
    let m = &report.metrics;
    println!("=== {symbol} forecast ({} days, {}) ===", report.forecast.len(), report.model);
    println!(
        "Direction accuracy: {:.2}%   Confidence: {:.2}%",
        report.direction_accuracy, report.confidence
    );
    println!(
        "Test split: {} train / {} test   MSE {:.4}  MAE {:.4}  R² {:.4}",
        m.train_rows, m.test_rows, m.mse, m.mae, m.r2
    );
    if let Some(pct) = report.projected_change_pct(last_close) {
        println!(
            "Outlook: {} ({pct:+.2}% from last close {last_close:.2})",
            Outlook::from_change_pct(pct).label()
        );
    }
    println!();
    println!("{:<12} {:>12} {:>12} {:>12}", "Date", "Predicted", "Lower", "Upper");
    for p in &report.forecast {
        println!(
            "{:<12} {:>12.2} {:>12.2} {:>12.2}",
            p.date.to_string(),
            p.predicted_close,
            p.lower_bound,
            p.upper_bound
        );
    }
}

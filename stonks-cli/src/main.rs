//! Stonks CLI: refresh chart data, search symbols, inspect reference tables.
//!
//! Commands:
//! - `refresh`: build the three charts for a ticker or company name
//! - `search`: list symbol candidates for a company name
//! - `industries`: print the industry reference table
//! - `watchlist`: print the configured watchlist and default window

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use stonks_core::domain::{COMPARISON_CHART_TITLE, RATIO_CHART_TITLE, TREND_CHART_TITLE};
use stonks_core::resolve::pick_candidate;
use stonks_core::{
    save_artifacts, ChartData, ChartPipeline, CsvProvider, DashboardConfig, IndustryReference,
    MarketDataProvider, RefreshError, SymbolResolver, YahooProvider,
};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "stonks.toml";

#[derive(Parser)]
#[command(name = "stonks", about = "Stonks: single-ticker stock chart data")]
struct Cli {
    /// Path to a TOML config file. Defaults to ./stonks.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh trend, comparison and industry ratio data.
    Refresh {
        /// Ticker symbol (e.g., KO). Defaults to the configured symbol.
        #[arg(long, conflicts_with = "company")]
        symbol: Option<String>,

        /// Company name to resolve (e.g., "Alphabet Inc.").
        #[arg(long)]
        company: Option<String>,

        /// Start date (YYYY-MM-DD). Defaults to the configured lookback.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD), inclusive. Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Read prices and fundamentals from a CSV dataset instead of Yahoo.
        #[arg(long)]
        offline_dir: Option<PathBuf>,

        /// Print the chart data as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Write CSV and JSON artifacts under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// List symbol candidates for a company name.
    Search {
        /// Company name words.
        #[arg(required = true)]
        name: Vec<String>,

        /// Search a CSV dataset instead of Yahoo.
        #[arg(long)]
        offline_dir: Option<PathBuf>,
    },
    /// Print the industry reference table.
    Industries,
    /// Print the configured watchlist and default window.
    Watchlist,
}

/// Market data backend chosen for one invocation.
enum Backend {
    Yahoo(YahooProvider),
    Offline(CsvProvider),
}

impl Backend {
    fn open(config: &DashboardConfig, offline_dir: Option<&Path>) -> Result<Self> {
        match offline_dir {
            Some(dir) => Ok(Backend::Offline(
                CsvProvider::from_dir(dir)
                    .with_context(|| format!("failed to load dataset {}", dir.display()))?,
            )),
            None => Ok(Backend::Yahoo(
                YahooProvider::new(&config.provider).context("failed to build HTTP client")?,
            )),
        }
    }

    fn provider(&self) -> &dyn MarketDataProvider {
        match self {
            Backend::Yahoo(p) => p,
            Backend::Offline(p) => p,
        }
    }

    fn resolver(&self) -> &dyn SymbolResolver {
        match self {
            Backend::Yahoo(p) => p,
            Backend::Offline(p) => p,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Refresh {
            symbol,
            company,
            start,
            end,
            offline_dir,
            json,
            output_dir,
        } => run_refresh(
            &config,
            symbol,
            company,
            start,
            end,
            offline_dir,
            json,
            output_dir,
        ),
        Commands::Search { name, offline_dir } => {
            run_search(&config, &name.join(" "), offline_dir.as_deref())
        }
        Commands::Industries => run_industries(&config),
        Commands::Watchlist => run_watchlist(&config),
    }
}

/// Human-readable logs on stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<DashboardConfig> {
    match path {
        Some(path) => DashboardConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            DashboardConfig::from_file(Path::new(DEFAULT_CONFIG_FILE))
                .with_context(|| format!("failed to load {DEFAULT_CONFIG_FILE}"))
        }
        None => Ok(DashboardConfig::stock()),
    }
}

/// Missing reference file leaves the industry rows empty rather than failing.
fn load_reference(config: &DashboardConfig) -> Result<IndustryReference> {
    let path = &config.reference.industry_csv;
    if !path.exists() {
        tracing::warn!(
            path = %path.display(),
            "industry reference not found; industry ratios will show no data"
        );
        return Ok(IndustryReference::default());
    }
    IndustryReference::from_file(path)
        .with_context(|| format!("failed to load industry reference {}", path.display()))
}

fn parse_date(raw: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("--{flag} must be YYYY-MM-DD, got '{raw}'"))
}

fn resolve_window(
    config: &DashboardConfig,
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    let (default_start, default_end) = config.default_range(today);
    let end = end
        .map(|s| parse_date(s, "end"))
        .transpose()?
        .unwrap_or(default_end);
    let start = start
        .map(|s| parse_date(s, "start"))
        .transpose()?
        .unwrap_or(default_start);
    Ok((start, end))
}

#[allow(clippy::too_many_arguments)]
fn run_refresh(
    config: &DashboardConfig,
    symbol: Option<String>,
    company: Option<String>,
    start: Option<String>,
    end: Option<String>,
    offline_dir: Option<PathBuf>,
    json: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let (start, end) = resolve_window(config, start.as_deref(), end.as_deref(), today)?;

    let backend = Backend::open(config, offline_dir.as_deref())?;
    let reference = load_reference(config)?;
    let pipeline = ChartPipeline::from_config(config, backend.provider(), &reference);

    let result = match (&symbol, &company) {
        (_, Some(name)) => pipeline.refresh_company(name, start, end, backend.resolver()),
        (Some(ticker), None) => pipeline.refresh(ticker, start, end),
        (None, None) => pipeline.refresh(&config.dashboard.default_symbol, start, end),
    };

    let chart = match result {
        Ok(chart) => chart,
        Err(RefreshError::NoMatch { query }) => bail!("symbol not found: '{query}'"),
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&chart)?);
    } else {
        print_chart(&chart, pipeline.provider_name());
    }

    if let Some(dir) = output_dir {
        let paths = save_artifacts(&chart, &dir)?;
        println!("Artifacts saved to: {}", paths.dir.display());
    }

    Ok(())
}

fn print_chart(chart: &ChartData, provider: &str) {
    println!(
        "{} ({})  {} to {}  [{}]",
        chart.label(),
        chart.symbol,
        chart.start,
        chart.end,
        provider
    );
    println!();

    println!("{TREND_CHART_TITLE}");
    let closes: Vec<f64> = chart.trend.points.iter().map(|p| p.close).collect();
    match (chart.trend.first_date(), chart.trend.last_date()) {
        (Some(first), Some(last)) => {
            let min = closes.iter().copied().fold(f64::INFINITY, f64::min);
            let max = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            println!(
                "  {} closes, {first} to {last}, low {min:.2}, high {max:.2}",
                chart.trend.len()
            );
            for p in chart.trend.points.iter().rev().take(5).rev() {
                println!("  {}  {:>10.2}", p.date, p.close);
            }
        }
        _ => println!("  no closes in window"),
    }
    println!();

    println!("{COMPARISON_CHART_TITLE}");
    for row in &chart.comparison {
        println!("  {:<26} {:>10}", row.metric, row.value.to_string());
    }
    println!();

    let industry = chart
        .ratios
        .first()
        .map(|r| r.industry_label())
        .unwrap_or(stonks_core::domain::NO_DATA);
    println!("{RATIO_CHART_TITLE} ({industry})");
    for row in &chart.ratios {
        println!("  {:<26} {:>10}", row.metric, row.value.to_string());
    }
}

fn run_search(config: &DashboardConfig, name: &str, offline_dir: Option<&Path>) -> Result<()> {
    let names = stonks_core::NameResolver::new(&config.aliases);
    if let Some(symbol) = names.alias(name) {
        println!("{symbol}  (alias)");
        return Ok(());
    }

    let backend = Backend::open(config, offline_dir)?;
    let candidates = backend.resolver().search(name.trim())?;
    if candidates.is_empty() {
        bail!("symbol not found: '{name}'");
    }

    let chosen = pick_candidate(candidates.clone()).map(|m| m.symbol);
    println!("{:<3} {:<12} NAME", "", "SYMBOL");
    for m in &candidates {
        let marker = if chosen.as_deref() == Some(m.symbol.as_str()) {
            "*"
        } else {
            ""
        };
        println!("{marker:<3} {:<12} {}", m.symbol, m.display_name);
    }
    Ok(())
}

fn run_industries(config: &DashboardConfig) -> Result<()> {
    let reference = load_reference(config)?;
    if reference.is_empty() {
        println!("No industries loaded.");
        return Ok(());
    }
    println!("{:<40} {:>10} {:>10}", "INDUSTRY", "P/E", "P/S");
    for row in reference.iter() {
        let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"));
        println!(
            "{:<40} {:>10} {:>10}",
            row.industry,
            fmt(row.trailing_pe),
            fmt(row.trailing_ps)
        );
    }
    Ok(())
}

fn run_watchlist(config: &DashboardConfig) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let (start, end) = config.default_range(today);
    println!("Default symbol: {}", config.dashboard.default_symbol);
    println!("Default window: {start} to {end}");
    println!("Earliest start: {}", config.dashboard.min_start_date);
    println!("Watchlist:");
    for symbol in &config.dashboard.watchlist {
        let marker = if *symbol == config.dashboard.default_symbol {
            "*"
        } else {
            " "
        };
        println!("  {marker} {symbol}");
    }
    Ok(())
}

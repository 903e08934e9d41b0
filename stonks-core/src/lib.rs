//! Stonks Core: chart projections for a single-ticker stock dashboard.
//!
//! This crate turns a (symbol or company name, date range) request into the
//! data behind three charts:
//! - Trended daily closing price over the window
//! - Previous close against the 50- and 200-day averages
//! - Trailing P/E and P/S against the company's industry
//!
//! Market data comes through the `MarketDataProvider` and `SymbolResolver`
//! traits (Yahoo Finance or an offline CSV dataset). Missing values surface
//! as "no data" entries, never as errors.

pub mod config;
pub mod data;
pub mod domain;
pub mod export;
pub mod pipeline;
pub mod projection;
pub mod resolve;

pub use config::{ConfigError, DashboardConfig};
pub use data::{
    CsvProvider, DataError, IndustryReference, MarketDataProvider, SymbolMatch, SymbolResolver,
    YahooProvider,
};
pub use domain::{ChartData, FundamentalsSnapshot, MetricValue, PricePoint, PriceSeries};
pub use export::{save_artifacts, ArtifactPaths, ExportError};
pub use pipeline::{ChartPipeline, RefreshError};
pub use resolve::{NameResolver, ResolveError, ResolvedSymbol};

//! Chart pipeline: one refresh from (symbol, date range) to `ChartData`.
//!
//! A refresh validates its input, pulls daily closes for the window, then
//! fetches the fundamentals snapshot once and feeds it to both the
//! comparison and the industry ratio projections. Any provider failure
//! aborts the whole refresh; there is no partial `ChartData`.

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::DashboardConfig;
use crate::data::{DataError, IndustryReference, MarketDataProvider, SymbolResolver};
use crate::domain::{ChartData, FundamentalField};
use crate::projection::{project_comparison, project_ratios, project_trend, request_until};
use crate::resolve::{normalize_ticker, NameResolver, ResolveError};

/// Errors from a chart refresh.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("symbol not found for '{query}'")]
    NoMatch { query: String },

    #[error("upstream data unavailable: {0}")]
    Upstream(#[from] DataError),

    #[error("invalid date range {start}..{end}: {reason}")]
    InvalidRange {
        start: NaiveDate,
        end: NaiveDate,
        reason: String,
    },

    #[error("invalid symbol '{0}'")]
    InvalidSymbol(String),
}

impl From<ResolveError> for RefreshError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NoMatch { query } => RefreshError::NoMatch { query },
            ResolveError::Upstream(e) => RefreshError::Upstream(e),
        }
    }
}

/// Earliest start date accepted when no config overrides it.
pub fn default_min_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2001, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Composes the provider, reference table and projections.
pub struct ChartPipeline<'a> {
    provider: &'a dyn MarketDataProvider,
    industries: &'a IndustryReference,
    names: NameResolver,
    min_start_date: NaiveDate,
}

impl<'a> ChartPipeline<'a> {
    /// Pipeline with the built-in aliases and minimum start date.
    pub fn new(provider: &'a dyn MarketDataProvider, industries: &'a IndustryReference) -> Self {
        Self {
            provider,
            industries,
            names: NameResolver::new(&crate::config::default_aliases()),
            min_start_date: default_min_start_date(),
        }
    }

    /// Pipeline using the config's alias table and date floor.
    pub fn from_config(
        config: &DashboardConfig,
        provider: &'a dyn MarketDataProvider,
        industries: &'a IndustryReference,
    ) -> Self {
        Self {
            provider,
            industries,
            names: NameResolver::new(&config.aliases),
            min_start_date: config.dashboard.min_start_date,
        }
    }

    pub fn with_min_start_date(mut self, min_start_date: NaiveDate) -> Self {
        self.min_start_date = min_start_date;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn validate_range(&self, start: NaiveDate, end: NaiveDate) -> Result<(), RefreshError> {
        if start > end {
            return Err(RefreshError::InvalidRange {
                start,
                end,
                reason: "start is after end".into(),
            });
        }
        if start < self.min_start_date {
            return Err(RefreshError::InvalidRange {
                start,
                end,
                reason: format!("start precedes {}", self.min_start_date),
            });
        }
        Ok(())
    }

    /// Refresh all three charts for a ticker over [start, end].
    pub fn refresh(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ChartData, RefreshError> {
        let symbol =
            normalize_ticker(symbol).ok_or_else(|| RefreshError::InvalidSymbol(symbol.into()))?;
        self.validate_range(start, end)?;

        let span = tracing::info_span!("refresh", symbol = %symbol, %start, %end);
        let _guard = span.enter();

        let raw = self
            .provider
            .daily_closes(&symbol, start, request_until(end))
            .map_err(|e| {
                tracing::warn!(error = %e, "price fetch failed");
                e
            })?;
        let trend = project_trend(&symbol, start, end, raw);

        let snapshot = self.provider.fundamentals(&symbol).map_err(|e| {
            tracing::warn!(error = %e, "fundamentals fetch failed");
            e
        })?;
        let comparison = project_comparison(&symbol, &snapshot);
        let ratios = project_ratios(&symbol, &snapshot, self.industries);

        tracing::info!(
            closes = trend.len(),
            fields = snapshot.present_count(),
            provider = self.provider.name(),
            "refresh complete"
        );

        Ok(ChartData {
            display_name: snapshot
                .text(FundamentalField::DisplayName)
                .map(str::to_string),
            symbol,
            start,
            end,
            trend,
            comparison,
            ratios,
        })
    }

    /// Resolve a company name, then refresh the resolved ticker.
    ///
    /// Resolution failures stop before any price or fundamentals fetch.
    pub fn refresh_company(
        &self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
        resolver: &dyn SymbolResolver,
    ) -> Result<ChartData, RefreshError> {
        self.validate_range(start, end)?;
        let resolved = self.names.resolve(name, resolver)?;
        let mut chart = self.refresh(&resolved.symbol, start, end)?;
        if chart.display_name.is_none() {
            chart.display_name = resolved.display_name;
        }
        Ok(chart)
    }
}

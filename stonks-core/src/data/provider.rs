//! Provider traits and structured error types.
//!
//! `MarketDataProvider` and `SymbolResolver` abstract over data sources
//! (Yahoo Finance, offline CSV tables) so the pipeline can be driven by a
//! live service, a static dataset, or a test double.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{FundamentalsSnapshot, PricePoint};

/// Structured error types for provider calls.
///
/// These are designed to be displayable in CLI output as-is.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("HTTP {status} from provider for {symbol}")]
    HttpStatus { status: u16, symbol: String },

    #[error("offline dataset error: {0}")]
    Dataset(String),

    #[error("data error: {0}")]
    Other(String),
}

/// One candidate returned by a symbol search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub display_name: String,
}

impl SymbolMatch {
    pub fn new(symbol: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            display_name: display_name.into(),
        }
    }

    /// Share-class listings (`BRK.B`, `RDS.A`) carry a literal period.
    pub fn is_share_class(&self) -> bool {
        self.symbol.contains('.')
    }
}

/// Trait for market data providers.
///
/// Calls are blocking. Implementations own their transport concerns
/// (sessions, timeouts, transport retries); callers never retry.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Daily closes for `symbol` from `start` (inclusive) up to `until` (exclusive).
    fn daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError>;

    /// Current fundamentals snapshot. Missing fields are `None`, never an error.
    fn fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot, DataError>;
}

/// Trait for free-text symbol lookup.
pub trait SymbolResolver: Send + Sync {
    /// Candidates ordered by provider relevance. May be empty.
    fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, DataError>;
}

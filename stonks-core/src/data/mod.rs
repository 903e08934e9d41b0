//! Data sources: providers, symbol search and the industry reference table

pub mod csv_source;
pub mod industry;
pub mod provider;
pub mod yahoo;

pub use csv_source::CsvProvider;
pub use industry::{IndustryRatios, IndustryReference, ReferenceError};
pub use provider::{DataError, MarketDataProvider, SymbolMatch, SymbolResolver};
pub use yahoo::YahooProvider;

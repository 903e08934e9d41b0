//! Offline provider backed by static CSV tables.
//!
//! Two files make up a dataset:
//! - `trended_prices.csv`: wide table with a `Date` column plus one close
//!   column per ticker. Empty cells are days the ticker did not trade.
//! - `compared_prices.csv`: long table `ticker,Type,Value` where `Type` is
//!   a fundamental field key (`previous_close`, `industry`, ...).
//!
//! The whole dataset is loaded once at construction.

use super::provider::{DataError, MarketDataProvider, SymbolMatch, SymbolResolver};
use crate::domain::{FundamentalField, FundamentalsSnapshot, PricePoint};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

pub const PRICES_FILE: &str = "trended_prices.csv";
pub const FUNDAMENTALS_FILE: &str = "compared_prices.csv";

/// In-memory offline dataset.
#[derive(Debug, Clone, Default)]
pub struct CsvProvider {
    prices: BTreeMap<String, Vec<PricePoint>>,
    fundamentals: BTreeMap<String, FundamentalsSnapshot>,
}

impl CsvProvider {
    /// Load `trended_prices.csv` and `compared_prices.csv` from a directory.
    pub fn from_dir(dir: &Path) -> Result<Self, DataError> {
        let prices = std::fs::File::open(dir.join(PRICES_FILE)).map_err(|e| {
            DataError::Dataset(format!("open {}: {e}", dir.join(PRICES_FILE).display()))
        })?;
        let fundamentals = std::fs::File::open(dir.join(FUNDAMENTALS_FILE)).map_err(|e| {
            DataError::Dataset(format!(
                "open {}: {e}",
                dir.join(FUNDAMENTALS_FILE).display()
            ))
        })?;
        Self::from_readers(prices, fundamentals)
    }

    pub fn from_readers(prices: impl Read, fundamentals: impl Read) -> Result<Self, DataError> {
        Ok(Self {
            prices: parse_wide_prices(prices)?,
            fundamentals: parse_long_fundamentals(fundamentals)?,
        })
    }

    /// Tickers that have a price column.
    pub fn tickers(&self) -> Vec<&str> {
        self.prices.keys().map(|s| s.as_str()).collect()
    }
}

fn parse_wide_prices(reader: impl Read) -> Result<BTreeMap<String, Vec<PricePoint>>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr
        .headers()
        .map_err(|e| DataError::Dataset(format!("price header: {e}")))?
        .clone();

    let date_col = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("date"))
        .ok_or_else(|| DataError::Dataset("price table has no Date column".into()))?;

    let mut prices: BTreeMap<String, Vec<PricePoint>> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != date_col)
        .map(|(_, h)| (h.to_uppercase(), Vec::new()))
        .collect();

    for (line, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| DataError::Dataset(format!("price row {line}: {e}")))?;
        let raw_date = record.get(date_col).unwrap_or_default();
        // Accept both `2021-03-01` and `2021-03-01 00:00:00` style dates.
        let date_part = raw_date.split_whitespace().next().unwrap_or_default();
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| {
            DataError::Dataset(format!("price row {line}: bad date '{raw_date}': {e}"))
        })?;

        for (i, cell) in record.iter().enumerate() {
            if i == date_col || cell.is_empty() {
                continue;
            }
            let Some(ticker) = headers.get(i).map(str::to_uppercase) else {
                continue;
            };
            let close: f64 = cell.parse().map_err(|e| {
                DataError::Dataset(format!("price row {line}, {ticker}: '{cell}': {e}"))
            })?;
            if let Some(series) = prices.get_mut(&ticker) {
                series.push(PricePoint::new(date, close));
            }
        }
    }

    for series in prices.values_mut() {
        series.sort_by_key(|p| p.date);
    }
    Ok(prices)
}

fn parse_long_fundamentals(
    reader: impl Read,
) -> Result<BTreeMap<String, FundamentalsSnapshot>, DataError> {
    #[derive(serde::Deserialize)]
    struct Row {
        ticker: String,
        #[serde(rename = "Type")]
        kind: String,
        #[serde(rename = "Value")]
        value: String,
    }

    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut out: BTreeMap<String, FundamentalsSnapshot> = BTreeMap::new();

    for (line, row) in rdr.deserialize::<Row>().enumerate() {
        let row = row.map_err(|e| DataError::Dataset(format!("fundamentals row {line}: {e}")))?;
        let ticker = row.ticker.to_uppercase();
        let snapshot = out
            .entry(ticker.clone())
            .or_insert_with(|| FundamentalsSnapshot::empty(ticker.clone()));

        let Some(field) = FundamentalField::from_key(&row.kind) else {
            tracing::debug!(%ticker, kind = %row.kind, "ignoring unknown fundamentals field");
            continue;
        };
        if row.value.is_empty() {
            continue;
        }

        match field {
            FundamentalField::Industry => snapshot.industry = Some(row.value),
            FundamentalField::DisplayName => snapshot.display_name = Some(row.value),
            numeric => {
                let value: f64 = row.value.parse().map_err(|e| {
                    DataError::Dataset(format!(
                        "fundamentals row {line}, {ticker} {numeric}: '{}': {e}",
                        row.value
                    ))
                })?;
                snapshot.set_number(numeric, value);
            }
        }
    }

    Ok(out)
}

impl MarketDataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError> {
        let series = self
            .prices
            .get(&symbol.to_uppercase())
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })?;
        Ok(series
            .iter()
            .filter(|p| p.date >= start && p.date < until)
            .copied()
            .collect())
    }

    fn fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot, DataError> {
        let key = symbol.to_uppercase();
        if let Some(snapshot) = self.fundamentals.get(&key) {
            return Ok(snapshot.clone());
        }
        // A ticker with prices but no fundamentals rows has an empty snapshot.
        if self.prices.contains_key(&key) {
            return Ok(FundamentalsSnapshot::empty(key));
        }
        Err(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })
    }
}

impl SymbolResolver for CsvProvider {
    fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, DataError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .fundamentals
            .values()
            .filter_map(|snap| {
                let name = snap.display_name.as_deref()?;
                let hit = name.to_lowercase().contains(&needle)
                    || snap.symbol.eq_ignore_ascii_case(&needle);
                hit.then(|| SymbolMatch::new(snap.symbol.clone(), name))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICES: &str = "\
Date,KO,GOOG
2023-01-03,62.8,89.1
2023-01-04,63.1,88.2
2023-01-05,,86.2
";

    const FUNDAMENTALS: &str = "\
ticker,Type,Value
KO,previous_close,63.1
KO,fifty_day_average,62.4
KO,industry,Beverages - Non-Alcoholic
KO,display_name,The Coca-Cola Company
KO,market_cap,270000000000
GOOG,trailing_pe,
";

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn provider() -> CsvProvider {
        CsvProvider::from_readers(PRICES.as_bytes(), FUNDAMENTALS.as_bytes()).unwrap()
    }

    #[test]
    fn wide_table_skips_empty_cells() {
        let p = provider();
        assert_eq!(p.tickers(), vec!["GOOG", "KO"]);
        let ko = p.daily_closes("ko", d(2023, 1, 1), d(2023, 1, 10)).unwrap();
        assert_eq!(ko.len(), 2);
        let goog = p.daily_closes("GOOG", d(2023, 1, 1), d(2023, 1, 10)).unwrap();
        assert_eq!(goog.len(), 3);
    }

    #[test]
    fn until_is_exclusive() {
        let p = provider();
        let goog = p.daily_closes("GOOG", d(2023, 1, 3), d(2023, 1, 5)).unwrap();
        assert_eq!(goog.last().unwrap().date, d(2023, 1, 4));
    }

    #[test]
    fn long_table_builds_snapshots_and_ignores_unknown_types() {
        let p = provider();
        let ko = p.fundamentals("KO").unwrap();
        assert_eq!(ko.previous_close, Some(63.1));
        assert_eq!(ko.fifty_day_average, Some(62.4));
        assert_eq!(ko.two_hundred_day_average, None);
        assert_eq!(ko.industry.as_deref(), Some("Beverages - Non-Alcoholic"));

        let goog = p.fundamentals("GOOG").unwrap();
        assert_eq!(goog.trailing_pe, None);
    }

    #[test]
    fn unknown_symbol_is_not_found() {
        let p = provider();
        assert!(matches!(
            p.daily_closes("MSFT", d(2023, 1, 1), d(2023, 1, 2)),
            Err(DataError::SymbolNotFound { .. })
        ));
        assert!(matches!(
            p.fundamentals("MSFT"),
            Err(DataError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn search_matches_display_names() {
        let p = provider();
        let hits = p.search("coca-cola").unwrap();
        assert_eq!(hits, vec![SymbolMatch::new("KO", "The Coca-Cola Company")]);
        assert!(p.search("nothing like this").unwrap().is_empty());
    }

    #[test]
    fn bad_date_is_a_dataset_error() {
        let err = CsvProvider::from_readers("Date,KO\nyesterday,1.0\n".as_bytes(), "ticker,Type,Value\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, DataError::Dataset(_)));
    }
}

//! Price series: the trend chart's data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily close as reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }

    /// A close is usable when it is finite and non-negative.
    pub fn is_valid(&self) -> bool {
        self.close.is_finite() && self.close >= 0.0
    }
}

/// Daily closes for one symbol, strictly ascending by date.
///
/// Non-trading days are absent; nothing is interpolated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Self {
        Self {
            symbol: symbol.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }

    /// Close on an exact calendar date, if the provider reported one.
    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].close)
    }

    /// True when dates are strictly ascending.
    pub fn is_strictly_ascending(&self) -> bool {
        self.points.windows(2).all(|w| w[0].date < w[1].date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn negative_and_nan_closes_are_invalid() {
        assert!(PricePoint::new(d(2023, 1, 3), 10.0).is_valid());
        assert!(PricePoint::new(d(2023, 1, 3), 0.0).is_valid());
        assert!(!PricePoint::new(d(2023, 1, 3), -1.0).is_valid());
        assert!(!PricePoint::new(d(2023, 1, 3), f64::NAN).is_valid());
        assert!(!PricePoint::new(d(2023, 1, 3), f64::INFINITY).is_valid());
    }

    #[test]
    fn close_on_finds_exact_date() {
        let series = PriceSeries::new(
            "KO",
            vec![
                PricePoint::new(d(2023, 1, 3), 63.5),
                PricePoint::new(d(2023, 1, 4), 63.9),
            ],
        );
        assert_eq!(series.close_on(d(2023, 1, 4)), Some(63.9));
        assert_eq!(series.close_on(d(2023, 1, 7)), None);
        assert!(series.is_strictly_ascending());
    }
}

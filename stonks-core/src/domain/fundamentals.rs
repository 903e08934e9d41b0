//! Fundamentals snapshot returned by a provider.
//!
//! Every field is optional: providers routinely omit moving averages for
//! new listings, ratios for unprofitable companies, and industry for ETFs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of fundamental fields the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundamentalField {
    PreviousClose,
    FiftyDayAverage,
    TwoHundredDayAverage,
    TrailingPe,
    TrailingPs,
    Industry,
    DisplayName,
}

impl FundamentalField {
    pub const ALL: [FundamentalField; 7] = [
        FundamentalField::PreviousClose,
        FundamentalField::FiftyDayAverage,
        FundamentalField::TwoHundredDayAverage,
        FundamentalField::TrailingPe,
        FundamentalField::TrailingPs,
        FundamentalField::Industry,
        FundamentalField::DisplayName,
    ];

    /// Column name used in long-form tables and CSV files.
    pub fn key(&self) -> &'static str {
        match self {
            FundamentalField::PreviousClose => "previous_close",
            FundamentalField::FiftyDayAverage => "fifty_day_average",
            FundamentalField::TwoHundredDayAverage => "two_hundred_day_average",
            FundamentalField::TrailingPe => "trailing_pe",
            FundamentalField::TrailingPs => "trailing_ps",
            FundamentalField::Industry => "industry",
            FundamentalField::DisplayName => "display_name",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(
            self,
            FundamentalField::Industry | FundamentalField::DisplayName
        )
    }
}

impl fmt::Display for FundamentalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A present field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Number(f64),
    Text(&'a str),
}

/// Snapshot of fundamental fields for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsSnapshot {
    pub symbol: String,
    pub previous_close: Option<f64>,
    pub fifty_day_average: Option<f64>,
    pub two_hundred_day_average: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub trailing_ps: Option<f64>,
    pub industry: Option<String>,
    pub display_name: Option<String>,
}

impl FundamentalsSnapshot {
    /// An empty snapshot: every field absent.
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Numeric field lookup. Text fields always return `None`.
    pub fn number(&self, field: FundamentalField) -> Option<f64> {
        let value = match field {
            FundamentalField::PreviousClose => self.previous_close,
            FundamentalField::FiftyDayAverage => self.fifty_day_average,
            FundamentalField::TwoHundredDayAverage => self.two_hundred_day_average,
            FundamentalField::TrailingPe => self.trailing_pe,
            FundamentalField::TrailingPs => self.trailing_ps,
            FundamentalField::Industry | FundamentalField::DisplayName => None,
        };
        value.filter(|v| v.is_finite())
    }

    /// Text field lookup. Blank strings count as absent.
    pub fn text(&self, field: FundamentalField) -> Option<&str> {
        let value = match field {
            FundamentalField::Industry => self.industry.as_deref(),
            FundamentalField::DisplayName => self.display_name.as_deref(),
            _ => None,
        };
        value.map(str::trim).filter(|s| !s.is_empty())
    }

    /// Generic lookup over the fixed field set.
    pub fn get(&self, field: FundamentalField) -> Option<FieldValue<'_>> {
        if field.is_numeric() {
            self.number(field).map(FieldValue::Number)
        } else {
            self.text(field).map(FieldValue::Text)
        }
    }

    /// Set a numeric field by key. Returns false for unknown or text keys.
    pub fn set_number(&mut self, field: FundamentalField, value: f64) -> bool {
        let slot = match field {
            FundamentalField::PreviousClose => &mut self.previous_close,
            FundamentalField::FiftyDayAverage => &mut self.fifty_day_average,
            FundamentalField::TwoHundredDayAverage => &mut self.two_hundred_day_average,
            FundamentalField::TrailingPe => &mut self.trailing_pe,
            FundamentalField::TrailingPs => &mut self.trailing_ps,
            FundamentalField::Industry | FundamentalField::DisplayName => return false,
        };
        *slot = Some(value);
        true
    }

    /// Number of fields present.
    pub fn present_count(&self) -> usize {
        FundamentalField::ALL
            .iter()
            .filter(|f| self.get(**f).is_some())
            .count()
    }
}

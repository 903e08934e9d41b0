//! Chart-ready long-form rows and the refresh result.

use chrono::NaiveDate;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::price::PriceSeries;

/// Placeholder rendered wherever a value is unavailable.
pub const NO_DATA: &str = "no data";

pub const TREND_CHART_TITLE: &str = "Trended Stock Price";
pub const COMPARISON_CHART_TITLE: &str = "Interday Comparisons";
pub const RATIO_CHART_TITLE: &str = "Industry Ratio Comparison";

/// A numeric chart value or the "no data" sentinel.
///
/// Serializes as a JSON number, or as the string `"no data"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Value(f64),
    NoData,
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Value(v) => Some(*v),
            MetricValue::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, MetricValue::NoData)
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => MetricValue::Value(v),
            _ => MetricValue::NoData,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Value(v) => write!(f, "{v:.2}"),
            MetricValue::NoData => f.write_str(NO_DATA),
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Value(v) => serializer.serialize_f64(*v),
            MetricValue::NoData => serializer.serialize_str(NO_DATA),
        }
    }
}

impl<'de> Deserialize<'de> for MetricValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(v) => Ok(MetricValue::Value(v)),
            Raw::Text(s) if s == NO_DATA => Ok(MetricValue::NoData),
            Raw::Text(s) => Err(de::Error::custom(format!(
                "expected a number or \"{NO_DATA}\", got \"{s}\""
            ))),
        }
    }
}

/// One bar of the price comparison chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub ticker: String,
    pub metric: String,
    pub value: MetricValue,
}

/// One bar of the industry ratio chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioRow {
    pub ticker: String,
    pub industry: Option<String>,
    pub metric: String,
    pub value: MetricValue,
}

impl RatioRow {
    pub fn industry_label(&self) -> &str {
        self.industry.as_deref().unwrap_or(NO_DATA)
    }
}

/// Everything the presentation layer needs for one refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub symbol: String,
    pub display_name: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub trend: PriceSeries,
    pub comparison: Vec<ComparisonRow>,
    pub ratios: Vec<RatioRow>,
}

impl ChartData {
    /// Display name when known, otherwise the ticker.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.symbol)
    }
}

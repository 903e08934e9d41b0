//! Domain types for the chart pipeline

pub mod chart;
pub mod fundamentals;
pub mod price;

pub use chart::{
    ChartData, ComparisonRow, MetricValue, RatioRow, COMPARISON_CHART_TITLE, NO_DATA,
    RATIO_CHART_TITLE, TREND_CHART_TITLE,
};
pub use fundamentals::{FieldValue, FundamentalField, FundamentalsSnapshot};
pub use price::{PricePoint, PriceSeries};

//! Pure projections from provider data to chart-ready rows.
//!
//! None of these functions perform I/O; the pipeline fetches once and hands
//! the results in.

pub mod comparison;
pub mod ratios;
pub mod trend;

pub use comparison::{project_comparison, COMPARISON_FIELDS};
pub use ratios::{project_ratios, RatioMetric};
pub use trend::{project_trend, request_until};

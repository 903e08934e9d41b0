//! Industry ratio projection: own P/E and P/S against industry reference.
//!
//! Each of the four values is an independent optional lookup. An absent
//! industry, an industry missing from the reference table, or an absent
//! ratio all degrade to "no data" for that row alone; nothing here fails.

use crate::data::{IndustryRatios, IndustryReference};
use crate::domain::{FundamentalField, FundamentalsSnapshot, MetricValue, RatioRow};

/// The four bars of the ratio chart, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioMetric {
    Pe,
    IndustryPe,
    Ps,
    IndustryPs,
}

impl RatioMetric {
    pub const ORDER: [RatioMetric; 4] = [
        RatioMetric::Pe,
        RatioMetric::IndustryPe,
        RatioMetric::Ps,
        RatioMetric::IndustryPs,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RatioMetric::Pe => "P/E",
            RatioMetric::IndustryPe => "Industry P/E",
            RatioMetric::Ps => "P/S",
            RatioMetric::IndustryPs => "Industry P/S",
        }
    }

    fn value(
        &self,
        snapshot: &FundamentalsSnapshot,
        reference: Option<&IndustryRatios>,
    ) -> Option<f64> {
        match self {
            RatioMetric::Pe => snapshot.number(FundamentalField::TrailingPe),
            RatioMetric::Ps => snapshot.number(FundamentalField::TrailingPs),
            RatioMetric::IndustryPe => reference.and_then(|r| r.trailing_pe),
            RatioMetric::IndustryPs => reference.and_then(|r| r.trailing_ps),
        }
    }
}

/// Exactly four rows in `RatioMetric::ORDER`.
pub fn project_ratios(
    ticker: &str,
    snapshot: &FundamentalsSnapshot,
    industries: &IndustryReference,
) -> Vec<RatioRow> {
    let industry = snapshot.text(FundamentalField::Industry);
    let reference = industry.and_then(|name| industries.get(name));

    if let (Some(name), None) = (industry, reference) {
        tracing::debug!(ticker, industry = name, "industry missing from reference table");
    }

    RatioMetric::ORDER
        .iter()
        .map(|metric| RatioRow {
            ticker: ticker.to_string(),
            industry: industry.map(str::to_string),
            metric: metric.label().to_string(),
            value: MetricValue::from(metric.value(snapshot, reference)),
        })
        .collect()
}

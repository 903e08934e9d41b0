//! Fundamentals comparison: one bar per price reference, melted long-form.

use crate::domain::{ComparisonRow, FundamentalField, FundamentalsSnapshot, MetricValue};

/// Fixed bar order of the comparison chart.
pub const COMPARISON_FIELDS: [FundamentalField; 3] = [
    FundamentalField::PreviousClose,
    FundamentalField::FiftyDayAverage,
    FundamentalField::TwoHundredDayAverage,
];

/// Exactly three rows, in `COMPARISON_FIELDS` order. Missing fields keep
/// their slot with a "no data" value so the category axis never shifts.
pub fn project_comparison(ticker: &str, snapshot: &FundamentalsSnapshot) -> Vec<ComparisonRow> {
    COMPARISON_FIELDS
        .iter()
        .map(|field| ComparisonRow {
            ticker: ticker.to_string(),
            metric: field.key().to_string(),
            value: MetricValue::from(snapshot.number(*field)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_snapshot_yields_three_values_in_order() {
        let snap = FundamentalsSnapshot {
            symbol: "KO".into(),
            previous_close: Some(61.9),
            fifty_day_average: Some(62.3),
            two_hundred_day_average: Some(60.8),
            ..Default::default()
        };
        let rows = project_comparison("KO", &snap);
        let metrics: Vec<&str> = rows.iter().map(|r| r.metric.as_str()).collect();
        assert_eq!(
            metrics,
            vec!["previous_close", "fifty_day_average", "two_hundred_day_average"]
        );
        assert_eq!(rows[0].value, MetricValue::Value(61.9));
        assert_eq!(rows[2].value, MetricValue::Value(60.8));
        assert!(rows.iter().all(|r| r.ticker == "KO"));
    }

    #[test]
    fn missing_fields_keep_their_slot() {
        let snap = FundamentalsSnapshot {
            symbol: "SNAP".into(),
            fifty_day_average: Some(10.2),
            ..Default::default()
        };
        let rows = project_comparison("SNAP", &snap);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].value, MetricValue::NoData);
        assert_eq!(rows[1].value, MetricValue::Value(10.2));
        assert_eq!(rows[2].value, MetricValue::NoData);
    }

    #[test]
    fn empty_snapshot_is_all_no_data() {
        let rows = project_comparison("X", &FundamentalsSnapshot::empty("X"));
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.value.is_no_data()));
    }
}

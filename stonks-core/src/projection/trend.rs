//! Trend projection: provider closes → `PriceSeries` over [start, end].

use chrono::{Duration, NaiveDate};

use crate::domain::{PricePoint, PriceSeries};

/// Exclusive upstream boundary for an inclusive `end`.
///
/// Providers treat the end of a window as exclusive (and timestamp it at
/// midnight), so the last requested calendar day must be pushed one day out
/// or its close is dropped.
pub fn request_until(end: NaiveDate) -> NaiveDate {
    end.checked_add_signed(Duration::days(1)).unwrap_or(end)
}

/// Keep closes dated within [start, end], strictly ascending.
///
/// Invalid closes (negative, NaN, infinite) are dropped. When a provider
/// repeats a date the last observation wins. No gap filling.
pub fn project_trend(
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    raw: Vec<PricePoint>,
) -> PriceSeries {
    let received = raw.len();
    let mut points: Vec<PricePoint> = raw
        .into_iter()
        .filter(|p| p.date >= start && p.date <= end && p.is_valid())
        .collect();

    // Stable sort keeps provider order among equal dates.
    points.sort_by_key(|p| p.date);
    let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
    for point in points {
        match deduped.last_mut() {
            Some(last) if last.date == point.date => *last = point,
            _ => deduped.push(point),
        }
    }

    if deduped.len() != received {
        tracing::debug!(
            symbol,
            received,
            kept = deduped.len(),
            "trimmed provider closes to requested window"
        );
    }

    PriceSeries::new(symbol, deduped)
}

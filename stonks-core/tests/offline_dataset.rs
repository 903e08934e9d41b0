//! Refreshes against the bundled offline CSV fixture and the shipped
//! industry reference table, plus artifact export of the result.

use std::path::PathBuf;

use chrono::NaiveDate;
use stonks_core::export::{load_artifacts, COMPARISON_FILE, RATIOS_FILE, TREND_FILE};
use stonks_core::{
    save_artifacts, ChartPipeline, CsvProvider, DashboardConfig, IndustryReference,
    MarketDataProvider, RefreshError,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/offline")
}

fn shipped_reference() -> IndustryReference {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("data/industry_ratios.csv");
    IndustryReference::from_file(&path).unwrap()
}

#[test]
fn shipped_reference_table_loads() {
    let refs = shipped_reference();
    assert!(refs.len() >= 10);
    let bev = refs.get("beverages - non-alcoholic").unwrap();
    assert!(bev.trailing_pe.is_some());
    // Rows with empty cells load as absent ratios.
    let etf = refs.get("Exchange Traded Fund").unwrap();
    assert_eq!(etf.trailing_pe, None);
    assert_eq!(etf.trailing_ps, None);
}

#[test]
fn ko_from_offline_dataset() {
    let provider = CsvProvider::from_dir(&fixture_dir()).unwrap();
    let refs = shipped_reference();
    let config = DashboardConfig::stock();
    let pipeline = ChartPipeline::from_config(&config, &provider, &refs);

    let chart = pipeline.refresh("ko", d(2023, 1, 1), d(2023, 1, 10)).unwrap();

    let dates: Vec<NaiveDate> = chart.trend.dates().collect();
    assert_eq!(
        dates,
        vec![
            d(2023, 1, 3),
            d(2023, 1, 4),
            d(2023, 1, 5),
            d(2023, 1, 6),
            d(2023, 1, 9),
            d(2023, 1, 10),
        ]
    );
    assert_eq!(chart.trend.close_on(d(2023, 1, 10)), Some(63.24));
    assert_eq!(chart.display_name.as_deref(), Some("The Coca-Cola Company"));
    assert!(chart.ratios.iter().all(|r| !r.value.is_no_data()));
}

#[test]
fn unprofitable_company_keeps_ps_rows() {
    let provider = CsvProvider::from_dir(&fixture_dir()).unwrap();
    let refs = shipped_reference();
    let pipeline = ChartPipeline::new(&provider, &refs);

    let chart = pipeline.refresh("F", d(2023, 1, 1), d(2023, 1, 11)).unwrap();

    // The fixture has no close for F on the last day.
    assert_eq!(chart.trend.last_date(), Some(d(2023, 1, 10)));
    assert!(chart.comparison[1].value.is_no_data());
    assert!(chart.ratios[0].value.is_no_data());
    assert_eq!(chart.ratios[2].value.as_f64(), Some(0.34));
    assert!(chart.ratios[3].value.as_f64().is_some());
}

#[test]
fn company_search_over_offline_dataset() {
    let provider = CsvProvider::from_dir(&fixture_dir()).unwrap();
    let refs = shipped_reference();
    let pipeline = ChartPipeline::new(&provider, &refs);

    let chart = pipeline
        .refresh_company("Ford Motor", d(2023, 1, 3), d(2023, 1, 4), &provider)
        .unwrap();
    assert_eq!(chart.symbol, "F");

    let err = pipeline
        .refresh_company("Zzqqxnonexistent", d(2023, 1, 3), d(2023, 1, 4), &provider)
        .unwrap_err();
    assert!(matches!(err, RefreshError::NoMatch { .. }));
}

#[test]
fn offline_provider_treats_until_as_exclusive() {
    let provider = CsvProvider::from_dir(&fixture_dir()).unwrap();
    let closes = provider
        .daily_closes("GOOG", d(2023, 1, 3), d(2023, 1, 5))
        .unwrap();
    assert_eq!(closes.len(), 2);
    assert_eq!(closes[1].date, d(2023, 1, 4));
}

#[test]
fn artifacts_from_a_refresh() {
    let provider = CsvProvider::from_dir(&fixture_dir()).unwrap();
    let refs = shipped_reference();
    let pipeline = ChartPipeline::new(&provider, &refs);
    let chart = pipeline.refresh("GOOG", d(2023, 1, 3), d(2023, 1, 6)).unwrap();

    let out = tempfile::tempdir().unwrap();
    let paths = save_artifacts(&chart, out.path()).unwrap();

    let trend = std::fs::read_to_string(paths.dir.join(TREND_FILE)).unwrap();
    assert!(trend.starts_with("date,GOOG\n"));
    assert_eq!(trend.lines().count(), 5);

    let comparison = std::fs::read_to_string(paths.dir.join(COMPARISON_FILE)).unwrap();
    assert_eq!(comparison.lines().count(), 4);

    let ratios = std::fs::read_to_string(paths.dir.join(RATIOS_FILE)).unwrap();
    assert_eq!(ratios.lines().count(), 5);
    assert!(ratios.contains("GOOG,Internet Content & Information,P/E,20.11"));

    assert_eq!(load_artifacts(&paths.dir).unwrap(), chart);
}

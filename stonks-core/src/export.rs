//! Chart artifacts: CSV tables per chart plus a versioned JSON manifest.
//!
//! An artifact directory holds:
//! - `trend.csv`: `date,<TICKER>` wide close column
//! - `comparison.csv`: `ticker,Type,Value`
//! - `ratios.csv`: `ticker,industry,Type,Value`
//! - `chart_data.json`: the full `ChartData` with a `schema_version`
//!
//! Missing values are written as the "no data" sentinel in every format.
//! Manifests from a newer schema are rejected on load.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ChartData, MetricValue, NO_DATA};

/// Current schema version for persisted manifests.
pub const SCHEMA_VERSION: u32 = 1;

pub const TREND_FILE: &str = "trend.csv";
pub const COMPARISON_FILE: &str = "comparison.csv";
pub const RATIOS_FILE: &str = "ratios.csv";
pub const MANIFEST_FILE: &str = "chart_data.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema version {found} (max supported: {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Persisted form of a refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub chart: ChartData,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Paths written by `save_artifacts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub trend: PathBuf,
    pub comparison: PathBuf,
    pub ratios: PathBuf,
    pub manifest: PathBuf,
}

fn metric_cell(value: &MetricValue) -> String {
    match value.as_f64() {
        Some(v) => v.to_string(),
        None => NO_DATA.to_string(),
    }
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let data = wtr
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Trend chart as CSV. The close column is named after the ticker.
pub fn trend_csv(chart: &ChartData) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", chart.symbol.as_str()])?;
    for p in &chart.trend.points {
        wtr.write_record([p.date.to_string(), p.close.to_string()])?;
    }
    finish(wtr)
}

pub fn comparison_csv(chart: &ChartData) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["ticker", "Type", "Value"])?;
    for row in &chart.comparison {
        let value = metric_cell(&row.value);
        wtr.write_record([row.ticker.as_str(), row.metric.as_str(), value.as_str()])?;
    }
    finish(wtr)
}

pub fn ratios_csv(chart: &ChartData) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["ticker", "industry", "Type", "Value"])?;
    for row in &chart.ratios {
        let value = metric_cell(&row.value);
        wtr.write_record([
            row.ticker.as_str(),
            row.industry_label(),
            row.metric.as_str(),
            value.as_str(),
        ])?;
    }
    finish(wtr)
}

/// Pretty JSON manifest stamped with the current schema version.
pub fn chart_json(chart: &ChartData) -> Result<String, ExportError> {
    let manifest = ChartManifest {
        schema_version: SCHEMA_VERSION,
        chart: chart.clone(),
    };
    Ok(serde_json::to_string_pretty(&manifest)?)
}

/// Parse a manifest, rejecting versions newer than this build understands.
pub fn load_chart_json(json: &str) -> Result<ChartData, ExportError> {
    let manifest: ChartManifest = serde_json::from_str(json)?;
    if manifest.schema_version > SCHEMA_VERSION {
        return Err(ExportError::UnsupportedSchema {
            found: manifest.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(manifest.chart)
}

/// Write the full artifact set under `output_dir/<TICKER>_<start>_<end>/`.
pub fn save_artifacts(chart: &ChartData, output_dir: &Path) -> Result<ArtifactPaths, ExportError> {
    let dir = output_dir.join(format!("{}_{}_{}", chart.symbol, chart.start, chart.end));
    std::fs::create_dir_all(&dir).map_err(io_err(&dir))?;

    let paths = ArtifactPaths {
        trend: dir.join(TREND_FILE),
        comparison: dir.join(COMPARISON_FILE),
        ratios: dir.join(RATIOS_FILE),
        manifest: dir.join(MANIFEST_FILE),
        dir,
    };

    std::fs::write(&paths.trend, trend_csv(chart)?).map_err(io_err(&paths.trend))?;
    std::fs::write(&paths.comparison, comparison_csv(chart)?)
        .map_err(io_err(&paths.comparison))?;
    std::fs::write(&paths.ratios, ratios_csv(chart)?).map_err(io_err(&paths.ratios))?;
    std::fs::write(&paths.manifest, chart_json(chart)?).map_err(io_err(&paths.manifest))?;

    tracing::info!(dir = %paths.dir.display(), "chart artifacts written");
    Ok(paths)
}

/// Load `ChartData` back from an artifact directory's manifest.
pub fn load_artifacts(dir: &Path) -> Result<ChartData, ExportError> {
    let path = dir.join(MANIFEST_FILE);
    let json = std::fs::read_to_string(&path).map_err(io_err(&path))?;
    load_chart_json(&json)
}

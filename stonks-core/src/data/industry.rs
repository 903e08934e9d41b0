//! Industry reference table: per-industry trailing P/E and P/S.
//!
//! Loaded once from a CSV file with header `industry,trailing_pe,trailing_ps`
//! and shared read-only afterwards. Empty ratio cells are allowed and
//! project to "no data".

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("read industry reference {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse industry reference row {row}: {source}")]
    Parse {
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("duplicate industry '{0}' in reference table")]
    Duplicate(String),
}

/// Reference ratios for one industry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryRatios {
    pub industry: String,
    pub trailing_pe: Option<f64>,
    pub trailing_ps: Option<f64>,
}

/// Read-only mapping from industry name to reference ratios.
#[derive(Debug, Clone, Default)]
pub struct IndustryReference {
    rows: BTreeMap<String, IndustryRatios>,
}

/// Lookup key: case-folded, surrounding whitespace ignored.
fn industry_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl IndustryReference {
    pub fn from_file(path: &Path) -> Result<Self, ReferenceError> {
        let file = std::fs::File::open(path).map_err(|source| ReferenceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let reference = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            industries = reference.len(),
            "loaded industry reference"
        );
        Ok(reference)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, ReferenceError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = BTreeMap::new();
        for (row, record) in rdr.deserialize::<IndustryRatios>().enumerate() {
            let ratios = record.map_err(|source| ReferenceError::Parse { row, source })?;
            let key = industry_key(&ratios.industry);
            if rows.contains_key(&key) {
                return Err(ReferenceError::Duplicate(ratios.industry));
            }
            rows.insert(key, ratios);
        }
        Ok(Self { rows })
    }

    pub fn from_rows(rows: impl IntoIterator<Item = IndustryRatios>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|r| (industry_key(&r.industry), r))
                .collect(),
        }
    }

    pub fn get(&self, industry: &str) -> Option<&IndustryRatios> {
        self.rows.get(&industry_key(industry))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in case-folded name order.
    pub fn iter(&self) -> impl Iterator<Item = &IndustryRatios> {
        self.rows.values()
    }
}

//! Dashboard configuration loaded from TOML.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields the stock dashboard: the sixteen-ticker watchlist, GOOG selected,
//! the last 365 days, Yahoo Finance as the provider.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub dashboard: DashboardSettings,
    pub reference: ReferenceSettings,
    pub provider: ProviderSettings,
    /// Normalized company key → ticker shortcuts, checked before search.
    /// An absent table gets the built-in shortcuts; an empty one disables them.
    #[serde(default = "default_aliases")]
    pub aliases: BTreeMap<String, String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            dashboard: DashboardSettings::default(),
            reference: ReferenceSettings::default(),
            provider: ProviderSettings::default(),
            aliases: default_aliases(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub default_symbol: String,
    /// Default window length ending today.
    pub lookback_days: i64,
    /// Earliest start date a refresh accepts.
    pub min_start_date: NaiveDate,
    pub watchlist: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceSettings {
    pub industry_csv: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub user_agent: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            default_symbol: "GOOG".into(),
            lookback_days: 365,
            min_start_date: NaiveDate::from_ymd_opt(2001, 1, 1).unwrap_or(NaiveDate::MIN),
            watchlist: [
                "GOOG", "NKE", "MSFT", "KO", "FB", "GME", "CRM", "DIS", "OTEX", "F", "SNAP",
                "MCD", "VTI", "AAPL", "NFLX", "TSLA",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Default for ReferenceSettings {
    fn default() -> Self {
        Self {
            industry_csv: PathBuf::from("data/industry_ratios.csv"),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 2,
            base_delay_ms: 500,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
        }
    }
}

/// Built-in shortcuts used when the config does not define `[aliases]`.
pub fn default_aliases() -> BTreeMap<String, String> {
    [("google", "GOOG"), ("alphabet", "GOOG")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl DashboardConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The stock configuration, with built-in aliases.
    pub fn stock() -> Self {
        Self::default()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.dashboard.lookback_days < 0 {
            return Err(ConfigError::Invalid(format!(
                "dashboard.lookback_days must be non-negative, got {}",
                self.dashboard.lookback_days
            )));
        }
        if self.dashboard.default_symbol.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "dashboard.default_symbol must not be empty".into(),
            ));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "provider.timeout_secs must be positive".into(),
            ));
        }
        if let Some((key, _)) = self.aliases.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("alias '{key}' has an empty symbol")));
        }
        Ok(())
    }

    /// Default (start, end) window ending on `today`, never earlier than
    /// `min_start_date`.
    pub fn default_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let floor = self.dashboard.min_start_date;
        let start = chrono::Duration::try_days(self.dashboard.lookback_days)
            .and_then(|span| today.checked_sub_signed(span))
            .map_or(floor, |start| start.max(floor));
        (start, today)
    }
}

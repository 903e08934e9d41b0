//! Yahoo Finance data provider.
//!
//! Daily closes come from the v8 chart API, fundamentals from the v10
//! quoteSummary API and symbol search from the v1 search API. quoteSummary
//! needs a session cookie plus a crumb token; both are fetched lazily and
//! cached for the life of the provider.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes. `CsvProvider` is the offline fallback.

use super::provider::{DataError, MarketDataProvider, SymbolMatch, SymbolResolver};
use crate::config::ProviderSettings;
use crate::domain::{FundamentalsSnapshot, PricePoint};
use chrono::{Duration as ChronoDuration, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Duration;

const CHART_BASE: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const SUMMARY_BASE: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const SEARCH_BASE: &str = "https://query2.finance.yahoo.com/v1/finance/search";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const SUMMARY_MODULES: &str = "price,summaryDetail,assetProfile";

// ── chart API ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartEntry>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartEntry {
    #[serde(default)]
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

// ── quoteSummary API ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryResult,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    result: Option<Vec<SummaryData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryData {
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(default)]
    summary_detail: Option<SummaryDetail>,
    #[serde(default)]
    asset_profile: Option<AssetProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    #[serde(default)]
    previous_close: Option<RawValue>,
    #[serde(default)]
    fifty_day_average: Option<RawValue>,
    #[serde(default)]
    two_hundred_day_average: Option<RawValue>,
    #[serde(rename = "trailingPE", default)]
    trailing_pe: Option<RawValue>,
    #[serde(rename = "priceToSalesTrailing12Months", default)]
    price_to_sales_ttm: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct AssetProfile {
    #[serde(default)]
    industry: Option<String>,
}

/// Yahoo wraps numbers as `{"raw": 1.23, "fmt": "1.23"}`; absent values
/// come back as `{}`.
#[derive(Debug, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

fn raw(value: Option<RawValue>) -> Option<f64> {
    value.and_then(|v| v.raw).filter(|v| v.is_finite())
}

// ── search API ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Debug, Deserialize)]
struct SearchQuote {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    shortname: Option<String>,
    #[serde(default)]
    longname: Option<String>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    crumb: Mutex<Option<String>>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(settings: &ProviderSettings) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .cookie_store(true)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            crumb: Mutex::new(None),
            max_retries: settings.max_retries,
            base_delay: Duration::from_millis(settings.base_delay_ms),
        })
    }

    /// Chart API URL. `until` is an exclusive calendar-day boundary.
    fn chart_url(symbol: &str, start: NaiveDate, until: NaiveDate) -> String {
        let period1 = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let period2 = until.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        format!(
            "{CHART_BASE}/{}?period1={period1}&period2={period2}&interval=1d&events=history",
            urlencoding::encode(symbol)
        )
    }

    fn summary_url(symbol: &str, crumb: &str) -> String {
        format!(
            "{SUMMARY_BASE}/{}?modules={SUMMARY_MODULES}&crumb={}",
            urlencoding::encode(symbol),
            urlencoding::encode(crumb)
        )
    }

    fn search_url(query: &str) -> String {
        format!(
            "{SEARCH_BASE}?q={}&quotesCount=10&newsCount=0",
            urlencoding::encode(query)
        )
    }

    /// Parse a chart response into closes dated in the exchange's local time.
    fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<Vec<PricePoint>, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // No timestamps means no trading days in the window.
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let offset = data.meta.map(|m| m.gmtoffset).unwrap_or(0);
        let closes = data
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut points = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            // Holidays and halted sessions come back as null closes
            if let Some(close) = closes.get(i).copied().flatten() {
                points.push(PricePoint::new(date, close));
            }
        }

        Ok(points)
    }

    fn parse_summary(
        symbol: &str,
        resp: SummaryResponse,
    ) -> Result<FundamentalsSnapshot, DataError> {
        if let Some(err) = resp.quote_summary.error {
            return Err(if err.code == "Not Found" {
                DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                }
            } else {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            });
        }

        let data = resp
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .unwrap_or_default();

        let mut snapshot = FundamentalsSnapshot::empty(symbol);
        if let Some(detail) = data.summary_detail {
            snapshot.previous_close = raw(detail.previous_close);
            snapshot.fifty_day_average = raw(detail.fifty_day_average);
            snapshot.two_hundred_day_average = raw(detail.two_hundred_day_average);
            snapshot.trailing_pe = raw(detail.trailing_pe);
            snapshot.trailing_ps = raw(detail.price_to_sales_ttm);
        }
        snapshot.industry = data
            .asset_profile
            .and_then(|p| p.industry)
            .filter(|s| !s.trim().is_empty());
        snapshot.display_name = data.price.and_then(|p| p.long_name.or(p.short_name));
        Ok(snapshot)
    }

    fn parse_search(resp: SearchResponse) -> Vec<SymbolMatch> {
        resp.quotes
            .into_iter()
            .filter_map(|q| {
                let symbol = q.symbol?;
                let name = q.longname.or(q.shortname).unwrap_or_else(|| symbol.clone());
                Some(SymbolMatch::new(symbol, name))
            })
            .collect()
    }

    /// GET a JSON document with retry on transport failures, 429 and 5xx.
    fn get_json<T: DeserializeOwned>(&self, url: &str, symbol: &str) -> Result<T, DataError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(symbol, attempt, ?delay, "retrying provider request");
                std::thread::sleep(delay);
            }

            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        tracing::warn!(symbol, retry_after, "rate limited by Yahoo");
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED
                        || status == reqwest::StatusCode::FORBIDDEN
                    {
                        return Err(DataError::AuthenticationRequired(format!(
                            "Yahoo Finance returned {status}"
                        )));
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if status.is_server_error() {
                        last_error = Some(DataError::HttpStatus {
                            status: status.as_u16(),
                            symbol: symbol.to_string(),
                        });
                        continue;
                    }

                    if !status.is_success() {
                        return Err(DataError::HttpStatus {
                            status: status.as_u16(),
                            symbol: symbol.to_string(),
                        });
                    }

                    return resp.json::<T>().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    });
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }

    /// Cached crumb, fetching cookie and crumb on first use.
    fn crumb(&self) -> Result<String, DataError> {
        // Held across both fetches so concurrent callers wait for one session.
        let mut cached = self
            .crumb
            .lock()
            .map_err(|_| DataError::Other("crumb lock poisoned".into()))?;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // The cookie endpoint answers 404 but still sets the session cookie.
        self.client
            .get(COOKIE_URL)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let body = self
            .client
            .get(CRUMB_URL)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| DataError::AuthenticationRequired(format!("crumb request failed: {e}")))?;

        let crumb = body.trim();
        if crumb.is_empty() || crumb.len() > 100 || crumb.contains(' ') || crumb.contains('<') {
            return Err(DataError::AuthenticationRequired(
                "Yahoo returned an unusable crumb".into(),
            ));
        }

        tracing::debug!("obtained Yahoo session crumb");
        *cached = Some(crumb.to_string());
        Ok(crumb.to_string())
    }

    fn invalidate_crumb(&self) {
        if let Ok(mut cached) = self.crumb.lock() {
            *cached = None;
        }
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<PricePoint>, DataError> {
        // Yahoo rejects empty windows; ask for at least one day.
        let until = until.max(start + ChronoDuration::days(1));
        let url = Self::chart_url(symbol, start, until);
        tracing::debug!(symbol, %start, %until, "fetching daily closes");
        let chart: ChartResponse = self.get_json(&url, symbol)?;
        Self::parse_chart(symbol, chart)
    }

    fn fundamentals(&self, symbol: &str) -> Result<FundamentalsSnapshot, DataError> {
        tracing::debug!(symbol, "fetching fundamentals");
        let crumb = self.crumb()?;
        let url = Self::summary_url(symbol, &crumb);
        let summary = match self.get_json::<SummaryResponse>(&url, symbol) {
            Err(DataError::AuthenticationRequired(reason)) => {
                // Stale session: refresh the crumb once.
                tracing::warn!(symbol, %reason, "refreshing Yahoo session");
                self.invalidate_crumb();
                let crumb = self.crumb()?;
                self.get_json(&Self::summary_url(symbol, &crumb), symbol)?
            }
            other => other?,
        };
        Self::parse_summary(symbol, summary)
    }
}

impl SymbolResolver for YahooProvider {
    fn search(&self, query: &str) -> Result<Vec<SymbolMatch>, DataError> {
        tracing::debug!(query, "searching symbols");
        let resp: SearchResponse = self.get_json(&Self::search_url(query), query)?;
        Ok(Self::parse_search(resp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn chart_url_uses_exclusive_midnight_boundary() {
        let url = YahooProvider::chart_url("KO", d(2023, 1, 1), d(2023, 1, 11));
        assert!(url.starts_with("https://query2.finance.yahoo.com/v8/finance/chart/KO?"));
        assert!(url.contains("period1=1672531200"));
        assert!(url.contains("period2=1673395200"));
        assert!(url.contains("interval=1d"));
    }

    #[test]
    fn search_url_encodes_query() {
        let url = YahooProvider::search_url("Coca Cola & Co");
        assert!(url.contains("q=Coca%20Cola%20%26%20Co"));
    }

    #[test]
    fn parse_chart_applies_exchange_offset_and_skips_null_closes() {
        // 2023-01-03 14:30 UTC and 2023-01-04 14:30 UTC, NYSE offset -5h.
        let json = r#"{"chart":{"result":[{
            "meta":{"gmtoffset":-18000},
            "timestamp":[1672756200,1672842600,1672929000],
            "indicators":{"quote":[{"close":[62.8,null,63.1]}]}
        }],"error":null}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        let points = YahooProvider::parse_chart("KO", resp).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, d(2023, 1, 3));
        assert_eq!(points[1].date, d(2023, 1, 5));
        assert_eq!(points[1].close, 63.1);
    }

    #[test]
    fn parse_chart_maps_not_found() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        let err = YahooProvider::parse_chart("ZZZZ", resp).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn parse_chart_without_timestamps_is_empty() {
        let json = r#"{"chart":{"result":[{"meta":{"gmtoffset":0},"indicators":{"quote":[{}]}}],"error":null}}"#;
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        assert!(YahooProvider::parse_chart("KO", resp).unwrap().is_empty());
    }

    #[test]
    fn parse_summary_tolerates_missing_modules_and_fields() {
        let json = r#"{"quoteSummary":{"result":[{
            "price":{"shortName":"Coca-Cola Company (The)"},
            "summaryDetail":{
                "previousClose":{"raw":61.9,"fmt":"61.90"},
                "fiftyDayAverage":{},
                "trailingPE":{"raw":26.4,"fmt":"26.40"}
            }
        }],"error":null}}"#;
        let resp: SummaryResponse = serde_json::from_str(json).unwrap();
        let snap = YahooProvider::parse_summary("KO", resp).unwrap();
        assert_eq!(snap.symbol, "KO");
        assert_eq!(snap.previous_close, Some(61.9));
        assert_eq!(snap.fifty_day_average, None);
        assert_eq!(snap.two_hundred_day_average, None);
        assert_eq!(snap.trailing_pe, Some(26.4));
        assert_eq!(snap.trailing_ps, None);
        assert_eq!(snap.industry, None);
        assert_eq!(snap.display_name.as_deref(), Some("Coca-Cola Company (The)"));
    }

    #[test]
    fn parse_summary_reads_industry_and_long_name() {
        let json = r#"{"quoteSummary":{"result":[{
            "price":{"longName":"The Coca-Cola Company","shortName":"Coca-Cola"},
            "assetProfile":{"industry":"Beverages - Non-Alcoholic"},
            "summaryDetail":{"priceToSalesTrailing12Months":{"raw":6.2}}
        }],"error":null}}"#;
        let resp: SummaryResponse = serde_json::from_str(json).unwrap();
        let snap = YahooProvider::parse_summary("KO", resp).unwrap();
        assert_eq!(snap.industry.as_deref(), Some("Beverages - Non-Alcoholic"));
        assert_eq!(snap.display_name.as_deref(), Some("The Coca-Cola Company"));
        assert_eq!(snap.trailing_ps, Some(6.2));
    }

    #[test]
    fn parse_summary_maps_not_found() {
        let json = r#"{"quoteSummary":{"result":null,"error":{"code":"Not Found","description":"Quote not found for symbol: ZZZZ"}}}"#;
        let resp: SummaryResponse = serde_json::from_str(json).unwrap();
        let err = YahooProvider::parse_summary("ZZZZ", resp).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn parse_search_keeps_provider_order() {
        let json = r#"{"quotes":[
            {"symbol":"GOOGL","shortname":"Alphabet Inc.","quoteType":"EQUITY"},
            {"symbol":"GOOG","longname":"Alphabet Inc.","quoteType":"EQUITY"},
            {"quoteType":"NEWS"}
        ]}"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        let matches = YahooProvider::parse_search(resp);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].symbol, "GOOGL");
        assert_eq!(matches[1].symbol, "GOOG");
    }
}

//! Yahoo Finance client: quote snapshot, fundamentals summary, and daily
//! price history via the public quote/chart endpoints.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use research_core::GatherError;

const QUOTE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/quote";
const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: Option<u64>,
    pub market_cap: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalsSummary {
    pub symbol: String,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
    pub eps_trailing: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
}

impl YahooClient {
    pub fn new() -> Self {
        // Yahoo rejects default reqwest agents; present a browser UA
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }

    pub async fn quote(&self, symbol: &str) -> Result<Quote, GatherError> {
        let url = format!("{}?symbols={}", QUOTE_URL, symbol);
        let json = self.get_json(&url).await?;
        parse_quote(symbol, &json)
    }

    pub async fn fundamentals(&self, symbol: &str) -> Result<FundamentalsSummary, GatherError> {
        let url = format!("{}?symbols={}", QUOTE_URL, symbol);
        let json = self.get_json(&url).await?;
        parse_fundamentals(symbol, &json)
    }

    /// Daily bars for the last `days` days.
    pub async fn daily_history(
        &self,
        symbol: &str,
        days: i64,
    ) -> Result<Vec<PricePoint>, GatherError> {
        let period2 = Utc::now().timestamp();
        let period1 = period2 - days * 86_400;
        let url = format!(
            "{}/{}?period1={}&period2={}&interval=1d",
            CHART_URL, symbol, period1, period2
        );
        let json = self.get_json(&url).await?;
        parse_history(symbol, &json)
    }

    async fn get_json(&self, url: &str) -> Result<Value, GatherError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatherError::Network(format!("Yahoo request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GatherError::RateLimited("Yahoo returned 429".to_string()));
        }
        if !status.is_success() {
            return Err(GatherError::Network(format!("Yahoo returned HTTP {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| GatherError::Network(format!("Yahoo response was not JSON: {e}")))
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

fn quote_result<'a>(symbol: &str, json: &'a Value) -> Result<&'a Value, GatherError> {
    json.pointer("/quoteResponse/result")
        .and_then(|r| r.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| GatherError::NoData(format!("no Yahoo quote for {symbol}")))
}

fn parse_quote(symbol: &str, json: &Value) -> Result<Quote, GatherError> {
    let data = quote_result(symbol, json)?;
    let f64_field = |key: &str| data.get(key).and_then(|v| v.as_f64());

    Ok(Quote {
        symbol: symbol.to_string(),
        price: f64_field("regularMarketPrice").unwrap_or(0.0),
        change: f64_field("regularMarketChange").unwrap_or(0.0),
        change_percent: f64_field("regularMarketChangePercent").unwrap_or(0.0),
        volume: data.get("regularMarketVolume").and_then(|v| v.as_u64()),
        market_cap: f64_field("marketCap"),
        fifty_two_week_high: f64_field("fiftyTwoWeekHigh"),
        fifty_two_week_low: f64_field("fiftyTwoWeekLow"),
    })
}

fn parse_fundamentals(symbol: &str, json: &Value) -> Result<FundamentalsSummary, GatherError> {
    let data = quote_result(symbol, json)?;
    let f64_field = |key: &str| data.get(key).and_then(|v| v.as_f64());

    Ok(FundamentalsSummary {
        symbol: symbol.to_string(),
        market_cap: f64_field("marketCap"),
        trailing_pe: f64_field("trailingPE"),
        forward_pe: f64_field("forwardPE"),
        price_to_book: f64_field("priceToBook"),
        dividend_yield: f64_field("dividendYield"),
        beta: f64_field("beta"),
        eps_trailing: f64_field("epsTrailingTwelveMonths"),
        fifty_two_week_high: f64_field("fiftyTwoWeekHigh"),
        fifty_two_week_low: f64_field("fiftyTwoWeekLow"),
    })
}

fn parse_history(symbol: &str, json: &Value) -> Result<Vec<PricePoint>, GatherError> {
    let chart = json
        .pointer("/chart/result")
        .and_then(|r| r.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| GatherError::NoData(format!("no Yahoo chart data for {symbol}")))?;

    let timestamps = chart
        .get("timestamp")
        .and_then(|t| t.as_array())
        .ok_or_else(|| GatherError::NoData(format!("empty Yahoo chart for {symbol}")))?;

    let quote = chart
        .pointer("/indicators/quote")
        .and_then(|q| q.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| GatherError::NoData(format!("empty Yahoo chart for {symbol}")))?;

    let series = |key: &str| quote.get(key).and_then(|v| v.as_array());
    let (opens, highs, lows, closes, volumes) = match (
        series("open"),
        series("high"),
        series("low"),
        series("close"),
        series("volume"),
    ) {
        (Some(o), Some(h), Some(l), Some(c), Some(v)) => (o, h, l, c, v),
        _ => return Err(GatherError::NoData(format!("empty Yahoo chart for {symbol}"))),
    };

    let mut points = Vec::with_capacity(timestamps.len());
    for i in 0..timestamps.len() {
        // Holidays serialize as nulls; skip incomplete rows
        if let (Some(ts), Some(o), Some(h), Some(l), Some(c), Some(v)) = (
            timestamps.get(i).and_then(|v| v.as_i64()),
            opens.get(i).and_then(|v| v.as_f64()),
            highs.get(i).and_then(|v| v.as_f64()),
            lows.get(i).and_then(|v| v.as_f64()),
            closes.get(i).and_then(|v| v.as_f64()),
            volumes.get(i).and_then(|v| v.as_u64()),
        ) {
            if let Some(timestamp) = DateTime::from_timestamp(ts, 0) {
                points.push(PricePoint {
                    timestamp,
                    open: o,
                    high: h,
                    low: l,
                    close: c,
                    volume: v,
                });
            }
        }
    }

    if points.is_empty() {
        return Err(GatherError::NoData(format!("no Yahoo price history for {symbol}")));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_quote_payload() {
        let payload = json!({
            "quoteResponse": {
                "result": [{
                    "regularMarketPrice": 41.27,
                    "regularMarketChange": -1.13,
                    "regularMarketChangePercent": -2.66,
                    "regularMarketVolume": 801_234,
                    "marketCap": 2.05e9,
                    "fiftyTwoWeekHigh": 48.0,
                    "fiftyTwoWeekLow": 30.5
                }]
            }
        });

        let quote = parse_quote("CAKE", &payload).unwrap();
        assert_eq!(quote.symbol, "CAKE");
        assert_eq!(quote.price, 41.27);
        assert_eq!(quote.volume, Some(801_234));
        assert_eq!(quote.fifty_two_week_low, Some(30.5));
    }

    #[test]
    fn empty_result_is_no_data() {
        let payload = json!({"quoteResponse": {"result": []}});
        let err = parse_quote("ZZZT", &payload).unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn history_skips_null_rows() {
        let payload = json!({
            "chart": {
                "result": [{
                    "timestamp": [1_700_000_000i64, 1_700_086_400i64],
                    "indicators": {
                        "quote": [{
                            "open":   [10.0, null],
                            "high":   [11.0, null],
                            "low":    [9.5,  null],
                            "close":  [10.5, null],
                            "volume": [1000, null]
                        }]
                    }
                }]
            }
        });

        let points = parse_history("CAKE", &payload).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].close, 10.5);
    }
}

//! Market gatherer: Yahoo Finance quote plus 90 days of daily bars, reduced
//! to the handful of signals a reader actually scans.

use async_trait::async_trait;
use chrono::Utc;

use research_core::{GatherError, GatherRequest, Gatherer, ResearchReport, Source};
use yahoo_client::{PricePoint, Quote, YahooClient};

use crate::format::report_header;

const HISTORY_DAYS: i64 = 90;

pub struct MarketGatherer {
    yahoo: YahooClient,
}

impl MarketGatherer {
    pub fn new() -> Self {
        Self {
            yahoo: YahooClient::new(),
        }
    }

    pub fn with_client(yahoo: YahooClient) -> Self {
        Self { yahoo }
    }
}

impl Default for MarketGatherer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gatherer for MarketGatherer {
    fn source(&self) -> Source {
        Source::Market
    }

    async fn gather(&self, request: &GatherRequest) -> Result<ResearchReport, GatherError> {
        let quote = self.yahoo.quote(&request.ticker).await?;
        let history = self.yahoo.daily_history(&request.ticker, HISTORY_DAYS).await?;

        let generated_at = Utc::now();
        let (body, signal_count) = format_market(&quote, &history);

        let mut markdown = report_header("Market", request, generated_at, &[]);
        markdown.push_str("## Price & Volume\n\n");
        markdown.push_str(&body);

        Ok(ResearchReport {
            ticker: request.ticker.clone(),
            company: request.company.clone(),
            source: Source::Market,
            generated_at,
            markdown,
            item_count: signal_count,
        })
    }
}

fn sma(closes: &[f64], window: usize) -> Option<f64> {
    if closes.len() < window {
        return None;
    }
    Some(closes[closes.len() - window..].iter().sum::<f64>() / window as f64)
}

/// Build the signal lines; returns (markdown, signal count).
fn format_market(quote: &Quote, history: &[PricePoint]) -> (String, usize) {
    let closes: Vec<f64> = history.iter().map(|p| p.close).collect();
    let mut lines = Vec::new();

    lines.push(format!(
        "- **Price**: ${:.2} ({:+.2}%, {:+.2} today)",
        quote.price, quote.change_percent, quote.change
    ));

    if let (Some(low), Some(high)) = (quote.fifty_two_week_low, quote.fifty_two_week_high) {
        if high > low {
            let position = (quote.price - low) / (high - low) * 100.0;
            lines.push(format!(
                "- **52-week range**: ${:.2} — ${:.2} (at {:.0}% of range)",
                low, high, position
            ));
        }
    }

    if let (Some(sma20), Some(sma50)) = (sma(&closes, 20), sma(&closes, 50)) {
        lines.push(format!(
            "- **Moving averages**: SMA-20 ${:.2} | SMA-50 ${:.2} ({})",
            sma20,
            sma50,
            if sma20 >= sma50 { "above" } else { "below" }
        ));
    }

    if closes.len() >= 21 {
        let prior = closes[closes.len() - 21];
        if prior != 0.0 {
            let pct = (closes[closes.len() - 1] - prior) / prior * 100.0;
            lines.push(format!("- **20-session change**: {:+.1}%", pct));
        }
    }

    if let Some(volume) = quote.volume {
        let volumes: Vec<u64> = history.iter().map(|p| p.volume).collect();
        if volumes.len() >= 30 {
            let avg = volumes[volumes.len() - 30..].iter().sum::<u64>() as f64 / 30.0;
            if avg > 0.0 {
                lines.push(format!(
                    "- **Volume**: {} ({:.1}x 30-day average)",
                    volume,
                    volume as f64 / avg
                ));
            }
        }
    }

    let count = lines.len();
    (lines.join("\n") + "\n", count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn quote() -> Quote {
        Quote {
            symbol: "CAKE".into(),
            price: 41.27,
            change: -1.13,
            change_percent: -2.66,
            volume: Some(900_000),
            market_cap: Some(2.05e9),
            fifty_two_week_high: Some(48.0),
            fifty_two_week_low: Some(30.5),
        }
    }

    fn history(days: usize) -> Vec<PricePoint> {
        let start = Utc::now() - Duration::days(days as i64);
        (0..days)
            .map(|i| PricePoint {
                timestamp: start + Duration::days(i as i64),
                open: 40.0,
                high: 42.0,
                low: 39.0,
                close: 40.0 + (i % 5) as f64 * 0.5,
                volume: 1_000_000,
            })
            .collect()
    }

    #[test]
    fn full_history_produces_all_signals() {
        let (body, count) = format_market(&quote(), &history(60));
        assert_eq!(count, 5);
        assert!(body.contains("**Price**: $41.27"));
        assert!(body.contains("52-week range"));
        assert!(body.contains("SMA-20"));
        assert!(body.contains("20-session change"));
        assert!(body.contains("0.9x 30-day average"));
    }

    #[test]
    fn short_history_degrades_gracefully() {
        let (body, count) = format_market(&quote(), &history(5));
        assert_eq!(count, 2);
        assert!(body.contains("**Price**"));
        assert!(!body.contains("SMA-20"));
    }
}

//! Fundamentals gatherer: SEC EDGAR XBRL financials supplemented with a
//! Yahoo valuation snapshot.

use async_trait::async_trait;
use chrono::Utc;

use edgar_client::{latest_annual, DataPoint, EdgarClient, FinancialHistory};
use research_core::{GatherError, GatherRequest, Gatherer, ResearchReport, Source};
use yahoo_client::{FundamentalsSummary, YahooClient};

use crate::format::{format_number, report_header, trend_suffix};

pub struct FundamentalsGatherer {
    edgar: EdgarClient,
    yahoo: YahooClient,
}

impl FundamentalsGatherer {
    pub fn new() -> Self {
        Self {
            edgar: EdgarClient::new(),
            yahoo: YahooClient::new(),
        }
    }
}

impl Default for FundamentalsGatherer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gatherer for FundamentalsGatherer {
    fn source(&self) -> Source {
        Source::Fundamentals
    }

    async fn gather(&self, request: &GatherRequest) -> Result<ResearchReport, GatherError> {
        let cik = self.edgar.resolve_cik(&request.ticker).await?;

        let history = match &cik {
            Some(cik) => self.edgar.financial_history(cik).await?,
            None => {
                tracing::info!(ticker = %request.ticker, "no SEC CIK; EDGAR skipped");
                FinancialHistory::default()
            }
        };

        // The Yahoo snapshot is supplementary; its absence is not fatal
        let summary = match self.yahoo.fundamentals(&request.ticker).await {
            Ok(summary) => Some(summary),
            Err(e) if e.is_no_data() => None,
            Err(e) => {
                tracing::warn!(ticker = %request.ticker, "Yahoo supplement failed: {e}");
                None
            }
        };

        if history.is_empty() && summary.is_none() {
            return Err(GatherError::NoData(format!(
                "no fundamental data found for ${}",
                request.ticker
            )));
        }

        let generated_at = Utc::now();
        let extra = cik
            .as_ref()
            .map(|cik| vec![format!("SEC CIK: {}", cik)])
            .unwrap_or_default();

        let mut markdown = report_header("Fundamentals", request, generated_at, &extra);
        markdown.push_str(&format_fundamentals(&history, summary.as_ref()));

        Ok(ResearchReport {
            ticker: request.ticker.clone(),
            company: request.company.clone(),
            source: Source::Fundamentals,
            generated_at,
            markdown,
            item_count: history.metric_count(),
        })
    }
}

fn annual_values(points: &[DataPoint]) -> Vec<&DataPoint> {
    // One point per fiscal year, preferring the FY-period entry
    let mut by_year: std::collections::BTreeMap<i64, &DataPoint> = std::collections::BTreeMap::new();
    for point in points.iter().filter(|p| p.is_annual()) {
        let Some(fy) = point.fiscal_year else { continue };
        let entry = by_year.entry(fy).or_insert(point);
        if point.fiscal_period.as_deref() == Some("FY") {
            *entry = point;
        }
    }
    by_year.into_values().collect()
}

fn latest_with_trend(points: &[DataPoint], label: &str, prefix: &str) -> Option<String> {
    let latest = latest_annual(points)?;
    let annuals = annual_values(points);
    let trend = if annuals.len() >= 2 {
        trend_suffix(
            Some(annuals[annuals.len() - 2].value),
            Some(annuals[annuals.len() - 1].value),
        )
    } else {
        String::new()
    };

    let period = latest
        .fiscal_year
        .map(|fy| format!("FY{}", fy))
        .unwrap_or_else(|| latest.end_date.clone());
    Some(format!(
        "- **{}**: {} ({}){}\n",
        label,
        format_number(latest.value, prefix),
        period,
        trend
    ))
}

fn latest_value(history_table: &std::collections::BTreeMap<String, Vec<DataPoint>>, metric: &str) -> Option<f64> {
    history_table
        .get(metric)
        .and_then(|points| latest_annual(points))
        .map(|p| p.value)
}

pub fn format_fundamentals(
    history: &FinancialHistory,
    summary: Option<&FundamentalsSummary>,
) -> String {
    let mut out = String::new();

    if let Some(s) = summary {
        out.push_str("## Valuation Snapshot\n\n");
        let mut line = |label: &str, text: Option<String>| {
            if let Some(text) = text {
                out.push_str(&format!("- **{}**: {}\n", label, text));
            }
        };
        line("Market Cap", s.market_cap.map(|v| format_number(v, "$")));
        line("P/E (Trailing)", s.trailing_pe.map(|v| format!("{:.1}", v)));
        line("P/E (Forward)", s.forward_pe.map(|v| format!("{:.1}", v)));
        line("P/B", s.price_to_book.map(|v| format!("{:.2}", v)));
        line("Dividend Yield", s.dividend_yield.map(|v| format!("{:.2}%", v)));
        line("Beta", s.beta.map(|v| format!("{:.2}", v)));
        if let (Some(low), Some(high)) = (s.fifty_two_week_low, s.fifty_two_week_high) {
            out.push_str(&format!("- **52-Week Range**: ${:.2} — ${:.2}\n", low, high));
        }
        out.push('\n');
    }

    if !history.income.is_empty() {
        out.push_str("## Income Statement (SEC filings)\n\n");
        for (metric, label, prefix) in [
            ("revenue", "Revenue", "$"),
            ("gross_profit", "Gross Profit", "$"),
            ("operating_income", "Operating Income", "$"),
            ("net_income", "Net Income", "$"),
            ("eps_diluted", "EPS (Diluted)", "$"),
        ] {
            if let Some(points) = history.income.get(metric) {
                if let Some(line) = latest_with_trend(points, label, prefix) {
                    out.push_str(&line);
                }
            }
        }

        if let Some(margins) = margins_line(history) {
            out.push_str(&margins);
        }
        out.push('\n');

        if let Some(table) = annual_table(history) {
            out.push_str(&table);
        }
    }

    if !history.balance_sheet.is_empty() {
        out.push_str("## Balance Sheet (SEC filings)\n\n");
        for (metric, label) in [
            ("total_assets", "Total Assets"),
            ("total_liabilities", "Total Liabilities"),
            ("stockholders_equity", "Stockholders' Equity"),
            ("cash", "Cash & Equivalents"),
            ("long_term_debt", "Long-Term Debt"),
        ] {
            if let Some(points) = history.balance_sheet.get(metric) {
                if let Some(line) = latest_with_trend(points, label, "$") {
                    out.push_str(&line);
                }
            }
        }

        if let Some(ratios) = ratios_line(history) {
            out.push_str(&ratios);
        }
        out.push('\n');
    }

    if !history.cash_flow.is_empty() {
        out.push_str("## Cash Flow (SEC filings)\n\n");
        for (metric, label) in [
            ("operating_cash_flow", "Operating Cash Flow"),
            ("capex", "Capital Expenditures"),
            ("dividends_paid", "Dividends Paid"),
        ] {
            if let Some(points) = history.cash_flow.get(metric) {
                if let Some(line) = latest_with_trend(points, label, "$") {
                    out.push_str(&line);
                }
            }
        }

        let ocf = latest_value(&history.cash_flow, "operating_cash_flow");
        let capex = latest_value(&history.cash_flow, "capex");
        if let (Some(ocf), Some(capex)) = (ocf, capex) {
            out.push_str(&format!(
                "- **Free Cash Flow**: {}\n",
                format_number(ocf - capex.abs(), "$")
            ));
        }
        out.push('\n');
    }

    if history.is_empty() {
        out.push_str("*No SEC EDGAR XBRL data found for this ticker.*\n");
        out.push_str("*The company may file under a different CIK or not be US-listed.*\n");
    }

    out
}

fn margins_line(history: &FinancialHistory) -> Option<String> {
    let revenue = latest_value(&history.income, "revenue").filter(|v| *v > 0.0)?;
    let mut parts = Vec::new();

    if let Some(gp) = latest_value(&history.income, "gross_profit") {
        parts.push(format!("Gross: {:.1}%", gp / revenue * 100.0));
    }
    if let Some(oi) = latest_value(&history.income, "operating_income") {
        parts.push(format!("Operating: {:.1}%", oi / revenue * 100.0));
    }
    if let Some(ni) = latest_value(&history.income, "net_income") {
        parts.push(format!("Net: {:.1}%", ni / revenue * 100.0));
    }

    (!parts.is_empty()).then(|| format!("- **Margins**: {}\n", parts.join(" | ")))
}

fn ratios_line(history: &FinancialHistory) -> Option<String> {
    let mut parts = Vec::new();

    let equity = latest_value(&history.balance_sheet, "stockholders_equity");
    let liabilities = latest_value(&history.balance_sheet, "total_liabilities");
    if let (Some(equity), Some(liabilities)) = (equity, liabilities) {
        if equity != 0.0 {
            parts.push(format!("D/E: {:.2}", liabilities / equity));
        }
    }

    let current_assets = latest_value(&history.balance_sheet, "current_assets");
    let current_liabilities = latest_value(&history.balance_sheet, "current_liabilities");
    if let (Some(ca), Some(cl)) = (current_assets, current_liabilities) {
        if cl != 0.0 {
            parts.push(format!("Current: {:.2}", ca / cl));
        }
    }

    let cash = latest_value(&history.balance_sheet, "cash");
    let debt = latest_value(&history.balance_sheet, "long_term_debt");
    if let (Some(cash), Some(debt)) = (cash, debt) {
        parts.push(format!("Net Debt: {}", format_number(debt - cash, "$")));
    }

    (!parts.is_empty()).then(|| format!("- **Key Ratios**: {}\n", parts.join(" | ")))
}

/// Annual revenue/net income/EPS table, only when there are at least two
/// fiscal years to compare.
fn annual_table(history: &FinancialHistory) -> Option<String> {
    let revenue = history.income.get("revenue")?;
    let annual_revenue = annual_values(revenue);
    if annual_revenue.len() < 2 {
        return None;
    }

    let net_income = history.income.get("net_income").map(|p| annual_values(p)).unwrap_or_default();
    let eps = history.income.get("eps_diluted").map(|p| annual_values(p)).unwrap_or_default();
    let lookup = |points: &[&DataPoint], end_date: &str| -> String {
        points
            .iter()
            .find(|p| p.end_date == end_date)
            .map(|p| format_number(p.value, "$"))
            .unwrap_or_else(|| "—".to_string())
    };

    let mut out = String::from("### Annual History\n\n");
    out.push_str("| Fiscal Year | Revenue | Net Income | EPS |\n");
    out.push_str("|-------------|---------|------------|-----|\n");
    for point in annual_revenue.iter().rev().take(5).rev() {
        let fy = point
            .fiscal_year
            .map(|fy| format!("FY{}", fy))
            .unwrap_or_else(|| point.end_date.clone());
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            fy,
            format_number(point.value, "$"),
            lookup(&net_income, &point.end_date),
            lookup(&eps, &point.end_date),
        ));
    }
    out.push('\n');
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(value: f64, end: &str, form: &str, fy: i64, fp: &str) -> DataPoint {
        DataPoint {
            value,
            end_date: end.to_string(),
            form: form.to_string(),
            fiscal_year: Some(fy),
            fiscal_period: Some(fp.to_string()),
        }
    }

    fn history_fixture() -> FinancialHistory {
        let mut history = FinancialHistory::default();
        history.income.insert(
            "revenue".into(),
            vec![
                point(3.0e9, "2023-12-31", "10-K", 2023, "FY"),
                point(3.3e9, "2024-12-31", "10-K", 2024, "FY"),
                point(8.0e8, "2025-03-31", "10-Q", 2025, "Q1"),
            ],
        );
        history.income.insert(
            "net_income".into(),
            vec![
                point(2.0e8, "2023-12-31", "10-K", 2023, "FY"),
                point(2.5e8, "2024-12-31", "10-K", 2024, "FY"),
            ],
        );
        history.balance_sheet.insert(
            "total_liabilities".into(),
            vec![point(2.4e9, "2024-12-31", "10-K", 2024, "FY")],
        );
        history.balance_sheet.insert(
            "stockholders_equity".into(),
            vec![point(1.2e9, "2024-12-31", "10-K", 2024, "FY")],
        );
        history.cash_flow.insert(
            "operating_cash_flow".into(),
            vec![point(4.0e8, "2024-12-31", "10-K", 2024, "FY")],
        );
        history.cash_flow.insert(
            "capex".into(),
            vec![point(1.5e8, "2024-12-31", "10-K", 2024, "FY")],
        );
        history
    }

    #[test]
    fn report_has_sections_trends_and_derived_values() {
        let body = format_fundamentals(&history_fixture(), None);

        assert!(body.contains("## Income Statement"));
        assert!(body.contains("**Revenue**: $3.3B (FY2024) ↑ +10.0% YoY"));
        assert!(body.contains("**Margins**: Net: 7.6%"));
        assert!(body.contains("D/E: 2.00"));
        assert!(body.contains("**Free Cash Flow**: $250.0M"));
        assert!(body.contains("| FY2024 | $3.3B | $250.0M | — |"));
    }

    #[test]
    fn latest_values_prefer_annual_over_quarterly() {
        let history = history_fixture();
        assert_eq!(latest_value(&history.income, "revenue"), Some(3.3e9));
    }

    #[test]
    fn empty_history_renders_fallback_note() {
        let body = format_fundamentals(&FinancialHistory::default(), None);
        assert!(body.contains("No SEC EDGAR XBRL data"));
    }

    #[test]
    fn yahoo_snapshot_renders_when_present() {
        let summary = FundamentalsSummary {
            symbol: "CAKE".into(),
            market_cap: Some(2.05e9),
            trailing_pe: Some(12.3),
            forward_pe: None,
            price_to_book: None,
            dividend_yield: Some(2.41),
            beta: None,
            eps_trailing: None,
            fifty_two_week_high: Some(48.0),
            fifty_two_week_low: Some(30.5),
        };

        let body = format_fundamentals(&FinancialHistory::default(), Some(&summary));
        assert!(body.contains("## Valuation Snapshot"));
        assert!(body.contains("**Market Cap**: $2.1B"));
        assert!(body.contains("**52-Week Range**: $30.50 — $48.00"));
    }
}

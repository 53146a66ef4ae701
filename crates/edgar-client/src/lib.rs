//! SEC EDGAR client: ticker-to-CIK resolution and XBRL companyfacts.
//!
//! EDGAR requires a User-Agent that carries contact info; set
//! `EDGAR_CONTACT` to your email, the default is a placeholder the SEC will
//! eventually throttle.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use research_core::GatherError;

const TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";
const FACTS_BASE: &str = "https://data.sec.gov/api/xbrl/companyfacts";

const DEFAULT_CONTACT: &str = "GradientResearchAssistant research@example.com";

/// How many years of filings to keep when extracting metric history.
pub const HISTORY_YEARS: i32 = 5;

/// US-GAAP concept fallback lists per metric; companies vary in which
/// concept they report under, so each is tried in order.
const INCOME_CONCEPTS: &[(&str, &[&str])] = &[
    (
        "revenue",
        &[
            "RevenueFromContractWithCustomerExcludingAssessedTax",
            "RevenueFromContractWithCustomerIncludingAssessedTax",
            "Revenues",
            "SalesRevenueNet",
        ],
    ),
    ("gross_profit", &["GrossProfit"]),
    ("operating_income", &["OperatingIncomeLoss"]),
    ("net_income", &["NetIncomeLoss", "ProfitLoss"]),
    ("eps_diluted", &["EarningsPerShareDiluted"]),
];

const BALANCE_CONCEPTS: &[(&str, &[&str])] = &[
    ("total_assets", &["Assets"]),
    ("total_liabilities", &["Liabilities"]),
    (
        "stockholders_equity",
        &[
            "StockholdersEquity",
            "StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
        ],
    ),
    (
        "cash",
        &[
            "CashAndCashEquivalentsAtCarryingValue",
            "CashCashEquivalentsAndShortTermInvestments",
        ],
    ),
    (
        "long_term_debt",
        &["LongTermDebt", "LongTermDebtNoncurrent"],
    ),
    ("current_assets", &["AssetsCurrent"]),
    ("current_liabilities", &["LiabilitiesCurrent"]),
];

const CASH_FLOW_CONCEPTS: &[(&str, &[&str])] = &[
    (
        "operating_cash_flow",
        &["NetCashProvidedByOperatingActivities"],
    ),
    (
        "capex",
        &[
            "PaymentsToAcquirePropertyPlantAndEquipment",
            "PaymentsToAcquireProductiveAssets",
        ],
    ),
    (
        "dividends_paid",
        &["PaymentsOfDividends", "PaymentsOfDividendsCommonStock"],
    ),
];

/// One reported value for a metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPoint {
    pub value: f64,
    pub end_date: String,
    pub form: String,
    pub fiscal_year: Option<i64>,
    pub fiscal_period: Option<String>,
}

impl DataPoint {
    pub fn is_annual(&self) -> bool {
        self.form.replace("/A", "") == "10-K"
    }
}

/// Extracted metric history, keyed by metric name within each statement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialHistory {
    pub income: BTreeMap<String, Vec<DataPoint>>,
    pub balance_sheet: BTreeMap<String, Vec<DataPoint>>,
    pub cash_flow: BTreeMap<String, Vec<DataPoint>>,
}

impl FinancialHistory {
    pub fn metric_count(&self) -> usize {
        self.income.len() + self.balance_sheet.len() + self.cash_flow.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metric_count() == 0
    }
}

#[derive(Clone)]
pub struct EdgarClient {
    client: reqwest::Client,
}

impl EdgarClient {
    pub fn new() -> Self {
        let contact =
            std::env::var("EDGAR_CONTACT").unwrap_or_else(|_| DEFAULT_CONTACT.to_string());
        let client = reqwest::Client::builder()
            .user_agent(contact)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }

    /// Look up the zero-padded 10-digit CIK for a ticker. `Ok(None)` means
    /// the ticker is not in the SEC's mapping (e.g. not US-listed).
    pub async fn resolve_cik(&self, ticker: &str) -> Result<Option<String>, GatherError> {
        let json: Value = self.get_json(TICKERS_URL).await?;

        let ticker = ticker.to_uppercase();
        let found = json
            .as_object()
            .into_iter()
            .flat_map(|map| map.values())
            .find(|entry| {
                entry
                    .get("ticker")
                    .and_then(|t| t.as_str())
                    .is_some_and(|t| t.eq_ignore_ascii_case(&ticker))
            })
            .and_then(|entry| entry.get("cik_str"))
            .and_then(|cik| cik.as_u64())
            .map(|cik| format!("{:010}", cik));

        Ok(found)
    }

    /// Fetch the full XBRL companyfacts document for a CIK.
    pub async fn company_facts(&self, cik: &str) -> Result<Value, GatherError> {
        let url = format!("{}/CIK{}.json", FACTS_BASE, cik);
        self.get_json(&url).await
    }

    /// Resolve + fetch + extract in one call, filtered to the last
    /// [`HISTORY_YEARS`] of 10-K/10-Q filings.
    pub async fn financial_history(
        &self,
        cik: &str,
    ) -> Result<FinancialHistory, GatherError> {
        let facts = self.company_facts(cik).await?;
        Ok(extract_financials(&facts, Utc::now().year() - HISTORY_YEARS))
    }

    async fn get_json(&self, url: &str) -> Result<Value, GatherError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| GatherError::Network(format!("EDGAR request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GatherError::RateLimited("EDGAR returned 429".to_string()));
        }
        if !status.is_success() {
            return Err(GatherError::Network(format!("EDGAR returned HTTP {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| GatherError::Network(format!("EDGAR response was not JSON: {e}")))
    }
}

impl Default for EdgarClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract metric history from a companyfacts document. Filters to 10-K/10-Q
/// filings ending on or after `cutoff_year`, deduplicating amended filings
/// per period.
pub fn extract_financials(facts: &Value, cutoff_year: i32) -> FinancialHistory {
    let mut history = FinancialHistory::default();

    for (table, concepts) in [
        (&mut history.income, INCOME_CONCEPTS),
        (&mut history.balance_sheet, BALANCE_CONCEPTS),
        (&mut history.cash_flow, CASH_FLOW_CONCEPTS),
    ] {
        for (metric, concept_names) in concepts {
            let points = extract_concept(facts, concept_names, cutoff_year);
            if !points.is_empty() {
                table.insert(metric.to_string(), points);
            }
        }
    }

    history
}

fn extract_concept(facts: &Value, concept_names: &[&str], cutoff_year: i32) -> Vec<DataPoint> {
    let us_gaap = facts.pointer("/facts/us-gaap");

    for concept_name in concept_names {
        let units = match us_gaap
            .and_then(|g| g.get(*concept_name))
            .and_then(|c| c.get("units"))
            .and_then(|u| u.as_object())
        {
            Some(units) => units,
            None => continue,
        };

        // Values may sit under USD, USD/shares, shares, or pure
        for unit_type in ["USD", "USD/shares", "shares", "pure"] {
            let entries = match units.get(unit_type).and_then(|e| e.as_array()) {
                Some(entries) => entries,
                None => continue,
            };

            let mut points: Vec<DataPoint> = entries
                .iter()
                .filter_map(|entry| parse_entry(entry, cutoff_year))
                .collect();
            if points.is_empty() {
                continue;
            }

            points.sort_by(|a, b| a.end_date.cmp(&b.end_date));

            // Keep one filing per (period, form); amendments dedupe away
            let mut seen = std::collections::HashSet::new();
            points.retain(|p| seen.insert((p.end_date.clone(), p.form.replace("/A", ""))));
            return points;
        }
    }

    Vec::new()
}

fn parse_entry(entry: &Value, cutoff_year: i32) -> Option<DataPoint> {
    let form = entry.get("form")?.as_str()?;
    if !matches!(form, "10-K" | "10-Q" | "10-K/A" | "10-Q/A") {
        return None;
    }

    let end_date = entry.get("end")?.as_str()?;
    let end_year: i32 = end_date.get(..4)?.parse().ok()?;
    if end_year < cutoff_year {
        return None;
    }

    Some(DataPoint {
        value: entry.get("val")?.as_f64()?,
        end_date: end_date.to_string(),
        form: form.to_string(),
        fiscal_year: entry.get("fy").and_then(|v| v.as_i64()),
        fiscal_period: entry
            .get("fp")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
    })
}

/// Latest point, preferring annual (10-K) filings.
pub fn latest_annual(points: &[DataPoint]) -> Option<&DataPoint> {
    points.iter().rev().find(|p| p.is_annual()).or_else(|| points.last())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn facts_fixture() -> Value {
        json!({
            "facts": {
                "us-gaap": {
                    "Revenues": {
                        "units": {
                            "USD": [
                                {"val": 3.0e9, "end": "2023-12-31", "form": "10-K", "fy": 2023, "fp": "FY"},
                                {"val": 3.3e9, "end": "2024-12-31", "form": "10-K", "fy": 2024, "fp": "FY"},
                                // Amendment for the same period: deduped
                                {"val": 3.31e9, "end": "2024-12-31", "form": "10-K/A", "fy": 2024, "fp": "FY"},
                                // Ancient filing: filtered by cutoff
                                {"val": 1.0e9, "end": "2012-12-31", "form": "10-K", "fy": 2012, "fp": "FY"},
                                // Registration statement form: never included
                                {"val": 9.9e9, "end": "2024-12-31", "form": "S-1"}
                            ]
                        }
                    },
                    "NetIncomeLoss": {
                        "units": {
                            "USD": [
                                {"val": 2.5e8, "end": "2024-12-31", "form": "10-K", "fy": 2024, "fp": "FY"}
                            ]
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn extracts_filters_and_dedupes() {
        let history = extract_financials(&facts_fixture(), 2020);

        let revenue = &history.income["revenue"];
        assert_eq!(revenue.len(), 2);
        assert_eq!(revenue[0].end_date, "2023-12-31");
        assert_eq!(revenue[1].end_date, "2024-12-31");
        // The original 10-K sorts before its amendment and wins the dedup
        assert_eq!(revenue[1].value, 3.3e9);

        assert_eq!(history.income["net_income"].len(), 1);
        assert_eq!(history.metric_count(), 2);
    }

    #[test]
    fn concept_fallback_tries_names_in_order() {
        let facts = json!({
            "facts": {
                "us-gaap": {
                    "ProfitLoss": {
                        "units": {
                            "USD": [
                                {"val": 1.0e8, "end": "2024-12-31", "form": "10-K", "fy": 2024, "fp": "FY"}
                            ]
                        }
                    }
                }
            }
        });

        let history = extract_financials(&facts, 2020);
        assert!(history.income.contains_key("net_income"));
    }

    #[test]
    fn empty_facts_mean_empty_history() {
        let history = extract_financials(&json!({}), 2020);
        assert!(history.is_empty());
    }

    #[test]
    fn latest_annual_prefers_10k() {
        let points = vec![
            DataPoint {
                value: 1.0,
                end_date: "2024-12-31".into(),
                form: "10-K".into(),
                fiscal_year: Some(2024),
                fiscal_period: Some("FY".into()),
            },
            DataPoint {
                value: 2.0,
                end_date: "2025-03-31".into(),
                form: "10-Q".into(),
                fiscal_year: Some(2025),
                fiscal_period: Some("Q1".into()),
            },
        ];
        assert_eq!(latest_annual(&points).unwrap().value, 1.0);
    }
}

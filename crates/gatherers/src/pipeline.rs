//! Per-ticker gather pipeline: run each selected source with error
//! isolation, package successes for upload, and build the one-line summary
//! used for inter-agent notifications.

use chrono::{DateTime, Utc};
use serde::Serialize;

use report_store::{package, StoredReport};
use research_core::{GatherError, GatherRequest, Gatherer, ResearchReport, Source};

use crate::{FundamentalsGatherer, MarketGatherer, NewsGatherer, SocialGatherer};

/// Delay between sources so the upstream APIs are not hammered in a burst.
const INTER_SOURCE_DELAY_MS: u64 = 200;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SourceResult {
    Gathered { item_count: usize },
    NothingNew { reason: String },
    Failed { error: String },
}

#[derive(Debug, Serialize)]
pub struct SourceOutcome {
    pub source: Source,
    #[serde(flatten)]
    pub result: SourceResult,
}

#[derive(Debug, Serialize)]
pub struct PipelineOutcome {
    pub ticker: String,
    pub company: String,
    pub timestamp: DateTime<Utc>,
    pub outcomes: Vec<SourceOutcome>,
    #[serde(skip)]
    pub reports: Vec<ResearchReport>,
    pub stored: Vec<StoredReport>,
    pub summary: String,
    pub success: bool,
    pub dry_run: bool,
}

impl PipelineOutcome {
    /// All gathered Markdown joined for `--output`.
    pub fn combined_markdown(&self) -> String {
        self.reports
            .iter()
            .map(|r| r.markdown.as_str())
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }
}

pub struct GatherPipeline {
    news: NewsGatherer,
    fundamentals: FundamentalsGatherer,
    social: SocialGatherer,
    market: MarketGatherer,
}

impl GatherPipeline {
    pub fn new() -> Self {
        Self {
            news: NewsGatherer::new(),
            fundamentals: FundamentalsGatherer::new(),
            social: SocialGatherer::new(),
            market: MarketGatherer::new(),
        }
    }

    fn gatherer(&self, source: Source) -> &dyn Gatherer {
        match source {
            Source::News => &self.news,
            Source::Fundamentals => &self.fundamentals,
            Source::Social => &self.social,
            Source::Market => &self.market,
        }
    }

    /// Run `sources` for one ticker. Every source runs even when an earlier
    /// one fails; `dry_run` skips upload packaging.
    pub async fn run(
        &self,
        request: &GatherRequest,
        sources: &[Source],
        dry_run: bool,
    ) -> PipelineOutcome {
        let timestamp = Utc::now();
        let mut outcomes = Vec::new();
        let mut reports = Vec::new();
        let mut stored = Vec::new();

        for (i, &source) in sources.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(INTER_SOURCE_DELAY_MS)).await;
            }

            match self.gatherer(source).gather(request).await {
                Ok(report) => {
                    tracing::info!(ticker = %request.ticker, %source, items = report.item_count, "gathered");
                    if !dry_run {
                        stored.push(package(&report));
                    }
                    outcomes.push(SourceOutcome {
                        source,
                        result: SourceResult::Gathered {
                            item_count: report.item_count,
                        },
                    });
                    reports.push(report);
                }
                Err(GatherError::NoData(reason)) => {
                    tracing::info!(ticker = %request.ticker, %source, "nothing new: {reason}");
                    outcomes.push(SourceOutcome {
                        source,
                        result: SourceResult::NothingNew { reason },
                    });
                }
                Err(e) => {
                    tracing::warn!(ticker = %request.ticker, %source, "gather failed: {e}");
                    outcomes.push(SourceOutcome {
                        source,
                        result: SourceResult::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        let summary = build_summary(&request.ticker, &outcomes);
        let success = !reports.is_empty();

        PipelineOutcome {
            ticker: request.ticker.clone(),
            company: request.company.clone(),
            timestamp,
            outcomes,
            reports,
            stored,
            summary,
            success,
            dry_run,
        }
    }
}

impl Default for GatherPipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn build_summary(ticker: &str, outcomes: &[SourceOutcome]) -> String {
    let gathered: Vec<String> = outcomes
        .iter()
        .filter_map(|o| match &o.result {
            SourceResult::Gathered { item_count } => Some(o.source.summary_label(*item_count)),
            _ => None,
        })
        .collect();

    let mut summary = if gathered.is_empty() {
        format!("${}: no new data gathered", ticker)
    } else {
        format!("${}: {}", ticker, gathered.join(", "))
    };

    let failed: Vec<&str> = outcomes
        .iter()
        .filter_map(|o| match &o.result {
            SourceResult::Failed { .. } => Some(o.source.as_str()),
            _ => None,
        })
        .collect();
    if !failed.is_empty() {
        summary.push_str(&format!(" (failed: {})", failed.join(", ")));
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(source: Source, result: SourceResult) -> SourceOutcome {
        SourceOutcome { source, result }
    }

    #[test]
    fn summary_lists_successes_and_failures() {
        let outcomes = vec![
            outcome(Source::News, SourceResult::Gathered { item_count: 12 }),
            outcome(
                Source::Fundamentals,
                SourceResult::Gathered { item_count: 9 },
            ),
            outcome(
                Source::Social,
                SourceResult::Failed {
                    error: "rate limited".into(),
                },
            ),
            outcome(
                Source::Market,
                SourceResult::NothingNew {
                    reason: "no chart".into(),
                },
            ),
        ];

        let summary = build_summary("CAKE", &outcomes);
        assert_eq!(
            summary,
            "$CAKE: 12 articles, 9 financial metrics (failed: social)"
        );
    }

    #[test]
    fn summary_when_nothing_gathered() {
        let outcomes = vec![outcome(
            Source::News,
            SourceResult::NothingNew {
                reason: "empty feed".into(),
            },
        )];
        assert_eq!(build_summary("CAKE", &outcomes), "$CAKE: no new data gathered");
    }
}

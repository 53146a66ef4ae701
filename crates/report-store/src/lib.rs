//! Packaging for the two delivery paths: object-storage upload and chat
//! alerts. The upload itself and the chat transport are external
//! collaborators; this crate only decides keys and message bodies.

mod templates;

pub use templates::ChatTemplate;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use research_core::{ResearchReport, SignificanceScore, Source};

/// A report packaged for upload: storage key plus Markdown body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReport {
    pub key: String,
    pub body: String,
}

/// Key layout: `research/{YYYY-MM-DD}/{TICKER}_{source}.md`, one file per
/// source per day so re-gathers overwrite rather than accumulate.
pub fn object_key(date: NaiveDate, ticker: &str, source: Source) -> String {
    format!("research/{}/{}_{}.md", date.format("%Y-%m-%d"), ticker, source)
}

pub fn package(report: &ResearchReport) -> StoredReport {
    StoredReport {
        key: object_key(report.generated_at.date_naive(), &report.ticker, report.source),
        body: report.markdown.clone(),
    }
}

/// An alert bound for chat delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AlertKind {
    /// A scored finding that cleared the significance threshold.
    SignificantFinding {
        company: String,
        source: Source,
        score: SignificanceScore,
    },
    /// End-of-pipeline summary for inter-agent notifications.
    GatherSummary {
        ticker: String,
        summary: String,
        stored_keys: Vec<String>,
    },
}

impl Alert {
    pub fn new(kind: AlertKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn key_layout() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(
            object_key(date, "CAKE", Source::Fundamentals),
            "research/2026-08-06/CAKE_fundamentals.md"
        );
    }

    #[test]
    fn package_uses_report_date_and_source() {
        let report = ResearchReport {
            ticker: "CAKE".into(),
            company: "The Cheesecake Factory".into(),
            source: Source::News,
            generated_at: Utc.with_ymd_and_hms(2026, 8, 6, 14, 30, 0).unwrap(),
            markdown: "# Report".into(),
            item_count: 3,
        };

        let stored = package(&report);
        assert_eq!(stored.key, "research/2026-08-06/CAKE_news.md");
        assert_eq!(stored.body, "# Report");
    }
}

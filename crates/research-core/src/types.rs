use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies one of the external research data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// News RSS headlines
    News,
    /// SEC EDGAR XBRL financials
    Fundamentals,
    /// Reddit discussion
    Social,
    /// Yahoo Finance price/volume data
    Market,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::News,
        Source::Fundamentals,
        Source::Social,
        Source::Market,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::News => "news",
            Source::Fundamentals => "fundamentals",
            Source::Social => "social",
            Source::Market => "market",
        }
    }

    pub fn parse(s: &str) -> Option<Source> {
        match s.trim().to_lowercase().as_str() {
            "news" => Some(Source::News),
            "fundamentals" => Some(Source::Fundamentals),
            "social" => Some(Source::Social),
            "market" => Some(Source::Market),
            _ => None,
        }
    }

    /// Human-readable label for a gather summary line.
    pub fn summary_label(&self, count: usize) -> String {
        match self {
            Source::News => format!("{} articles", count),
            Source::Fundamentals => format!("{} financial metrics", count),
            Source::Social => format!("{} social posts", count),
            Source::Market => format!("{} market signals", count),
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A gathered research report. Ephemeral: produced by a gatherer and consumed
/// immediately by the scorer or upload packaging, never persisted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchReport {
    pub ticker: String,
    pub company: String,
    pub source: Source,
    pub generated_at: DateTime<Utc>,
    pub markdown: String,
    /// Number of data points behind the report (articles, metrics, posts...)
    pub item_count: usize,
}

/// Result of the two-pass significance scorer. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignificanceScore {
    pub ticker: String,
    /// 1-10, where 10 is most noteworthy
    pub score: u8,
    pub rationale: String,
    /// Strong-model elaboration, present only when score reached the threshold
    pub deep_analysis: Option<String>,
}

/// A news article parsed from an RSS feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub link: String,
    pub published: Option<String>,
    pub outlet: Option<String>,
    pub description: Option<String>,
}

/// Strip a leading `$` and uppercase, so `$cake` and `cake` both become `CAKE`.
pub fn normalize_ticker(symbol: &str) -> String {
    symbol.trim().trim_start_matches('$').to_uppercase()
}

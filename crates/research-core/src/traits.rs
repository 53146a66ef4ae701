use async_trait::async_trait;

use crate::{normalize_ticker, GatherError, ResearchReport, Source};

/// Input to a gather call.
#[derive(Debug, Clone)]
pub struct GatherRequest {
    pub ticker: String,
    pub company: String,
    pub theme: Option<String>,
    pub directive: Option<String>,
}

impl GatherRequest {
    pub fn new(ticker: &str, company: &str) -> Self {
        Self {
            ticker: normalize_ticker(ticker),
            company: company.trim().to_string(),
            theme: None,
            directive: None,
        }
    }

    pub fn with_theme(mut self, theme: Option<String>) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_directive(mut self, directive: Option<String>) -> Self {
        self.directive = directive;
        self
    }
}

/// A single external research data source.
#[async_trait]
pub trait Gatherer: Send + Sync {
    fn source(&self) -> Source;

    async fn gather(&self, request: &GatherRequest) -> Result<ResearchReport, GatherError>;
}

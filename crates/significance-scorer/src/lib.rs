//! Two-pass significance scorer.
//!
//! Pass 1 asks a cheap model for an integer 1-10 plus a one-line rationale;
//! pass 2 runs only when the score clears the threshold and asks the strong
//! model for a fuller analysis. The two-tier split exists to control
//! inference cost: most findings die at the cheap pass.
//!
//! Inference failures are not retried here; they propagate and the caller
//! skips the ticker until the next heartbeat. An unparseable reply is NOT a
//! failure: the score falls back to the conservative mid-value and the
//! rationale records what happened.

mod backend;

pub use backend::{InferenceBackend, OpenAiBackend};

use thiserror::Error;

use research_core::SignificanceScore;

/// Fallback when the cheap pass returns no parseable score.
pub const FALLBACK_SCORE: u8 = 5;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("inference request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("inference service error: {0}")]
    Service(String),

    #[error("inference returned an empty completion")]
    EmptyCompletion,

    #[error("inference not configured: {0}")]
    Config(String),
}

#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub cheap_model: String,
    pub strong_model: String,
    /// Scores at or above this get the strong-model second pass.
    pub threshold: u8,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            cheap_model: "gpt-4o-mini".to_string(),
            strong_model: "gpt-4o".to_string(),
            threshold: 5,
        }
    }
}

const SCREEN_SYSTEM: &str = "You are a research significance screener for a stock watchlist. \
Rate how noteworthy the given research is for an investor tracking this company. \
Reply with exactly one line: SCORE: <integer 1-10> — <one-line rationale>.";

const DEEP_SYSTEM: &str = "You are a senior equity research analyst. Write a concise analysis \
of the given research: what happened, why it matters for the company, key risks, and what to \
watch next. Use short Markdown sections.";

pub struct SignificanceScorer {
    backend: Box<dyn InferenceBackend>,
    config: ScorerConfig,
}

impl SignificanceScorer {
    pub fn new(backend: Box<dyn InferenceBackend>, config: ScorerConfig) -> Self {
        Self { backend, config }
    }

    /// Run the two-pass scoring over one gathered report.
    pub async fn score(
        &self,
        ticker: &str,
        report: &str,
    ) -> Result<SignificanceScore, InferenceError> {
        let screen_prompt = format!("Ticker: ${}\n\nResearch:\n{}", ticker, report);
        let reply = self
            .backend
            .complete(&self.config.cheap_model, SCREEN_SYSTEM, &screen_prompt)
            .await?;

        let (score, rationale) = match parse_score(&reply) {
            Some(score) => (score, extract_rationale(&reply)),
            None => {
                tracing::warn!(ticker, "unparseable screen reply, falling back to {}", FALLBACK_SCORE);
                (
                    FALLBACK_SCORE,
                    format!("score unparseable from model reply; defaulted to {}", FALLBACK_SCORE),
                )
            }
        };

        let deep_analysis = if score >= self.config.threshold {
            let deep_prompt = format!(
                "Ticker: ${}\nSignificance score: {}/10\n\nResearch:\n{}",
                ticker, score, report
            );
            Some(
                self.backend
                    .complete(&self.config.strong_model, DEEP_SYSTEM, &deep_prompt)
                    .await?,
            )
        } else {
            None
        };

        Ok(SignificanceScore {
            ticker: ticker.to_string(),
            score,
            rationale,
            deep_analysis,
        })
    }
}

/// First integer in 1..=10 found in the reply. Tolerates prose around the
/// number and the "SCORE: n" shape the prompt asks for.
pub fn parse_score(reply: &str) -> Option<u8> {
    reply
        .split(|c: char| !c.is_ascii_digit())
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse::<u8>().ok())
        .find(|n| (1..=10).contains(n))
}

/// Everything after the score separator, or the whole (trimmed) reply.
fn extract_rationale(reply: &str) -> String {
    let first_line = reply.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let rationale = first_line
        .split_once('—')
        .or_else(|| first_line.split_once('-').filter(|(head, _)| head.contains("SCORE")))
        .map(|(_, tail)| tail)
        .unwrap_or(first_line);
    rationale.trim().to_string()
}

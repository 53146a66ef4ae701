use crate::{Alert, AlertKind};

/// Renders alerts as chat-ready Markdown.
pub struct ChatTemplate;

impl ChatTemplate {
    pub fn render(alert: &Alert) -> String {
        match &alert.kind {
            AlertKind::SignificantFinding {
                company,
                source,
                score,
            } => {
                let mut lines = vec![
                    format!(
                        "**${} ({}) — significance {}/10** [{}]",
                        score.ticker, company, score.score, source
                    ),
                    String::new(),
                    score.rationale.clone(),
                ];
                if let Some(deep) = &score.deep_analysis {
                    lines.push(String::new());
                    lines.push("**Analysis**".to_string());
                    lines.push(deep.clone());
                }
                lines.join("\n")
            }
            AlertKind::GatherSummary {
                ticker: _,
                summary,
                stored_keys,
            } => {
                let mut lines = vec![summary.clone()];
                for key in stored_keys {
                    lines.push(format!("  stored: {}", key));
                }
                lines.join("\n")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_core::{SignificanceScore, Source};

    #[test]
    fn significant_finding_includes_deep_analysis_when_present() {
        let alert = Alert::new(AlertKind::SignificantFinding {
            company: "The Cheesecake Factory".into(),
            source: Source::News,
            score: SignificanceScore {
                ticker: "CAKE".into(),
                score: 8,
                rationale: "Guidance cut announced.".into(),
                deep_analysis: Some("Margins compress because...".into()),
            },
        });

        let rendered = ChatTemplate::render(&alert);
        assert!(rendered.contains("significance 8/10"));
        assert!(rendered.contains("Guidance cut announced."));
        assert!(rendered.contains("**Analysis**"));
    }

    #[test]
    fn low_score_renders_without_analysis_section() {
        let alert = Alert::new(AlertKind::SignificantFinding {
            company: "BioNTech".into(),
            source: Source::Social,
            score: SignificanceScore {
                ticker: "BNTX".into(),
                score: 3,
                rationale: "Routine chatter.".into(),
                deep_analysis: None,
            },
        });

        assert!(!ChatTemplate::render(&alert).contains("**Analysis**"));
    }

    #[test]
    fn gather_summary_lists_stored_keys() {
        let alert = Alert::new(AlertKind::GatherSummary {
            ticker: "CAKE".into(),
            summary: "$CAKE: 12 articles, 9 financial metrics".into(),
            stored_keys: vec!["research/2026-08-06/CAKE_news.md".into()],
        });

        let rendered = ChatTemplate::render(&alert);
        assert!(rendered.starts_with("$CAKE: 12 articles"));
        assert!(rendered.contains("stored: research/2026-08-06/CAKE_news.md"));
    }
}

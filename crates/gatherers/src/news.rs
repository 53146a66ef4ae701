//! News gatherer: Google News RSS search for the company, parsed with
//! quick-xml into a headline report.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use quick_xml::events::Event;
use quick_xml::Reader;

use research_core::{GatherError, GatherRequest, Gatherer, NewsArticle, ResearchReport, Source};

use crate::format::report_header;

const RSS_URL: &str = "https://news.google.com/rss/search";
const MAX_HEADLINES: usize = 15;

pub struct NewsGatherer {
    client: reqwest::Client,
}

impl NewsGatherer {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    async fn fetch_feed(&self, query: &str) -> Result<String, GatherError> {
        let response = self
            .client
            .get(RSS_URL)
            .query(&[("q", query), ("hl", "en-US"), ("gl", "US"), ("ceid", "US:en")])
            .send()
            .await
            .map_err(|e| GatherError::Network(format!("news feed request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GatherError::RateLimited("news feed returned 429".to_string()));
        }
        if !status.is_success() {
            return Err(GatherError::Network(format!("news feed returned HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| GatherError::Network(format!("news feed read failed: {e}")))
    }
}

impl Default for NewsGatherer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gatherer for NewsGatherer {
    fn source(&self) -> Source {
        Source::News
    }

    async fn gather(&self, request: &GatherRequest) -> Result<ResearchReport, GatherError> {
        let query = format!("\"{}\" {} stock", request.company, request.ticker);
        let xml = self.fetch_feed(&query).await?;

        let articles = parse_rss(&xml);
        if articles.is_empty() {
            return Err(GatherError::NoData(format!(
                "no news found for ${}",
                request.ticker
            )));
        }

        let generated_at = Utc::now();
        let mut markdown = report_header("News", request, generated_at, &[]);
        markdown.push_str("## Recent Headlines\n\n");

        for article in articles.iter().take(MAX_HEADLINES) {
            let outlet = article
                .outlet
                .as_deref()
                .map(|o| format!(" — {}", o))
                .unwrap_or_default();
            let published = article
                .published
                .as_deref()
                .map(|p| format!(" ({})", p))
                .unwrap_or_default();
            let tag = headline_tag(&article.title);

            markdown.push_str(&format!(
                "- **{}**{}{}{}\n",
                article.title, outlet, published, tag
            ));
        }

        Ok(ResearchReport {
            ticker: request.ticker.clone(),
            company: request.company.clone(),
            source: Source::News,
            generated_at,
            markdown,
            item_count: articles.len().min(MAX_HEADLINES),
        })
    }
}

/// Parse RSS `<item>` elements into articles. Tolerant of malformed feeds:
/// bad XML just truncates the list.
pub fn parse_rss(xml: &str) -> Vec<NewsArticle> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut articles = Vec::new();
    let mut in_item = false;
    let mut current_tag: Vec<u8> = Vec::new();
    let mut draft = Draft::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                if name == b"item" {
                    in_item = true;
                    draft = Draft::default();
                } else if in_item {
                    current_tag = name;
                }
            }
            Ok(Event::Text(t)) if in_item => {
                if let Ok(text) = t.unescape() {
                    draft.push(&current_tag, &text);
                }
            }
            Ok(Event::CData(t)) if in_item => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                draft.push(&current_tag, &text);
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"item" {
                    in_item = false;
                    if let Some(article) = draft.take() {
                        articles.push(article);
                    }
                } else {
                    current_tag.clear();
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    articles
}

#[derive(Default)]
struct Draft {
    title: String,
    link: String,
    published: String,
    outlet: String,
    description: String,
}

impl Draft {
    fn push(&mut self, tag: &[u8], text: &str) {
        let field = match tag {
            b"title" => &mut self.title,
            b"link" => &mut self.link,
            b"pubDate" => &mut self.published,
            b"source" => &mut self.outlet,
            b"description" => &mut self.description,
            _ => return,
        };
        field.push_str(text);
    }

    fn take(&mut self) -> Option<NewsArticle> {
        if self.title.is_empty() {
            return None;
        }
        let some_nonempty = |s: &String| (!s.is_empty()).then(|| s.clone());
        Some(NewsArticle {
            title: self.title.clone(),
            link: self.link.clone(),
            published: some_nonempty(&self.published),
            outlet: some_nonempty(&self.outlet),
            description: some_nonempty(&self.description),
        })
    }
}

/// Rough event classification so scanning a headline list is faster. Keyword
/// buckets follow the news event taxonomy used for sentiment weighting.
fn headline_tag(title: &str) -> &'static str {
    let t = title.to_lowercase();

    if t.contains("earnings") || t.contains("guidance") || t.contains("eps") || t.contains("quarterly") {
        " [earnings]"
    } else if t.contains("acqui") || t.contains("merger") || t.contains("buyout") || t.contains("takeover") {
        " [m&a]"
    } else if t.contains("fda") || t.contains("regulat") || t.contains("antitrust") || t.contains("approval") {
        " [regulatory]"
    } else if t.contains("upgrade") || t.contains("downgrade") || t.contains("price target") || t.contains("analyst") {
        " [analyst]"
    } else if t.contains("ceo") || t.contains("cfo") || t.contains("resign") || t.contains("appoint") {
        " [management]"
    } else if t.contains("lawsuit") || t.contains("litigation") || t.contains("settlement") || t.contains("court") {
        " [legal]"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
<title>search results</title>
<item>
  <title>Cheesecake Factory beats Q2 earnings estimates</title>
  <link>https://example.com/a</link>
  <pubDate>Tue, 04 Aug 2026 12:00:00 GMT</pubDate>
  <source url="https://reuters.com">Reuters</source>
</item>
<item>
  <title><![CDATA[Analyst upgrades CAKE to Buy]]></title>
  <link>https://example.com/b</link>
</item>
<item>
  <link>https://example.com/no-title</link>
</item>
</channel></rss>"#;

    #[test]
    fn parses_items_including_cdata_titles() {
        let articles = parse_rss(FEED);
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Cheesecake Factory beats Q2 earnings estimates");
        assert_eq!(articles[0].outlet.as_deref(), Some("Reuters"));
        assert_eq!(articles[1].title, "Analyst upgrades CAKE to Buy");
        assert_eq!(articles[1].outlet, None);
    }

    #[test]
    fn malformed_feed_yields_empty_list_not_panic() {
        assert!(parse_rss("this is not xml <item><title>").is_empty());
        assert!(parse_rss("").is_empty());
    }

    #[test]
    fn headline_tags() {
        assert_eq!(headline_tag("Q2 earnings beat"), " [earnings]");
        assert_eq!(headline_tag("Rumored takeover bid"), " [m&a]");
        assert_eq!(headline_tag("CAKE opens new location"), "");
    }
}

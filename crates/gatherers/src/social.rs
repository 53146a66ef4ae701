//! Social gatherer: Reddit search for ticker discussion over the last week.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use research_core::{GatherError, GatherRequest, Gatherer, ResearchReport, Source};

use crate::format::report_header;

const SEARCH_URL: &str = "https://www.reddit.com/search.json";
const MAX_POSTS: usize = 15;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub title: String,
    pub subreddit: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: i64,
    #[serde(default)]
    pub permalink: String,
}

pub struct SocialGatherer {
    client: reqwest::Client,
}

impl SocialGatherer {
    pub fn new() -> Self {
        // Reddit requires a descriptive User-Agent or it serves 429s
        let client = reqwest::Client::builder()
            .user_agent("gradient-research/0.1 (research notification bot)")
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    async fn search(&self, query: &str) -> Result<Vec<Post>, GatherError> {
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("q", query),
                ("sort", "top"),
                ("t", "week"),
                ("limit", "25"),
            ])
            .send()
            .await
            .map_err(|e| GatherError::Network(format!("Reddit request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(GatherError::RateLimited("Reddit returned 429".to_string()));
        }
        if !status.is_success() {
            return Err(GatherError::Network(format!("Reddit returned HTTP {status}")));
        }

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| GatherError::Network(format!("Reddit response was not JSON: {e}")))?;

        Ok(listing.data.children.into_iter().map(|c| c.data).collect())
    }
}

impl Default for SocialGatherer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gatherer for SocialGatherer {
    fn source(&self) -> Source {
        Source::Social
    }

    async fn gather(&self, request: &GatherRequest) -> Result<ResearchReport, GatherError> {
        let query = format!("${} OR \"{}\"", request.ticker, request.company);
        let mut posts = self.search(&query).await?;

        if posts.is_empty() {
            return Err(GatherError::NoData(format!(
                "no recent Reddit discussion of ${}",
                request.ticker
            )));
        }

        posts.sort_by(|a, b| b.score.cmp(&a.score));

        let generated_at = Utc::now();
        let mut markdown = report_header("Social", request, generated_at, &[]);
        markdown.push_str("## Reddit Discussion (past week)\n\n");
        markdown.push_str(&format_posts(&posts));

        Ok(ResearchReport {
            ticker: request.ticker.clone(),
            company: request.company.clone(),
            source: Source::Social,
            generated_at,
            markdown,
            item_count: posts.len().min(MAX_POSTS),
        })
    }
}

fn format_posts(posts: &[Post]) -> String {
    let mut out = String::new();
    for post in posts.iter().take(MAX_POSTS) {
        out.push_str(&format!(
            "- [r/{}] **{}** — ▲ {}, {} comments\n  <https://reddit.com{}>\n",
            post.subreddit, post.title, post.score, post.num_comments, post.permalink
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_deserializes_and_formats() {
        let payload = r#"{
            "data": {
                "children": [
                    {"data": {"title": "CAKE to the moon?", "subreddit": "stocks",
                              "score": 321, "num_comments": 87, "permalink": "/r/stocks/abc"}},
                    {"data": {"title": "Earnings thread", "subreddit": "wallstreetbets",
                              "score": 12, "num_comments": 3, "permalink": "/r/wsb/def"}}
                ]
            }
        }"#;

        let listing: Listing = serde_json::from_str(payload).unwrap();
        let posts: Vec<Post> = listing.data.children.into_iter().map(|c| c.data).collect();
        assert_eq!(posts.len(), 2);

        let rendered = format_posts(&posts);
        assert!(rendered.contains("[r/stocks] **CAKE to the moon?** — ▲ 321, 87 comments"));
        assert!(rendered.contains("<https://reddit.com/r/wsb/def>"));
    }

    #[test]
    fn missing_optional_fields_default() {
        let payload = r#"{"data": {"children": [{"data": {"title": "t", "subreddit": "s"}}]}}"#;
        let listing: Listing = serde_json::from_str(payload).unwrap();
        assert_eq!(listing.data.children[0].data.score, 0);
    }
}

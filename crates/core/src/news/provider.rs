use crate::config::Settings;
use crate::news::analyzer::HeadlineAnalyzer;
use crate::news::{ScoredHeadline, SentimentLabel, SentimentSource};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://newsapi.org";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RETRIES: u32 = 2;

/// NewsAPI-style `/v2/everything` client that scores each article locally.
pub struct HttpNewsProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    retries: u32,
    analyzer: HeadlineAnalyzer,
}

impl HttpNewsProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_news_api_key()?.to_string();
        let base_url = settings
            .news_api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout_secs = std::env::var("NEWS_API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("NEWS_API_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build news http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            retries,
            analyzer: HeadlineAnalyzer::new(),
        })
    }

    fn url(&self) -> String {
        format!("{}/v2/everything", self.base_url.trim_end_matches('/'))
    }

    async fn fetch_once(
        &self,
        ticker: &str,
        lookback_days: u32,
        max_items: usize,
    ) -> Result<Vec<ScoredHeadline>> {
        let from_date = (Utc::now() - Duration::days(i64::from(lookback_days)))
            .format("%Y-%m-%d")
            .to_string();
        let query = format!("{ticker} stock");
        let page_size = max_items.to_string();

        let res = self
            .http
            .get(self.url())
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", query.as_str()),
                ("from", from_date.as_str()),
                ("language", "en"),
                ("sortBy", "relevancy"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .context("news provider request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read news provider response")?;
        if !status.is_success() {
            anyhow::bail!("news provider HTTP {status}: {text}");
        }

        let parsed = serde_json::from_str::<EverythingResponse>(&text)
            .with_context(|| format!("news provider response is not valid JSON: {text}"))?;

        let mut headlines: Vec<ScoredHeadline> = parsed
            .articles
            .into_iter()
            .filter_map(|a| self.score_article(a))
            .collect();

        // Most positive first, matching how the headlines are surfaced.
        headlines.sort_by(|a, b| {
            b.sentiment_score
                .partial_cmp(&a.sentiment_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        headlines.truncate(max_items);
        Ok(headlines)
    }

    fn score_article(&self, article: Article) -> Option<ScoredHeadline> {
        let title = article.title?.trim().to_string();
        if title.is_empty() {
            return None;
        }
        let description = article.description.unwrap_or_default();
        let published_at = article
            .published_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))?;

        let score = self.analyzer.analyze_news(&title, &description);
        Some(ScoredHeadline {
            title,
            url: article.url.unwrap_or_default(),
            published_at,
            sentiment_score: (score * 100.0).round() / 100.0,
            sentiment_label: SentimentLabel::for_score(score),
        })
    }
}

#[async_trait::async_trait]
impl SentimentSource for HttpNewsProvider {
    fn source_name(&self) -> &'static str {
        "newsapi"
    }

    async fn headlines_for(
        &self,
        ticker: &str,
        lookback_days: u32,
        max_items: usize,
    ) -> Result<Vec<ScoredHeadline>> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(ticker, lookback_days, max_items).await {
                Ok(headlines) => return Ok(headlines),
                Err(err) => {
                    if attempt > self.retries {
                        return Err(err);
                    }
                    let backoff = std::time::Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(ticker, attempt, ?backoff, error = %err, "news fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

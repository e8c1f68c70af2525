pub mod analyzer;
pub mod provider;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse per-headline label derived from the score. Strict thresholds:
/// exactly 0.1 / -0.1 stay neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn for_score(score: f64) -> Self {
        if score > 0.1 {
            SentimentLabel::Positive
        } else if score < -0.1 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// A headline with its sentiment score attached, as returned by a
/// [`SentimentSource`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredHeadline {
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    /// In [-1,1].
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
}

/// Capability boundary for news sentiment. Real implementations talk to a
/// news provider; callers must treat every error as "no signal", never as a
/// recommendation failure.
#[async_trait::async_trait]
pub trait SentimentSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn headlines_for(
        &self,
        ticker: &str,
        lookback_days: u32,
        max_items: usize,
    ) -> anyhow::Result<Vec<ScoredHeadline>>;
}

/// Fixed bank of neutral market headlines for offline runs and unconfigured
/// deployments. Keeps recommendation flows exercisable without a provider.
#[derive(Debug, Clone, Default)]
pub struct StaticHeadlines;

const STATIC_BANK: &[(&str, &str)] = &[
    (
        "Federal Reserve Maintains Interest Rates",
        "The Federal Reserve has decided to maintain current interest rates, citing economic stability and controlled inflation.",
    ),
    (
        "Tech Sector Shows Strong Performance in Q1",
        "Technology companies reported better-than-expected earnings for the first quarter, driving market gains.",
    ),
    (
        "Global Supply Chain Issues Improving",
        "Recent data suggests global supply chain disruptions are easing, potentially reducing inflationary pressures.",
    ),
    (
        "Bond Market Stability Returns After Volatility",
        "The bond market has stabilized following recent volatility, as investors gain confidence in long-term economic prospects.",
    ),
    (
        "Retail Sales Exceed Expectations",
        "Consumer spending remains strong as retail sales figures exceeded analyst expectations for the third consecutive month.",
    ),
];

#[async_trait::async_trait]
impl SentimentSource for StaticHeadlines {
    fn source_name(&self) -> &'static str {
        "static"
    }

    async fn headlines_for(
        &self,
        _ticker: &str,
        _lookback_days: u32,
        max_items: usize,
    ) -> anyhow::Result<Vec<ScoredHeadline>> {
        let analyzer = analyzer::HeadlineAnalyzer::new();
        let now = Utc::now();
        Ok(STATIC_BANK
            .iter()
            .take(max_items)
            .map(|(title, description)| {
                let score = analyzer.analyze_news(title, description);
                ScoredHeadline {
                    title: (*title).to_string(),
                    url: "#".to_string(),
                    published_at: now,
                    sentiment_score: score,
                    sentiment_label: SentimentLabel::for_score(score),
                }
            })
            .collect())
    }
}

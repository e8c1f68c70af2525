pub mod normalize;
pub mod sentiment;
pub mod table;

use crate::domain::profile::AllocationProfileName;
use crate::domain::recommendation::{
    AllocationProfile, AssetClassWeight, Instrument, MarketSentiment, Recommendation,
    RecommendedInstrument,
};
use crate::news::{ScoredHeadline, SentimentSource};
use std::sync::Arc;
use std::time::Duration;
use table::AllocationTable;
use tokio::task::JoinSet;

const SENTIMENT_LOOKBACK_DAYS: u32 = 7;
const SENTIMENT_MAX_ITEMS: usize = 5;
const DEFAULT_SENTIMENT_TIMEOUT_SECS: u64 = 10;

/// Stateless per call: look up the base table, normalize, attach sentiment.
/// Never returns an error to the caller; every internal failure degrades to
/// the documented default.
pub struct RecommendationEngine {
    table: AllocationTable,
    sentiment_source: Arc<dyn SentimentSource>,
    sentiment_timeout: Duration,
}

impl RecommendationEngine {
    pub fn new(table: AllocationTable, sentiment_source: Arc<dyn SentimentSource>) -> Self {
        let timeout_secs = std::env::var("SENTIMENT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SENTIMENT_TIMEOUT_SECS);
        Self {
            table,
            sentiment_source,
            sentiment_timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub async fn recommend(&self, profile: AllocationProfileName) -> Recommendation {
        let base = match self.normalized_base(profile) {
            Ok(base) => base,
            Err(err) => {
                tracing::error!(%profile, error = %err, "allocation lookup failed; serving default recommendation");
                return default_recommendation(profile);
            }
        };

        let (instruments, market_sentiment) = self.enrich_with_sentiment(base.instruments).await;

        Recommendation {
            profile,
            description: format!("Recommended {profile} investment strategy"),
            explanation: strategy_explanation(profile).to_string(),
            asset_allocation: base.asset_classes,
            instruments,
            market_sentiment,
            generated_at: chrono::Utc::now(),
        }
    }

    fn normalized_base(&self, profile: AllocationProfileName) -> anyhow::Result<AllocationProfile> {
        let base = self
            .table
            .weights_for(profile)
            .ok_or_else(|| anyhow::anyhow!("no allocation entry for profile {profile}"))?;
        normalize::normalize_profile(base)
    }

    /// Fetch headlines for every instrument concurrently, each under its own
    /// timeout. Fetch failures collapse to "no signal" for that instrument;
    /// they never fail the recommendation.
    async fn enrich_with_sentiment(
        &self,
        instruments: Vec<Instrument>,
    ) -> (Vec<RecommendedInstrument>, MarketSentiment) {
        let mut tasks = JoinSet::new();
        for (idx, instrument) in instruments.iter().enumerate() {
            let source = Arc::clone(&self.sentiment_source);
            let ticker = instrument.ticker.clone();
            let timeout = self.sentiment_timeout;
            tasks.spawn(async move {
                let fetched = tokio::time::timeout(
                    timeout,
                    source.headlines_for(&ticker, SENTIMENT_LOOKBACK_DAYS, SENTIMENT_MAX_ITEMS),
                )
                .await;
                let headlines = match fetched {
                    Ok(Ok(headlines)) => headlines,
                    Ok(Err(err)) => {
                        tracing::warn!(%ticker, error = %err, "sentiment fetch failed");
                        Vec::new()
                    }
                    Err(_) => {
                        tracing::warn!(%ticker, "sentiment fetch timed out");
                        Vec::new()
                    }
                };
                (idx, headlines)
            });
        }

        let mut per_instrument: Vec<Vec<ScoredHeadline>> = vec![Vec::new(); instruments.len()];
        while let Some(joined) = tasks.join_next().await {
            if let Ok((idx, headlines)) = joined {
                per_instrument[idx] = headlines;
            }
        }

        let mut out = Vec::with_capacity(instruments.len());
        let mut means = Vec::with_capacity(instruments.len());
        for (instrument, headlines) in instruments.into_iter().zip(per_instrument) {
            let avg_sentiment = instrument_mean(&headlines);
            means.push(avg_sentiment);
            out.push(RecommendedInstrument {
                ticker: instrument.ticker,
                name: instrument.name,
                weight_percent: instrument.weight_percent,
                rationale: instrument.rationale,
                avg_sentiment,
                headlines,
            });
        }

        (out, sentiment::aggregate(&means))
    }
}

fn instrument_mean(headlines: &[ScoredHeadline]) -> Option<f64> {
    if headlines.is_empty() {
        return None;
    }
    let mean = headlines.iter().map(|h| h.sentiment_score).sum::<f64>() / headlines.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}

fn strategy_explanation(profile: AllocationProfileName) -> &'static str {
    match profile {
        AllocationProfileName::Conservative => {
            "This strategy focuses on stable, large-cap companies with strong dividend histories and lower volatility."
        }
        AllocationProfileName::Moderate => {
            "This balanced approach combines stable value stocks with growth opportunities while maintaining moderate risk levels."
        }
        AllocationProfileName::Aggressive => {
            "This growth-oriented strategy focuses on companies with higher return potential, accepting higher volatility."
        }
    }
}

/// Fixed fail-closed baseline: 60% large-cap, 30% bonds, 10% cash, mirrored
/// in the instrument list so both weight sets satisfy the sum-100 invariant.
pub fn default_recommendation(profile: AllocationProfileName) -> Recommendation {
    let asset_allocation = vec![
        AssetClassWeight {
            asset_class: "large_cap".to_string(),
            weight_percent: 60.0,
        },
        AssetClassWeight {
            asset_class: "bonds".to_string(),
            weight_percent: 30.0,
        },
        AssetClassWeight {
            asset_class: "cash".to_string(),
            weight_percent: 10.0,
        },
    ];
    let instruments = vec![
        RecommendedInstrument {
            ticker: "SPY".to_string(),
            name: "SPDR S&P 500 ETF".to_string(),
            weight_percent: 60.0,
            rationale: "Broad large-cap market exposure".to_string(),
            avg_sentiment: None,
            headlines: Vec::new(),
        },
        RecommendedInstrument {
            ticker: "BND".to_string(),
            name: "Vanguard Total Bond Market ETF".to_string(),
            weight_percent: 30.0,
            rationale: "Core bond exposure".to_string(),
            avg_sentiment: None,
            headlines: Vec::new(),
        },
        RecommendedInstrument {
            ticker: "BIL".to_string(),
            name: "SPDR Bloomberg 1-3 Month T-Bill ETF".to_string(),
            weight_percent: 10.0,
            rationale: "Cash equivalent".to_string(),
            avg_sentiment: None,
            headlines: Vec::new(),
        },
    ];

    Recommendation {
        profile,
        description: "Default balanced investment strategy".to_string(),
        explanation: "Live recommendation inputs were unavailable; showing the baseline balanced allocation.".to_string(),
        asset_allocation,
        instruments,
        market_sentiment: MarketSentiment::neutral(),
        generated_at: chrono::Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::SentimentLabel;
    use std::collections::HashMap;

    struct FailingSource;

    #[async_trait::async_trait]
    impl SentimentSource for FailingSource {
        fn source_name(&self) -> &'static str {
            "failing"
        }

        async fn headlines_for(
            &self,
            _ticker: &str,
            _lookback_days: u32,
            _max_items: usize,
        ) -> anyhow::Result<Vec<ScoredHeadline>> {
            anyhow::bail!("provider down")
        }
    }

    struct FixedSource {
        scores: HashMap<&'static str, Vec<f64>>,
    }

    #[async_trait::async_trait]
    impl SentimentSource for FixedSource {
        fn source_name(&self) -> &'static str {
            "fixed"
        }

        async fn headlines_for(
            &self,
            ticker: &str,
            _lookback_days: u32,
            _max_items: usize,
        ) -> anyhow::Result<Vec<ScoredHeadline>> {
            let scores = self.scores.get(ticker).cloned().unwrap_or_default();
            Ok(scores
                .into_iter()
                .map(|score| ScoredHeadline {
                    title: format!("{ticker} headline"),
                    url: "#".to_string(),
                    published_at: chrono::Utc::now(),
                    sentiment_score: score,
                    sentiment_label: SentimentLabel::for_score(score),
                })
                .collect())
        }
    }

    fn small_table() -> AllocationTable {
        AllocationTable::from_json(
            &serde_json::json!({
                "version": 1,
                "profiles": [
                    {
                        "profile": "moderate",
                        "asset_classes": [
                            {"asset_class": "equity", "weight_percent": 40.0},
                            {"asset_class": "bonds", "weight_percent": 30.0},
                            {"asset_class": "cash", "weight_percent": 27.0}
                        ],
                        "instruments": [
                            {"ticker": "AAA", "name": "Alpha", "weight_percent": 50.0, "rationale": "core"},
                            {"ticker": "BBB", "name": "Beta", "weight_percent": 47.0, "rationale": "satellite"}
                        ]
                    }
                ]
            })
            .to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn recommend_normalizes_both_weight_sets() {
        let engine = RecommendationEngine::new(small_table(), Arc::new(FailingSource));
        let rec = engine.recommend(AllocationProfileName::Moderate).await;

        let class_sum: f64 = rec
            .asset_allocation
            .iter()
            .map(|c| c.weight_percent)
            .sum();
        let instrument_sum: f64 = rec.instruments.iter().map(|i| i.weight_percent).sum();
        assert!((class_sum - 100.0).abs() < 1e-9);
        assert!((instrument_sum - 100.0).abs() < 1e-9);
        // 50/97 and 47/97 of 100, rounded to one decimal.
        assert_eq!(rec.instruments[0].weight_percent, 51.5);
        assert_eq!(rec.instruments[1].weight_percent, 48.5);
    }

    #[tokio::test]
    async fn sentiment_failure_degrades_to_neutral_not_error() {
        let engine = RecommendationEngine::new(small_table(), Arc::new(FailingSource));
        let rec = engine.recommend(AllocationProfileName::Moderate).await;

        assert_eq!(rec.market_sentiment.score, 0.0);
        assert!(rec.market_sentiment.narrative.contains("neutral"));
        // Allocation is still the profile's own, not the fallback.
        assert_eq!(rec.description, "Recommended moderate investment strategy");
    }

    #[tokio::test]
    async fn missing_profile_serves_the_default() {
        let engine = RecommendationEngine::new(small_table(), Arc::new(FailingSource));
        let rec = engine.recommend(AllocationProfileName::Aggressive).await;

        assert_eq!(rec.description, "Default balanced investment strategy");
        let class_sum: f64 = rec
            .asset_allocation
            .iter()
            .map(|c| c.weight_percent)
            .sum();
        assert!((class_sum - 100.0).abs() < 1e-9);
        assert_eq!(rec.market_sentiment.score, 0.0);
    }

    #[tokio::test]
    async fn aggregate_skips_instruments_without_headlines() {
        let mut scores = HashMap::new();
        scores.insert("AAA", vec![0.6, 0.2]);
        // BBB intentionally returns nothing.
        let engine = RecommendationEngine::new(small_table(), Arc::new(FixedSource { scores }));
        let rec = engine.recommend(AllocationProfileName::Moderate).await;

        assert_eq!(rec.instruments[0].avg_sentiment, Some(0.4));
        assert_eq!(rec.instruments[1].avg_sentiment, None);
        // Mean of means over present instruments only.
        assert!((rec.market_sentiment.score - 0.4).abs() < 1e-9);
        assert!(rec.market_sentiment.narrative.contains("very positive"));
    }
}

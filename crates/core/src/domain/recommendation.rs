use crate::domain::profile::AllocationProfileName;
use crate::news::ScoredHeadline;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One asset-class slice of a target allocation, in percent. Order is
/// significant: normalization ties break on first occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetClassWeight {
    pub asset_class: String,
    pub weight_percent: f64,
}

/// A named instrument in a profile's base table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub ticker: String,
    pub name: String,
    pub weight_percent: f64,
    pub rationale: String,
}

/// Per-profile target weights and instrument picks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationProfile {
    pub profile: AllocationProfileName,
    pub asset_classes: Vec<AssetClassWeight>,
    pub instruments: Vec<Instrument>,
}

/// An instrument as it appears in a generated recommendation, enriched with
/// the news that informed the sentiment aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedInstrument {
    pub ticker: String,
    pub name: String,
    pub weight_percent: f64,
    pub rationale: String,
    /// Mean headline sentiment; absent when no headlines were available.
    pub avg_sentiment: Option<f64>,
    #[serde(default)]
    pub headlines: Vec<ScoredHeadline>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSentiment {
    /// Mean of instrument-level sentiment means, in [-1,1].
    pub score: f64,
    pub narrative: String,
}

/// The full output of a recommendation run. Ephemeral: recomputed per
/// request; any stored copy is an audit record, not authoritative state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub profile: AllocationProfileName,
    pub description: String,
    pub explanation: String,
    pub asset_allocation: Vec<AssetClassWeight>,
    pub instruments: Vec<RecommendedInstrument>,
    pub market_sentiment: MarketSentiment,
    pub generated_at: DateTime<Utc>,
}

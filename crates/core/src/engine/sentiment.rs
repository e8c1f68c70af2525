use crate::domain::recommendation::MarketSentiment;

const VERY_POSITIVE: &str =
    "Market sentiment is very positive, suggesting strong investor confidence.";
const MILDLY_POSITIVE: &str = "Market sentiment is mildly positive, indicating cautious optimism.";
const VERY_NEGATIVE: &str = "Market sentiment is very negative, suggesting investor concerns.";
const MILDLY_NEGATIVE: &str =
    "Market sentiment is mildly negative, indicating some market uncertainty.";
const NEUTRAL: &str = "Market sentiment is neutral, suggesting balanced market conditions.";

/// Narrative for an aggregate sentiment score. Thresholds are strict, so the
/// exact boundary values fall into the milder bucket.
pub fn narrative_for(score: f64) -> &'static str {
    if score > 0.3 {
        VERY_POSITIVE
    } else if score > 0.1 {
        MILDLY_POSITIVE
    } else if score < -0.3 {
        VERY_NEGATIVE
    } else if score < -0.1 {
        MILDLY_NEGATIVE
    } else {
        NEUTRAL
    }
}

impl MarketSentiment {
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            narrative: NEUTRAL.to_string(),
        }
    }

    pub fn from_score(score: f64) -> Self {
        Self {
            score: (score * 100.0).round() / 100.0,
            narrative: narrative_for(score).to_string(),
        }
    }
}

/// Mean of the instrument-level means. Instruments with no headlines are
/// excluded from the aggregate, not counted as zero.
pub fn aggregate(instrument_means: &[Option<f64>]) -> MarketSentiment {
    let present: Vec<f64> = instrument_means.iter().filter_map(|m| *m).collect();
    if present.is_empty() {
        return MarketSentiment::neutral();
    }
    let mean = present.iter().sum::<f64>() / present.len() as f64;
    MarketSentiment::from_score(mean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrative_boundaries_are_strict() {
        assert_eq!(narrative_for(0.31), VERY_POSITIVE);
        assert_eq!(narrative_for(0.3), MILDLY_POSITIVE);
        assert_eq!(narrative_for(0.11), MILDLY_POSITIVE);
        assert_eq!(narrative_for(0.1), NEUTRAL);
        assert_eq!(narrative_for(0.0), NEUTRAL);
        assert_eq!(narrative_for(-0.1), NEUTRAL);
        assert_eq!(narrative_for(-0.11), MILDLY_NEGATIVE);
        assert_eq!(narrative_for(-0.3), MILDLY_NEGATIVE);
        assert_eq!(narrative_for(-0.31), VERY_NEGATIVE);
    }

    #[test]
    fn aggregate_excludes_missing_instruments() {
        let sentiment = aggregate(&[Some(0.4), None, Some(0.2)]);
        assert!((sentiment.score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn aggregate_of_nothing_is_neutral() {
        let sentiment = aggregate(&[None, None]);
        assert_eq!(sentiment.score, 0.0);
        assert_eq!(sentiment.narrative, NEUTRAL);
    }

    #[test]
    fn score_is_rounded_to_two_decimals() {
        let sentiment = aggregate(&[Some(0.333), Some(0.334)]);
        assert_eq!(sentiment.score, 0.33);
    }
}

use vader_sentiment::SentimentIntensityAnalyzer;

// Equity-market jargon that VADER's general lexicon underweights. Scores are
// additive boosts on top of the compound score.
const BULLISH_TERMS: &[(&str, f64)] = &[
    ("beats expectations", 0.4),
    ("beats estimates", 0.4),
    ("raises guidance", 0.5),
    ("raised guidance", 0.5),
    ("upgrade", 0.3),
    ("upgraded", 0.3),
    ("outperform", 0.3),
    ("overweight", 0.2),
    ("record revenue", 0.4),
    ("record profit", 0.4),
    ("all-time high", 0.4),
    ("dividend increase", 0.3),
    ("buyback", 0.3),
    ("rally", 0.3),
    ("rallies", 0.3),
    ("surge", 0.4),
    ("surges", 0.4),
    ("soar", 0.4),
    ("soars", 0.4),
    ("bullish", 0.4),
];

const BEARISH_TERMS: &[(&str, f64)] = &[
    ("misses expectations", -0.4),
    ("misses estimates", -0.4),
    ("cuts guidance", -0.5),
    ("cut guidance", -0.5),
    ("downgrade", -0.3),
    ("downgraded", -0.3),
    ("underperform", -0.3),
    ("underweight", -0.2),
    ("lawsuit", -0.3),
    ("investigation", -0.3),
    ("recall", -0.3),
    ("layoffs", -0.4),
    ("bankruptcy", -0.6),
    ("default", -0.4),
    ("plunge", -0.4),
    ("plunges", -0.4),
    ("sell-off", -0.4),
    ("selloff", -0.4),
    ("slump", -0.3),
    ("bearish", -0.4),
];

/// Headline sentiment scoring: VADER compound score blended with an
/// equity-keyword boost, clamped to [-1,1].
pub struct HeadlineAnalyzer {
    vader: SentimentIntensityAnalyzer<'static>,
}

impl HeadlineAnalyzer {
    pub fn new() -> Self {
        Self {
            vader: SentimentIntensityAnalyzer::new(),
        }
    }

    fn keyword_boost(text: &str) -> f64 {
        let lower = text.to_lowercase();
        let mut boost = 0.0;
        for (term, score) in BULLISH_TERMS {
            if lower.contains(term) {
                boost += score;
            }
        }
        for (term, score) in BEARISH_TERMS {
            if lower.contains(term) {
                boost += score;
            }
        }
        boost
    }

    /// Score a single piece of text in [-1,1].
    pub fn analyze(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let scores = self.vader.polarity_scores(text);
        let compound = scores.get("compound").copied().unwrap_or(0.0);
        (compound + Self::keyword_boost(text) * 0.5).clamp(-1.0, 1.0)
    }

    /// Score a headline with its description. The title dominates: it is the
    /// part editors load with signal.
    pub fn analyze_news(&self, title: &str, description: &str) -> f64 {
        if description.trim().is_empty() {
            return self.analyze(title);
        }
        self.analyze(title) * 0.7 + self.analyze(description) * 0.3
    }
}

impl Default for HeadlineAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullish_headlines_score_positive() {
        let analyzer = HeadlineAnalyzer::new();
        let headlines = [
            "Apple beats expectations as iPhone revenue surges",
            "Chipmaker raises guidance after record revenue quarter",
            "Shares rally on analyst upgrade to outperform",
        ];
        for h in headlines {
            assert!(analyzer.analyze(h) > 0.0, "expected positive for {h:?}");
        }
    }

    #[test]
    fn bearish_headlines_score_negative() {
        let analyzer = HeadlineAnalyzer::new();
        let headlines = [
            "Retailer misses estimates, cuts guidance for the year",
            "Shares plunge amid SEC investigation and lawsuit",
            "Bank announces layoffs as profit slumps",
        ];
        for h in headlines {
            assert!(analyzer.analyze(h) < 0.0, "expected negative for {h:?}");
        }
    }

    #[test]
    fn empty_text_is_neutral() {
        let analyzer = HeadlineAnalyzer::new();
        assert_eq!(analyzer.analyze("   "), 0.0);
    }

    #[test]
    fn scores_stay_in_range() {
        let analyzer = HeadlineAnalyzer::new();
        let extreme =
            "surges rally soars bullish record revenue record profit all-time high buyback";
        let score = analyzer.analyze(extreme);
        assert!((-1.0..=1.0).contains(&score));
    }
}

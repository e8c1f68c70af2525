/// Numeric value substituted for unrecognized labels in lenient mode.
pub const NEUTRAL_VALUE: f64 = 50.0;

/// Five-point agreement scale shared by every generated question.
pub const AGREEMENT_SCALE: &[(&str, f64)] = &[
    ("Strongly Disagree", 0.0),
    ("Disagree", 25.0),
    ("Neutral", 50.0),
    ("Agree", 75.0),
    ("Strongly Agree", 100.0),
];

// Factor-specific label scales. Each spans [0,100] so factor scores mix with
// agreement-scale answers on the same axis.
const EXPERIENCE_SCALE: &[(&str, f64)] = &[
    ("Beginner", 0.0),
    ("Intermediate", 35.0),
    ("Experienced", 70.0),
    ("Expert", 100.0),
];

const TIME_HORIZON_SCALE: &[(&str, f64)] = &[
    ("Under 3 years", 10.0),
    ("3 to 10 years", 50.0),
    ("Over 10 years", 90.0),
];

const FINANCIAL_GOALS_SCALE: &[(&str, f64)] = &[
    ("Capital preservation", 10.0),
    ("Steady income", 40.0),
    ("Balanced growth", 60.0),
    ("Wealth accumulation", 90.0),
];

/// Weighted factors and their contribution to the overall score. Weights must
/// sum to 1.0; [`FactorWeights::new`] checks this once at construction.
pub const KNOWN_FACTORS: &[(&str, f64)] = &[
    ("investment_experience", 0.25),
    ("time_horizon", 0.25),
    ("risk_tolerance", 0.30),
    ("financial_goals", 0.20),
];

#[derive(Debug, Clone, Copy)]
pub struct FactorWeights;

impl FactorWeights {
    pub fn new() -> anyhow::Result<Self> {
        let sum: f64 = KNOWN_FACTORS.iter().map(|(_, w)| w).sum();
        anyhow::ensure!(
            (sum - 1.0).abs() < 1e-9,
            "factor weights must sum to 1.0 (got {sum})"
        );
        Ok(Self)
    }

    pub fn weight_for(&self, question_key: &str) -> Option<f64> {
        KNOWN_FACTORS
            .iter()
            .find(|(name, _)| *name == question_key)
            .map(|(_, w)| *w)
    }
}

/// Look a label up in the global vocabulary (agreement scale plus every
/// factor scale). Whitespace-insensitive, case-sensitive like the source
/// questionnaire options.
pub fn label_value(label: &str) -> Option<f64> {
    let label = label.trim();
    AGREEMENT_SCALE
        .iter()
        .chain(EXPERIENCE_SCALE)
        .chain(TIME_HORIZON_SCALE)
        .chain(FINANCIAL_GOALS_SCALE)
        .find(|(name, _)| *name == label)
        .map(|(_, v)| *v)
}

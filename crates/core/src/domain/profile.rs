use crate::domain::error::InvalidProfile;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Five-way assessment bucket. Boundaries are closed-low/open-high except the
/// first bucket, which is closed on both ends, so every score in [0,100] maps
/// to exactly one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBucket {
    Conservative,
    ModerateConservative,
    Moderate,
    ModerateAggressive,
    Aggressive,
}

impl RiskBucket {
    pub const ALL: [RiskBucket; 5] = [
        RiskBucket::Conservative,
        RiskBucket::ModerateConservative,
        RiskBucket::Moderate,
        RiskBucket::ModerateAggressive,
        RiskBucket::Aggressive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBucket::Conservative => "conservative",
            RiskBucket::ModerateConservative => "moderate_conservative",
            RiskBucket::Moderate => "moderate",
            RiskBucket::ModerateAggressive => "moderate_aggressive",
            RiskBucket::Aggressive => "aggressive",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, InvalidProfile> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(RiskBucket::Conservative),
            "moderate_conservative" => Ok(RiskBucket::ModerateConservative),
            "moderate" => Ok(RiskBucket::Moderate),
            "moderate_aggressive" => Ok(RiskBucket::ModerateAggressive),
            "aggressive" => Ok(RiskBucket::Aggressive),
            _ => Err(InvalidProfile(raw.to_string())),
        }
    }

    /// Collapse the five assessment buckets onto the three allocation
    /// profiles. Total by construction.
    pub fn allocation_profile(&self) -> AllocationProfileName {
        match self {
            RiskBucket::Conservative | RiskBucket::ModerateConservative => {
                AllocationProfileName::Conservative
            }
            RiskBucket::Moderate => AllocationProfileName::Moderate,
            RiskBucket::ModerateAggressive | RiskBucket::Aggressive => {
                AllocationProfileName::Aggressive
            }
        }
    }
}

impl fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a score in [0,100] to its bucket.
///
/// Out-of-range and NaN scores are degenerate input and fall back to
/// `Moderate`; valid scores never take that path.
pub fn bucket_for_score(score: f64) -> RiskBucket {
    if score.is_nan() || !(0.0..=100.0).contains(&score) {
        return RiskBucket::Moderate;
    }
    if score <= 20.0 {
        RiskBucket::Conservative
    } else if score <= 40.0 {
        RiskBucket::ModerateConservative
    } else if score <= 60.0 {
        RiskBucket::Moderate
    } else if score <= 80.0 {
        RiskBucket::ModerateAggressive
    } else {
        RiskBucket::Aggressive
    }
}

/// The three allocation profiles the engine actually holds tables for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationProfileName {
    Conservative,
    Moderate,
    Aggressive,
}

impl AllocationProfileName {
    pub const ALL: [AllocationProfileName; 3] = [
        AllocationProfileName::Conservative,
        AllocationProfileName::Moderate,
        AllocationProfileName::Aggressive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationProfileName::Conservative => "conservative",
            AllocationProfileName::Moderate => "moderate",
            AllocationProfileName::Aggressive => "aggressive",
        }
    }

    /// Resolve raw profile input once at the boundary. Accepts either an
    /// allocation profile name or any of the five assessment bucket names
    /// (which collapse onto the three profiles).
    pub fn parse(raw: &str) -> Result<Self, InvalidProfile> {
        let bucket = RiskBucket::parse(raw)?;
        Ok(bucket.allocation_profile())
    }
}

impl fmt::Display for AllocationProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_cover_the_whole_range() {
        assert_eq!(bucket_for_score(0.0), RiskBucket::Conservative);
        assert_eq!(bucket_for_score(20.0), RiskBucket::Conservative);
        assert_eq!(bucket_for_score(20.0001), RiskBucket::ModerateConservative);
        assert_eq!(bucket_for_score(40.0), RiskBucket::ModerateConservative);
        assert_eq!(bucket_for_score(50.0), RiskBucket::Moderate);
        assert_eq!(bucket_for_score(60.0), RiskBucket::Moderate);
        assert_eq!(bucket_for_score(80.0), RiskBucket::ModerateAggressive);
        assert_eq!(bucket_for_score(80.0001), RiskBucket::Aggressive);
        assert_eq!(bucket_for_score(100.0), RiskBucket::Aggressive);
    }

    #[test]
    fn every_bucket_is_reachable() {
        let hits: Vec<RiskBucket> = [10.0, 30.0, 50.0, 70.0, 90.0]
            .iter()
            .map(|s| bucket_for_score(*s))
            .collect();
        assert_eq!(hits, RiskBucket::ALL);
    }

    #[test]
    fn degenerate_scores_default_to_moderate() {
        assert_eq!(bucket_for_score(f64::NAN), RiskBucket::Moderate);
        assert_eq!(bucket_for_score(-1.0), RiskBucket::Moderate);
        assert_eq!(bucket_for_score(100.5), RiskBucket::Moderate);
    }

    #[test]
    fn collapse_is_total() {
        assert_eq!(
            RiskBucket::Conservative.allocation_profile(),
            AllocationProfileName::Conservative
        );
        assert_eq!(
            RiskBucket::ModerateConservative.allocation_profile(),
            AllocationProfileName::Conservative
        );
        assert_eq!(
            RiskBucket::Moderate.allocation_profile(),
            AllocationProfileName::Moderate
        );
        assert_eq!(
            RiskBucket::ModerateAggressive.allocation_profile(),
            AllocationProfileName::Aggressive
        );
        assert_eq!(
            RiskBucket::Aggressive.allocation_profile(),
            AllocationProfileName::Aggressive
        );
    }

    #[test]
    fn profile_parse_accepts_bucket_names() {
        assert_eq!(
            AllocationProfileName::parse("moderate_conservative").unwrap(),
            AllocationProfileName::Conservative
        );
        assert_eq!(
            AllocationProfileName::parse(" Aggressive ").unwrap(),
            AllocationProfileName::Aggressive
        );
        assert!(AllocationProfileName::parse("yolo").is_err());
    }
}

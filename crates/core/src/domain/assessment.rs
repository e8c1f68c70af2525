use crate::domain::profile::RiskBucket;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// In-place edits to an assessment are only honored within this window after
/// creation; afterwards a retake (new assessment) is the only path.
pub const MODIFICATION_WINDOW_DAYS: i64 = 30;

/// One questionnaire answer: question key plus the chosen label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub label: String,
}

impl Answer {
    pub fn new(question: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            label: label.into(),
        }
    }
}

/// A completed risk assessment. Immutable once created except for the
/// `active` flag; superseded assessments are deactivated, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub score: f64,
    pub profile: RiskBucket,
    pub responses: Vec<Answer>,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

impl RiskAssessment {
    /// Policy check for in-place modification. Creating a new assessment is
    /// always allowed regardless of this window.
    pub fn within_modification_window(&self, now: DateTime<Utc>) -> bool {
        now <= self.created_at + Duration::days(MODIFICATION_WINDOW_DAYS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn assessment_created_at(created_at: DateTime<Utc>) -> RiskAssessment {
        RiskAssessment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            score: 50.0,
            profile: RiskBucket::Moderate,
            responses: vec![Answer::new("q1", "Neutral")],
            created_at,
            active: true,
        }
    }

    #[test]
    fn modification_window_closes_after_30_days() {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let a = assessment_created_at(created);

        assert!(a.within_modification_window(created + Duration::days(29)));
        assert!(a.within_modification_window(created + Duration::days(30)));
        assert!(!a.within_modification_window(created + Duration::days(31)));
    }
}

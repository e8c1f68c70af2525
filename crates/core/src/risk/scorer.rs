use crate::domain::assessment::{Answer, RiskAssessment};
use crate::domain::error::{AssessmentError, MIN_ANSWERS};
use crate::domain::profile::bucket_for_score;
use crate::risk::vocabulary::{label_value, FactorWeights, NEUTRAL_VALUE};
use crate::storage::PersistenceStore;
use std::sync::Arc;
use uuid::Uuid;

/// How unrecognized labels are handled during scoring.
///
/// The default is `Lenient`: unknown labels score the neutral value instead
/// of rejecting the submission, matching the questionnaire's historical
/// behaviour. `Strict` rejects them with `InvalidResponse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    #[default]
    Lenient,
    Strict,
}

/// Turns questionnaire answers into a scored, bucketed, persisted
/// assessment. One instance is shared across requests.
pub struct RiskScorer {
    store: Arc<dyn PersistenceStore>,
    mode: ValidationMode,
    weights: FactorWeights,
}

impl RiskScorer {
    pub fn new(store: Arc<dyn PersistenceStore>) -> anyhow::Result<Self> {
        Self::with_mode(store, ValidationMode::default())
    }

    pub fn with_mode(
        store: Arc<dyn PersistenceStore>,
        mode: ValidationMode,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            store,
            mode,
            weights: FactorWeights::new()?,
        })
    }

    /// Score the answers, bucket the score, and persist the result as the
    /// user's single active assessment (prior actives are deactivated in the
    /// same atomic store step).
    pub async fn assess(
        &self,
        user_id: Uuid,
        answers: &[Answer],
    ) -> Result<RiskAssessment, AssessmentError> {
        let score = self.score_answers(answers)?;
        let assessment = RiskAssessment {
            id: Uuid::new_v4(),
            user_id,
            score,
            profile: bucket_for_score(score),
            responses: answers.to_vec(),
            created_at: chrono::Utc::now(),
            active: true,
        };

        self.store
            .save_assessment(&assessment)
            .await
            .map_err(AssessmentError::Unavailable)?;

        tracing::info!(
            %user_id,
            assessment_id = %assessment.id,
            score = assessment.score,
            profile = %assessment.profile,
            "risk assessment stored"
        );
        Ok(assessment)
    }

    pub async fn get_active(&self, user_id: Uuid) -> anyhow::Result<Option<RiskAssessment>> {
        self.store.get_active_assessment(user_id).await
    }

    /// Pure scoring, no side effects.
    ///
    /// Weighted mode applies when every answer key is a known factor name;
    /// the score is the weight-normalized sum, so partial factor coverage
    /// still lands in [0,100]. Anything else scores as the unweighted mean
    /// of label values.
    pub fn score_answers(&self, answers: &[Answer]) -> Result<f64, AssessmentError> {
        if answers.len() < MIN_ANSWERS {
            return Err(AssessmentError::InsufficientData {
                got: answers.len(),
                min: MIN_ANSWERS,
            });
        }

        let all_factors = answers
            .iter()
            .all(|a| self.weights.weight_for(&a.question).is_some());

        if all_factors {
            let mut weighted_sum = 0.0;
            let mut weight_total = 0.0;
            for answer in answers {
                let weight = self
                    .weights
                    .weight_for(&answer.question)
                    .unwrap_or_default();
                weighted_sum += weight * self.value_for(answer)?;
                weight_total += weight;
            }
            Ok(weighted_sum / weight_total)
        } else {
            let mut total = 0.0;
            for answer in answers {
                total += self.value_for(answer)?;
            }
            Ok(total / answers.len() as f64)
        }
    }

    fn value_for(&self, answer: &Answer) -> Result<f64, AssessmentError> {
        match label_value(&answer.label) {
            Some(v) => Ok(v),
            None => match self.mode {
                ValidationMode::Lenient => Ok(NEUTRAL_VALUE),
                ValidationMode::Strict => Err(AssessmentError::InvalidResponse {
                    question: answer.question.clone(),
                    label: answer.label.clone(),
                }),
            },
        }
    }
}

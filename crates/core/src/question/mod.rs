pub mod anthropic;

use crate::domain::assessment::Answer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Every generated statement must open with this prefix; anything else is
/// treated as malformed output and replaced by a fallback question.
pub const REQUIRED_PREFIX: &str =
    "To what extent do you agree or disagree with the following statement:";

pub const AGREEMENT_OPTIONS: [&str; 5] = [
    "Strongly Disagree",
    "Disagree",
    "Neutral",
    "Agree",
    "Strongly Agree",
];

const FIRST_QUESTION: &str = "To what extent do you agree or disagree with the following statement: Given my investment experience, economic context, social commitments, and personal resilience, I am comfortable with short-term market volatility in pursuit of long-term growth.";

const FALLBACK_QUESTIONS: [&str; 5] = [
    "To what extent do you agree or disagree with the following statement: I am comfortable making investment decisions that could significantly impact my financial future, even if it means navigating uncertain economic conditions, managing emotional stress, and adapting to changing market trends.",
    "To what extent do you agree or disagree with the following statement: I prioritize long-term financial growth over short-term stability, even if it means accepting potential losses in the short run.",
    "To what extent do you agree or disagree with the following statement: I have the knowledge and experience to assess investment risks independently and adjust my strategy accordingly.",
    "To what extent do you agree or disagree with the following statement: During periods of market downturns, I remain confident in my investment choices and avoid making impulsive financial decisions based on fear or uncertainty.",
    "To what extent do you agree or disagree with the following statement: I am willing to allocate a significant portion of my disposable income toward high-risk, high-reward investments, even if it means sacrificing some financial security in the short term.",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub options: Vec<String>,
}

impl Question {
    fn with_text(id: u32, text: String) -> Self {
        Self {
            id,
            text,
            options: AGREEMENT_OPTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Optional generative collaborator for phrasing follow-up questions.
#[async_trait::async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, prior_answers_digest: &str) -> anyhow::Result<String>;
}

/// Produces the next questionnaire prompt. The first question is fixed; later
/// ones come from the generator when configured and valid, otherwise from the
/// deterministic fallback bank keyed by how many answers exist so far.
pub struct QuestionFlow {
    generator: Option<Arc<dyn QuestionGenerator>>,
}

impl QuestionFlow {
    pub fn new(generator: Option<Arc<dyn QuestionGenerator>>) -> Self {
        Self { generator }
    }

    pub async fn next_question(&self, index: u32, previous_answers: &[Answer]) -> Question {
        if index <= 1 || previous_answers.is_empty() {
            return Question::with_text(index.max(1), FIRST_QUESTION.to_string());
        }

        if let Some(generator) = &self.generator {
            let digest = digest(previous_answers);
            match generator.generate(&digest).await {
                Ok(raw) => {
                    if let Some(text) = validate_generated(&raw) {
                        return Question::with_text(index, text);
                    }
                    tracing::warn!(index, "generated question is malformed; using fallback");
                }
                Err(err) => {
                    tracing::warn!(index, error = %err, "question generation failed; using fallback");
                }
            }
        }

        fallback_question(index, previous_answers.len())
    }
}

/// Textual digest of prior answers handed to the generator, one line per
/// answer in submission order.
fn digest(previous_answers: &[Answer]) -> String {
    previous_answers
        .iter()
        .enumerate()
        .map(|(i, a)| format!("Q{}: {}", i + 1, a.label))
        .collect::<Vec<_>>()
        .join("\n")
}

fn validate_generated(raw: &str) -> Option<String> {
    let text = raw.trim();
    if !text.starts_with(REQUIRED_PREFIX) {
        return None;
    }
    // Reject prefix-only output.
    if text.len() <= REQUIRED_PREFIX.len() + 1 {
        return None;
    }
    Some(text.to_string())
}

/// Selection is purely a function of how many answers exist, so consecutive
/// failed generations walk the bank instead of repeating one entry.
fn fallback_question(index: u32, answered: usize) -> Question {
    let text = FALLBACK_QUESTIONS[answered % FALLBACK_QUESTIONS.len()];
    Question::with_text(index, text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedGenerator(anyhow::Result<String>);

    #[async_trait::async_trait]
    impl QuestionGenerator for CannedGenerator {
        async fn generate(&self, _digest: &str) -> anyhow::Result<String> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(e) => anyhow::bail!("{e}"),
            }
        }
    }

    fn answers(n: usize) -> Vec<Answer> {
        (1..=n)
            .map(|i| Answer::new(format!("q{i}"), "Agree"))
            .collect()
    }

    #[tokio::test]
    async fn first_question_is_fixed() {
        let flow = QuestionFlow::new(None);
        let q = flow.next_question(1, &[]).await;
        assert_eq!(q.id, 1);
        assert_eq!(q.text, FIRST_QUESTION);
        assert_eq!(q.options.len(), 5);
    }

    #[tokio::test]
    async fn first_question_ignores_any_generator() {
        let generator = Arc::new(CannedGenerator(Ok(format!(
            "{REQUIRED_PREFIX} Something generated."
        ))));
        let flow = QuestionFlow::new(Some(generator));
        let q = flow.next_question(1, &[]).await;
        assert_eq!(q.text, FIRST_QUESTION);
    }

    #[tokio::test]
    async fn valid_generated_question_is_used() {
        let text = format!("{REQUIRED_PREFIX} I would stay invested through a 20% drawdown.");
        let flow = QuestionFlow::new(Some(Arc::new(CannedGenerator(Ok(text.clone())))));
        let q = flow.next_question(3, &answers(2)).await;
        assert_eq!(q.id, 3);
        assert_eq!(q.text, text);
    }

    #[tokio::test]
    async fn malformed_output_falls_back() {
        let flow = QuestionFlow::new(Some(Arc::new(CannedGenerator(Ok(
            "Do you like risk?".to_string()
        )))));
        let q = flow.next_question(3, &answers(2)).await;
        assert_eq!(q.text, FALLBACK_QUESTIONS[2]);
    }

    #[tokio::test]
    async fn generator_error_falls_back() {
        let flow = QuestionFlow::new(Some(Arc::new(CannedGenerator(Err(anyhow::anyhow!(
            "api down"
        ))))));
        let q = flow.next_question(4, &answers(3)).await;
        assert_eq!(q.text, FALLBACK_QUESTIONS[3]);
    }

    #[tokio::test]
    async fn fallbacks_rotate_with_answer_count() {
        let flow = QuestionFlow::new(None);
        let mut seen = Vec::new();
        for answered in 1..=5 {
            let q = flow
                .next_question(answered as u32 + 1, &answers(answered))
                .await;
            seen.push(q.text);
        }
        // Five consecutive failures never repeat a question.
        let unique: std::collections::HashSet<_> = seen.iter().collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn digest_is_ordered_and_labelled() {
        let d = digest(&[Answer::new("q1", "Agree"), Answer::new("q2", "Neutral")]);
        assert_eq!(d, "Q1: Agree\nQ2: Neutral");
    }
}

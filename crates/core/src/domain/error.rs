use thiserror::Error;

/// Minimum number of questionnaire answers required for a scoring run.
pub const MIN_ANSWERS: usize = 3;

/// Validation failures on assessment input. These are caller problems and are
/// surfaced as rejections; they never degrade into a silent default score.
#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error("at least {min} answers are required (got {got})")]
    InsufficientData { got: usize, min: usize },

    #[error("unrecognized answer label {label:?} for question {question:?}")]
    InvalidResponse { question: String, label: String },

    #[error("assessment store unavailable")]
    Unavailable(#[source] anyhow::Error),
}

/// Unknown profile name at the input boundary. Raw strings are resolved to
/// [`crate::domain::profile::AllocationProfileName`] exactly once; downstream
/// code only ever sees the enum.
#[derive(Debug, Error)]
#[error("unknown risk profile {0:?}")]
pub struct InvalidProfile(pub String);

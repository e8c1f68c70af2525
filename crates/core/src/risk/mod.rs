pub mod scorer;
pub mod vocabulary;

pub use scorer::{RiskScorer, ValidationMode};

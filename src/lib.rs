// Public API for the pitch-accent grader library

pub mod accent;
pub mod collaborators;
pub mod config;
pub mod errors;
pub mod grading;
pub mod mora;
pub mod pipeline;
pub mod plausibility;
pub mod trace;
pub mod utils;

// Re-export commonly used types
pub use accent::AccentType;
pub use config::Config;
pub use errors::{GradeError, Result};
pub use grading::{
    aggregate::{OverallGrade, ScoreAggregator},
    bounds::{bounds, similarity, similarity_with_tolerance, within},
    devoicing::DevoicingClassifier,
    grader::Grader,
    result::GradeResult,
};
pub use mora::{split_mora, Mora, MoraSequence};
pub use pipeline::{GradingPipeline, WordReport, WordRequest};
pub use utils::{retry_with_backoff, RetryPolicy};

use serde::{Deserialize, Serialize};

use crate::accent::AccentType;

/// Sub-scores of a single contour match. All accuracies lie in `[0, 1]`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GradeResult {
    pub accent_type: AccentType,
    /// `None` for atamadaka, which has no initial rise.
    pub jump_accuracy: Option<f64>,
    pub pattern_accuracy: f64,
    /// Agreement of the two sustained high moras, nakadaka_late only.
    pub coefficient: Option<f64>,
    pub grade: f64,
}

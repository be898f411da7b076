use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    config::ScoringConfig,
    errors::{constants::MAX_GRADE, validation, GradeError, Result},
};

use super::result::GradeResult;

/// Learner-facing grade for one word.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OverallGrade {
    /// Pronunciation-plausibility coefficient supplied by speech recognition.
    pub coefficient: f64,
    /// Contour grade on the 0-100 scale, floored at the base grade.
    pub pitch_grade: f64,
    pub overall: f64,
    /// Contour sub-scores, absent when grading was skipped.
    pub detail: Option<GradeResult>,
}

impl OverallGrade {
    pub fn zero(coefficient: f64) -> Self {
        Self {
            coefficient,
            pitch_grade: 0.0,
            overall: 0.0,
            detail: None,
        }
    }
}

/// Scales a contour grade by the pronunciation-plausibility coefficient.
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    base_grade: f64,
}

impl ScoreAggregator {
    pub fn new(config: &ScoringConfig) -> Result<Self> {
        validation::validate_base_grade(config.base_grade)?;
        Ok(Self {
            base_grade: config.base_grade,
        })
    }

    /// Contour analysis is meaningless on unintelligible audio.
    pub fn is_worth_grading(&self, coefficient: f64) -> Result<bool> {
        if !coefficient.is_finite() || coefficient < 0.0 {
            return Err(GradeError::collaborator(format!(
                "plausibility coefficient must be a non-negative number, got {}",
                coefficient
            )));
        }
        Ok(coefficient != 0.0)
    }

    pub fn pitch_grade(&self, result: &GradeResult) -> f64 {
        self.base_grade + (MAX_GRADE - self.base_grade) * result.grade
    }

    /// Combine `coefficient` with the contour grade. `grade_contour` only runs
    /// when the coefficient is non-zero.
    pub fn aggregate<F>(&self, coefficient: f64, grade_contour: F) -> Result<OverallGrade>
    where
        F: FnOnce() -> Result<GradeResult>,
    {
        if !self.is_worth_grading(coefficient)? {
            warn!("Pronunciation not recognised, skipping contour grading");
            return Ok(OverallGrade::zero(coefficient));
        }

        let result = grade_contour()?;
        let pitch_grade = self.pitch_grade(&result);
        let overall = coefficient * pitch_grade;
        info!(coefficient, pitch_grade, overall, "Aggregated grade");

        Ok(OverallGrade {
            coefficient,
            pitch_grade,
            overall,
            detail: Some(result),
        })
    }
}

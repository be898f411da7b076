use crate::accent::AccentType;

/// Custom error types for the pitch-accent grader
#[derive(Debug, thiserror::Error)]
pub enum GradeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid accent type: {0}")]
    InvalidAccentType(String),

    #[error("{accent_type} needs at least {required} moras, got {actual}")]
    TooFewMoras {
        accent_type: AccentType,
        required: usize,
        actual: usize,
    },

    #[error("Pitch sequence has {pitches} values but the word has {symbols} moras")]
    LengthMismatch { pitches: usize, symbols: usize },

    #[error("Audio splice produced {actual} clips, expected {expected}")]
    SpliceCountMismatch { expected: usize, actual: usize },

    #[error("Invalid pitch {value} at mora {position}")]
    InvalidPitch { position: usize, value: f64 },

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl GradeError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_accent_type(value: impl std::fmt::Display) -> Self {
        Self::InvalidAccentType(value.to_string())
    }

    pub fn too_few_moras(accent_type: AccentType, required: usize, actual: usize) -> Self {
        Self::TooFewMoras {
            accent_type,
            required,
            actual,
        }
    }

    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator(message.into())
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }

    pub fn invalid_env_var(var_name: &str, value: &str) -> Self {
        Self::Config(format!("Invalid value for {}: {:?}", var_name, value))
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, GradeError>;

/// Input validation functions
pub mod validation {
    use super::*;

    /// Reject NaN or infinite pitch readings before they reach the grader.
    pub fn validate_pitches(pitches: &[f64]) -> Result<()> {
        for (position, &value) in pitches.iter().enumerate() {
            if !value.is_finite() {
                return Err(GradeError::InvalidPitch { position, value });
            }
        }
        Ok(())
    }

    pub fn validate_alignment(pitches: usize, symbols: usize) -> Result<()> {
        if pitches != symbols {
            return Err(GradeError::LengthMismatch { pitches, symbols });
        }
        Ok(())
    }

    pub fn validate_tolerance(tolerance: f64) -> Result<()> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(GradeError::config(format!(
                "pitch_tolerance must be a non-negative number, got {}",
                tolerance
            )));
        }
        Ok(())
    }

    pub fn validate_minimum_delta(minimum_delta: f64) -> Result<()> {
        if !minimum_delta.is_finite() || minimum_delta <= 0.0 {
            return Err(GradeError::config(format!(
                "minimum_delta must be positive, got {}",
                minimum_delta
            )));
        }
        Ok(())
    }

    pub fn validate_base_grade(base_grade: f64) -> Result<()> {
        if !(0.0..=constants::MAX_GRADE).contains(&base_grade) {
            return Err(GradeError::config(format!(
                "base_grade must lie in [0, {}], got {}",
                constants::MAX_GRADE,
                base_grade
            )));
        }
        Ok(())
    }

    pub fn validate_weight(name: &str, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(GradeError::config(format!(
                "{} must be a non-negative number, got {}",
                name, weight
            )));
        }
        Ok(())
    }
}

/// Constants used throughout the crate
pub mod constants {
    // Configuration constants
    pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

    // Grading constants
    pub const DEFAULT_PITCH_TOLERANCE: f64 = 0.05;
    pub const DEFAULT_MINIMUM_DELTA: f64 = 1.0; // semitones
    pub const DEFAULT_DEVOICED_MORA: [&str; 6] = ["く", "す", "っ", "ク", "ス", "ッ"];

    // Scoring constants
    pub const MAX_GRADE: f64 = 100.0;
    pub const DEFAULT_BASE_GRADE: f64 = 50.0;
    pub const DEFAULT_CORRECT_LANGUAGE_WEIGHT: f64 = 0.5;
    pub const DEFAULT_CORRECT_TEXT_WEIGHT: f64 = 0.5;
    pub const DEFAULT_EXPECTED_LANGUAGE: &str = "ja";

    // Retry constants
    pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;
    pub const DEFAULT_RETRY_DELAY_MS: u64 = 200;
    pub const MAX_RETRY_DELAY_MS: u64 = 5000;

    // Collaborator constants
    pub const COLLABORATOR_TIMEOUT_SECS: u64 = 30;

    // Environment variables
    pub const ENV_PITCH_TOLERANCE: &str = "PAG_PITCH_TOLERANCE";
    pub const ENV_MINIMUM_DELTA: &str = "PAG_MINIMUM_DELTA";
    pub const ENV_BASE_GRADE: &str = "PAG_BASE_GRADE";
    pub const ENV_CORRECT_LANGUAGE_WEIGHT: &str = "PAG_CORRECT_LANGUAGE_WEIGHT";
    pub const ENV_CORRECT_TEXT_WEIGHT: &str = "PAG_CORRECT_TEXT_WEIGHT";
    pub const ENV_PITCH_URL: &str = "PAG_PITCH_URL";
    pub const ENV_SPLICE_URL: &str = "PAG_SPLICE_URL";
    pub const ENV_ASR_URL: &str = "PAG_ASR_URL";
    pub const ENV_OTEL_HTTP_URL: &str = "PAG_OTEL_HTTP_URL";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_error_creation() {
        let config_error = GradeError::config("Test config error");
        assert!(matches!(config_error, GradeError::Config(_)));
        assert_eq!(
            config_error.to_string(),
            "Configuration error: Test config error"
        );

        let accent_error = GradeError::invalid_accent_type(7);
        assert!(matches!(accent_error, GradeError::InvalidAccentType(_)));
        assert_eq!(accent_error.to_string(), "Invalid accent type: 7");
    }

    #[test]
    fn test_too_few_moras_error() {
        let error = GradeError::too_few_moras(AccentType::NakadakaLate, 4, 3);
        assert!(matches!(
            error,
            GradeError::TooFewMoras {
                accent_type: AccentType::NakadakaLate,
                required: 4,
                actual: 3
            }
        ));
        assert_eq!(
            error.to_string(),
            "nakadaka_late needs at least 4 moras, got 3"
        );
    }

    #[test]
    fn test_splice_count_mismatch_error() {
        let error = GradeError::SpliceCountMismatch {
            expected: 5,
            actual: 4,
        };
        assert_eq!(
            error.to_string(),
            "Audio splice produced 4 clips, expected 5"
        );
    }

    mod validation_tests {
        use super::super::validation::*;
        use super::super::GradeError;

        #[test]
        fn test_validate_pitches_rejects_nan() {
            assert!(validate_pitches(&[60.0, 62.5, 61.0]).is_ok());

            let result = validate_pitches(&[60.0, f64::NAN, 61.0]);
            assert!(matches!(
                result,
                Err(GradeError::InvalidPitch { position: 1, .. })
            ));

            assert!(validate_pitches(&[f64::INFINITY]).is_err());
        }

        #[test]
        fn test_validate_alignment() {
            assert!(validate_alignment(4, 4).is_ok());
            assert!(matches!(
                validate_alignment(3, 4),
                Err(GradeError::LengthMismatch {
                    pitches: 3,
                    symbols: 4
                })
            ));
        }

        #[test]
        fn test_validate_tolerance() {
            assert!(validate_tolerance(0.0).is_ok());
            assert!(validate_tolerance(0.1).is_ok());
            assert!(validate_tolerance(-0.01).is_err());
            assert!(validate_tolerance(f64::NAN).is_err());
        }

        #[test]
        fn test_validate_minimum_delta() {
            assert!(validate_minimum_delta(1.0).is_ok());
            assert!(validate_minimum_delta(0.0).is_err());
            assert!(validate_minimum_delta(-2.0).is_err());
        }

        #[test]
        fn test_validate_base_grade() {
            assert!(validate_base_grade(0.0).is_ok());
            assert!(validate_base_grade(100.0).is_ok());
            assert!(validate_base_grade(100.5).is_err());
            assert!(validate_base_grade(-1.0).is_err());
        }

        #[test]
        fn test_validate_weight() {
            assert!(validate_weight("correct_text_weight", 0.5).is_ok());
            assert!(validate_weight("correct_text_weight", -0.5).is_err());
        }
    }
}

use std::{env, path::Path};

use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::{constants::*, validation, GradeError, Result};

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub grading: GradingConfig,
    pub scoring: ScoringConfig,
    pub services: ServicesConfig,
    pub otel_http_url: Option<String>,
}

/// Tolerances used by the contour matcher.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GradingConfig {
    pub pitch_tolerance: f64,
    pub minimum_delta: f64,
    pub devoiced_mora: Vec<String>,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            pitch_tolerance: DEFAULT_PITCH_TOLERANCE,
            minimum_delta: DEFAULT_MINIMUM_DELTA,
            devoiced_mora: DEFAULT_DEVOICED_MORA.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Weights for the learner-facing score.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub base_grade: f64,
    pub correct_language_weight: f64,
    pub correct_text_weight: f64,
    pub expected_language: String,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_grade: DEFAULT_BASE_GRADE,
            correct_language_weight: DEFAULT_CORRECT_LANGUAGE_WEIGHT,
            correct_text_weight: DEFAULT_CORRECT_TEXT_WEIGHT,
            expected_language: DEFAULT_EXPECTED_LANGUAGE.to_string(),
        }
    }
}

/// Endpoints of the external pitch, splicing and speech-recognition services.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServicesConfig {
    pub pitch_url: Option<String>,
    pub splice_url: Option<String>,
    pub asr_url: Option<String>,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            pitch_url: None,
            splice_url: None,
            asr_url: None,
            retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config file, or build one from `PAG_*` environment variables when the file is absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            info!(path = %path.display(), "Loading config file");
            let source = std::fs::read_to_string(path)?;
            Self::from_toml_str(&source)
        } else {
            info!(path = %path.display(), "Config file not found, reading environment");
            Self::from_env()
        }
    }

    /// Load `config.toml` from the working directory.
    pub fn load_default() -> Result<Self> {
        Self::load(DEFAULT_CONFIG_PATH)
    }

    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Some(value) = env_f64(ENV_PITCH_TOLERANCE)? {
            config.grading.pitch_tolerance = value;
        }
        if let Some(value) = env_f64(ENV_MINIMUM_DELTA)? {
            config.grading.minimum_delta = value;
        }
        if let Some(value) = env_f64(ENV_BASE_GRADE)? {
            config.scoring.base_grade = value;
        }
        if let Some(value) = env_f64(ENV_CORRECT_LANGUAGE_WEIGHT)? {
            config.scoring.correct_language_weight = value;
        }
        if let Some(value) = env_f64(ENV_CORRECT_TEXT_WEIGHT)? {
            config.scoring.correct_text_weight = value;
        }
        config.services.pitch_url = env::var(ENV_PITCH_URL).ok();
        config.services.splice_url = env::var(ENV_SPLICE_URL).ok();
        config.services.asr_url = env::var(ENV_ASR_URL).ok();
        config.otel_http_url = env::var(ENV_OTEL_HTTP_URL).ok();

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validation::validate_tolerance(self.grading.pitch_tolerance)?;
        validation::validate_minimum_delta(self.grading.minimum_delta)?;
        validation::validate_base_grade(self.scoring.base_grade)?;
        validation::validate_weight(
            "correct_language_weight",
            self.scoring.correct_language_weight,
        )?;
        validation::validate_weight("correct_text_weight", self.scoring.correct_text_weight)?;
        if self.services.retry_attempts == 0 {
            return Err(GradeError::config("retry_attempts must be at least 1"));
        }
        Ok(())
    }
}

fn env_f64(var_name: &str) -> Result<Option<f64>> {
    match env::var(var_name) {
        Ok(value) => {
            debug!(var = var_name, value = %value, "Config override from environment");
            value
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| GradeError::invalid_env_var(var_name, &value))
        }
        Err(_) => Ok(None),
    }
}

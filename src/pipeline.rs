use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;
use tracing::{error, info, info_span, instrument, warn, Instrument};

use crate::{
    accent::AccentType,
    collaborators::{
        http::{HttpAudioSplicer, HttpPitchExtractor, HttpPronunciationChecker},
        AudioClip, AudioSplicer, PitchExtractor, PronunciationChecker, Transcription,
    },
    config::Config,
    errors::{GradeError, Result},
    grading::{
        aggregate::{OverallGrade, ScoreAggregator},
        grader::Grader,
    },
    mora::{split_mora, Mora, MoraSequence},
    plausibility::PlausibilityScorer,
    utils::{retry_with_backoff, RetryPolicy},
};

/// A recorded word to grade.
#[derive(Clone, Debug)]
pub struct WordRequest {
    /// Kana spelling, e.g. `にほんです`.
    pub word: String,
    pub accent_type: AccentType,
    pub audio: AudioClip,
}

/// Everything learned about one word.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct WordReport {
    pub word: String,
    pub accent_type: AccentType,
    pub transcription: Transcription,
    /// Measured moras, empty when grading was skipped.
    pub moras: Vec<Mora>,
    pub grade: OverallGrade,
}

/// Drives the external services and the grading engine for whole words.
pub struct GradingPipeline {
    grader: Grader,
    aggregator: ScoreAggregator,
    plausibility: PlausibilityScorer,
    retry: RetryPolicy,
    splicer: Arc<dyn AudioSplicer + Send + Sync>,
    pitch_extractor: Arc<dyn PitchExtractor + Send + Sync>,
    checker: Arc<dyn PronunciationChecker + Send + Sync>,
}

impl GradingPipeline {
    pub fn new(
        config: &Config,
        splicer: Arc<dyn AudioSplicer + Send + Sync>,
        pitch_extractor: Arc<dyn PitchExtractor + Send + Sync>,
        checker: Arc<dyn PronunciationChecker + Send + Sync>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            grader: Grader::new(&config.grading)?,
            aggregator: ScoreAggregator::new(&config.scoring)?,
            plausibility: PlausibilityScorer::new(&config.scoring)?,
            retry: RetryPolicy::from(&config.services),
            splicer,
            pitch_extractor,
            checker,
        })
    }

    /// Build a pipeline backed by the HTTP services named in `[services]`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let services = &config.services;
        let url = |value: &Option<String>, name: &str| {
            value
                .clone()
                .ok_or_else(|| GradeError::config(format!("services.{} is not set", name)))
        };

        Self::new(
            config,
            Arc::new(HttpAudioSplicer::new(url(&services.splice_url, "splice_url")?)?),
            Arc::new(HttpPitchExtractor::new(url(&services.pitch_url, "pitch_url")?)?),
            Arc::new(HttpPronunciationChecker::new(url(&services.asr_url, "asr_url")?)?),
        )
    }

    pub fn grader(&self) -> &Grader {
        &self.grader
    }

    #[instrument(skip(self, request), fields(word = %request.word, accent_type = %request.accent_type))]
    pub async fn grade_word(&self, request: &WordRequest) -> Result<WordReport> {
        let transcription = retry_with_backoff(
            || self.checker.check(&request.audio, &request.word),
            &self.retry,
            "pronunciation check",
        )
        .await?;

        let coefficient = self.plausibility.coefficient(&transcription, &request.word);
        if !self.aggregator.is_worth_grading(coefficient)? {
            warn!(
                language = %transcription.language,
                text = %transcription.text,
                "Pronunciation not recognised, skipping pitch analysis"
            );
            return Ok(WordReport {
                word: request.word.clone(),
                accent_type: request.accent_type,
                transcription,
                moras: Vec::new(),
                grade: OverallGrade::zero(coefficient),
            });
        }

        let symbols = split_mora(&request.word);
        let clips = retry_with_backoff(
            || self.splicer.splice(&request.audio, symbols.len()),
            &self.retry,
            "audio splice",
        )
        .await?;

        if clips.len() != symbols.len() {
            error!(
                expected = symbols.len(),
                actual = clips.len(),
                "Incorrect syllable split"
            );
            return Err(GradeError::SpliceCountMismatch {
                expected: symbols.len(),
                actual: clips.len(),
            });
        }

        let pitches = self.extract_pitches(&clips).await?;
        let moras = MoraSequence::new(&symbols, &pitches)?;
        let grade = self.aggregator.aggregate(coefficient, || {
            self.grader.grade_sequence(request.accent_type, &moras)
        })?;

        info!(
            coefficient,
            pitch_grade = grade.pitch_grade,
            overall = grade.overall,
            "Graded word"
        );

        Ok(WordReport {
            word: request.word.clone(),
            accent_type: request.accent_type,
            transcription,
            moras: moras.moras().to_vec(),
            grade,
        })
    }

    /// Clips are independent, so all of them are measured concurrently.
    async fn extract_pitches(&self, clips: &[AudioClip]) -> Result<Vec<f64>> {
        try_join_all(clips.iter().enumerate().map(|(position, clip)| {
            retry_with_backoff(
                move || self.pitch_extractor.extract_pitch(clip),
                &self.retry,
                "pitch extraction",
            )
            .instrument(info_span!("mora_pitch", position))
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{MockAudioSplicer, MockPitchExtractor, MockPronunciationChecker};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const NIHON_DESU: [f64; 5] = [100.0, 150.0, 150.0, 100.0, 90.0];

    fn config() -> Config {
        let mut config = Config::default();
        config.grading.pitch_tolerance = 0.1;
        config.grading.minimum_delta = 10.0;
        config.services.retry_attempts = 2;
        config.services.retry_delay_ms = 1;
        config
    }

    fn clip(index: u8) -> AudioClip {
        AudioClip::new(vec![index])
    }

    fn request() -> WordRequest {
        WordRequest {
            word: "にほんです".to_string(),
            accent_type: AccentType::SuffixDrop,
            audio: AudioClip::new(&b"RIFF"[..]),
        }
    }

    fn checker(language: &'static str, text: &'static str) -> MockPronunciationChecker {
        let mut checker = MockPronunciationChecker::new();
        checker.expect_check().returning(move |_, _| {
            Ok(Transcription {
                language: language.to_string(),
                text: text.to_string(),
            })
        });
        checker
    }

    fn splicer() -> MockAudioSplicer {
        let mut splicer = MockAudioSplicer::new();
        splicer
            .expect_splice()
            .returning(|_, count| Ok((0..count).map(|i| clip(i as u8)).collect()));
        splicer
    }

    fn extractor(pitches: [f64; 5]) -> MockPitchExtractor {
        let mut extractor = MockPitchExtractor::new();
        extractor
            .expect_extract_pitch()
            .times(5)
            .returning(move |clip| Ok(pitches[clip.data[0] as usize]));
        extractor
    }

    fn pipeline(
        splicer: MockAudioSplicer,
        extractor: MockPitchExtractor,
        checker: MockPronunciationChecker,
    ) -> GradingPipeline {
        GradingPipeline::new(
            &config(),
            Arc::new(splicer),
            Arc::new(extractor),
            Arc::new(checker),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_grade_word_end_to_end() {
        let pipeline = pipeline(splicer(), extractor(NIHON_DESU), checker("ja", "にほんです。"));

        let report = pipeline.grade_word(&request()).await.unwrap();

        assert_eq!(report.moras.len(), 5);
        assert_eq!(report.moras[2].symbol, "ん");
        assert_eq!(report.moras[3].pitch, 100.0);
        assert_eq!(report.grade.coefficient, 1.0);
        assert_eq!(report.grade.pitch_grade, 100.0);
        assert_eq!(report.grade.overall, 100.0);
        assert_eq!(report.grade.detail.unwrap().grade, 1.0);
        assert!(pipeline.grader().devoicing().is_devoiced("す"));
    }

    #[tokio::test]
    async fn test_unrecognised_speech_skips_pitch_work() {
        let mut splicer = MockAudioSplicer::new();
        splicer.expect_splice().times(0);
        let mut extractor = MockPitchExtractor::new();
        extractor.expect_extract_pitch().times(0);

        let pipeline = pipeline(splicer, extractor, checker("en", ""));
        let report = pipeline.grade_word(&request()).await.unwrap();

        assert_eq!(report.grade, OverallGrade::zero(0.0));
        assert!(report.moras.is_empty());
        assert_eq!(report.transcription.language, "en");
    }

    #[tokio::test]
    async fn test_splice_count_mismatch_aborts() {
        let mut splicer = MockAudioSplicer::new();
        splicer
            .expect_splice()
            .returning(|_, _| Ok((0..4).map(clip).collect()));
        let mut extractor = MockPitchExtractor::new();
        extractor.expect_extract_pitch().times(0);

        let pipeline = pipeline(splicer, extractor, checker("ja", "にほんです"));
        let result = pipeline.grade_word(&request()).await;

        assert!(matches!(
            result,
            Err(GradeError::SpliceCountMismatch {
                expected: 5,
                actual: 4
            })
        ));
    }

    #[tokio::test]
    async fn test_pitch_failure_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut extractor = MockPitchExtractor::new();
        extractor.expect_extract_pitch().times(6).returning({
            let calls = calls.clone();
            move |clip| {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(GradeError::collaborator("pitch service unavailable"))
                } else {
                    Ok(NIHON_DESU[clip.data[0] as usize])
                }
            }
        });

        let pipeline = pipeline(splicer(), extractor, checker("ja", "にほんです"));
        let report = pipeline.grade_word(&request()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert_eq!(report.grade.overall, 100.0);
    }

    #[tokio::test]
    async fn test_nan_pitch_is_rejected() {
        let mut pitches = NIHON_DESU;
        pitches[1] = f64::NAN;

        let pipeline = pipeline(splicer(), extractor(pitches), checker("ja", "にほんです"));
        let result = pipeline.grade_word(&request()).await;

        assert!(matches!(
            result,
            Err(GradeError::InvalidPitch { position: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_too_short_word_is_a_precondition_error() {
        let mut extractor = MockPitchExtractor::new();
        extractor
            .expect_extract_pitch()
            .times(3)
            .returning(|clip| Ok(NIHON_DESU[clip.data[0] as usize]));

        let pipeline = pipeline(splicer(), extractor, checker("ja", "にほん"));
        let request = WordRequest {
            word: "にほん".to_string(),
            ..request()
        };

        let result = pipeline.grade_word(&request).await;
        assert!(matches!(
            result,
            Err(GradeError::TooFewMoras {
                accent_type: AccentType::SuffixDrop,
                required: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_from_config_requires_service_urls() {
        let result = GradingPipeline::from_config(&config());
        assert!(matches!(result, Err(GradeError::Config(_))));

        let mut config = config();
        config.services.pitch_url = Some("http://localhost:1/pitch".to_string());
        config.services.splice_url = Some("http://localhost:1/splice".to_string());
        config.services.asr_url = Some("http://localhost:1/asr".to_string());
        assert!(GradingPipeline::from_config(&config).is_ok());
    }
}

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

pub mod http;

/// Encoded audio as exchanged with the external services.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioClip {
    pub data: Bytes,
}

impl AudioClip {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

/// What the speech recogniser heard.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Transcription {
    pub language: String,
    pub text: String,
}

/// Estimates one pitch value (semitone scale) for a single-mora clip.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PitchExtractor {
    async fn extract_pitch(&self, clip: &AudioClip) -> Result<f64>;
}

/// Cuts a full utterance into per-mora clips.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioSplicer {
    async fn splice(&self, utterance: &AudioClip, mora_count: usize) -> Result<Vec<AudioClip>>;
}

/// Runs speech recognition over a full utterance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PronunciationChecker {
    async fn check(&self, utterance: &AudioClip, expected_text: &str) -> Result<Transcription>;
}

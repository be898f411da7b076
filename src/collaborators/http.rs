use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use tracing::debug;

use crate::errors::{constants::COLLABORATOR_TIMEOUT_SECS, GradeError, Result};

use super::{AudioClip, AudioSplicer, PitchExtractor, PronunciationChecker, Transcription};

const WAV_CONTENT_TYPE: &str = "audio/wav";

fn build_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(COLLABORATOR_TIMEOUT_SECS))
        .build()?)
}

#[derive(Deserialize, Debug)]
struct PitchResponse {
    pitch: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct SpliceResponse {
    clips: Vec<String>,
}

impl SpliceResponse {
    fn decode(self) -> Result<Vec<AudioClip>> {
        self.clips
            .iter()
            .map(|clip| -> Result<AudioClip> { Ok(AudioClip::new(STANDARD.decode(clip)?)) })
            .collect()
    }
}

/// Pitch-estimation service client.
///
/// Example:
/// ```rust,no_run
/// use pitch_accent_grader::collaborators::{AudioClip, PitchExtractor, http::HttpPitchExtractor};
///
/// # async fn run() -> pitch_accent_grader::Result<()> {
/// let extractor = HttpPitchExtractor::new("http://localhost:8000/pitch")?;
/// let _pitch = extractor.extract_pitch(&AudioClip::new(std::fs::read("ga.wav")?)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct HttpPitchExtractor {
    client: reqwest::Client,
    url: String,
}

impl HttpPitchExtractor {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PitchExtractor for HttpPitchExtractor {
    async fn extract_pitch(&self, clip: &AudioClip) -> Result<f64> {
        let response: PitchResponse = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, WAV_CONTENT_TYPE)
            .body(clip.data.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(pitch = ?response.pitch, "Pitch service response");
        response
            .pitch
            .ok_or_else(|| GradeError::collaborator("pitch service returned no pitch"))
    }
}

/// Audio-splicing service client. Clips come back base64-encoded.
#[derive(Clone, Debug)]
pub struct HttpAudioSplicer {
    client: reqwest::Client,
    url: String,
}

impl HttpAudioSplicer {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl AudioSplicer for HttpAudioSplicer {
    async fn splice(&self, utterance: &AudioClip, mora_count: usize) -> Result<Vec<AudioClip>> {
        let response: SpliceResponse = self
            .client
            .post(&self.url)
            .query(&[("mora_count", mora_count.to_string())])
            .header(reqwest::header::CONTENT_TYPE, WAV_CONTENT_TYPE)
            .body(utterance.data.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(clips = response.clips.len(), mora_count, "Splice service response");
        response.decode()
    }
}

/// Speech-recognition service client.
#[derive(Clone, Debug)]
pub struct HttpPronunciationChecker {
    client: reqwest::Client,
    url: String,
}

impl HttpPronunciationChecker {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PronunciationChecker for HttpPronunciationChecker {
    async fn check(&self, utterance: &AudioClip, expected_text: &str) -> Result<Transcription> {
        let transcription: Transcription = self
            .client
            .post(&self.url)
            .query(&[("expected_text", expected_text)])
            .header(reqwest::header::CONTENT_TYPE, WAV_CONTENT_TYPE)
            .body(utterance.data.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        debug!(
            language = %transcription.language,
            text = %transcription.text,
            "ASR service response"
        );
        Ok(transcription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_response_null() {
        let response: PitchResponse = serde_json::from_str(r#"{"pitch": null}"#).unwrap();
        assert_eq!(response.pitch, None);

        let response: PitchResponse = serde_json::from_str(r#"{"pitch": 63.5}"#).unwrap();
        assert_eq!(response.pitch, Some(63.5));
    }

    #[test]
    fn test_splice_response_decodes_clips() {
        let body = format!(
            r#"{{"clips": ["{}", "{}"]}}"#,
            STANDARD.encode(b"RIFFga"),
            STANDARD.encode(b"RIFFku")
        );
        let response: SpliceResponse = serde_json::from_str(&body).unwrap();
        let clips = response.decode().unwrap();

        assert_eq!(clips.len(), 2);
        assert_eq!(clips[1], AudioClip::new(&b"RIFFku"[..]));
    }

    #[test]
    fn test_splice_response_rejects_bad_base64() {
        let response: SpliceResponse =
            serde_json::from_str(r#"{"clips": ["not base64!"]}"#).unwrap();
        assert!(matches!(response.decode(), Err(GradeError::Base64(_))));
    }

    #[test]
    fn test_transcription_response() {
        let transcription: Transcription =
            serde_json::from_str(r#"{"language": "ja", "text": "日本です"}"#).unwrap();
        assert_eq!(transcription.language, "ja");
        assert_eq!(transcription.text, "日本です");
    }

    #[test]
    fn test_clients_build() {
        assert!(HttpPitchExtractor::new("http://localhost:1/pitch").is_ok());
        assert!(HttpAudioSplicer::new("http://localhost:1/splice").is_ok());
        assert!(HttpPronunciationChecker::new("http://localhost:1/asr").is_ok());
    }
}

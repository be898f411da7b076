//! Pronunciation-plausibility coefficient derived from a speech-recognition pass.
//!
//! The coefficient is the sum of a language weight and a text weight, each
//! scaled by how well the recogniser's output matches what the learner was
//! asked to say.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::{
    collaborators::Transcription,
    config::ScoringConfig,
    errors::{validation, Result},
};

static IGNORED_CHARACTERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\p{P}\p{S}]").unwrap());

#[derive(Debug, Clone)]
pub struct PlausibilityScorer {
    language_weight: f64,
    text_weight: f64,
    expected_language: String,
}

impl PlausibilityScorer {
    pub fn new(config: &ScoringConfig) -> Result<Self> {
        validation::validate_weight("correct_language_weight", config.correct_language_weight)?;
        validation::validate_weight("correct_text_weight", config.correct_text_weight)?;

        Ok(Self {
            language_weight: config.correct_language_weight,
            text_weight: config.correct_text_weight,
            expected_language: config.expected_language.trim().to_lowercase(),
        })
    }

    /// Largest coefficient this scorer can produce.
    pub fn max_coefficient(&self) -> f64 {
        self.language_weight + self.text_weight
    }

    pub fn coefficient(&self, transcription: &Transcription, expected_text: &str) -> f64 {
        let same_language = transcription.language.trim().to_lowercase() == self.expected_language;

        // A foreign-language pass usually comes back in Latin script.
        let reading: fn(&str) -> String = if same_language { to_hiragana } else { to_romaji };
        let heard = normalize(&reading(&transcription.text));
        let expected = normalize(&reading(expected_text));
        let similarity = text_similarity(&heard, &expected);

        let coefficient = if same_language {
            let text_credit = if heard == expected { 1.0 } else { similarity };
            self.language_weight + self.text_weight * text_credit
        } else {
            self.language_weight * similarity
        };

        debug!(
            language = %transcription.language,
            heard = %heard,
            expected = %expected,
            similarity,
            coefficient,
            "Scored pronunciation plausibility"
        );

        coefficient
    }
}

/// Kana reading of `text`, with kanji replaced by their dictionary reading.
pub fn to_hiragana(text: &str) -> String {
    kakasi::convert(text).hiragana
}

/// Hepburn romanization of `text`; Latin input passes through.
pub fn to_romaji(text: &str) -> String {
    kakasi::convert(text).romaji
}

/// Drop whitespace, punctuation and symbols, fold katakana into hiragana and
/// lower-case Latin letters.
pub fn normalize(text: &str) -> String {
    IGNORED_CHARACTERS
        .replace_all(text, "")
        .chars()
        .map(|c| match c {
            'ァ'..='ヶ' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
            _ => c.to_ascii_lowercase(),
        })
        .collect()
}

/// `1 - edit_distance / longer_length`, over characters.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        previous = current;
    }

    1.0 - previous[b.len()] as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> PlausibilityScorer {
        PlausibilityScorer::new(&ScoringConfig::default()).unwrap()
    }

    fn heard(language: &str, text: &str) -> Transcription {
        Transcription {
            language: language.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("日本です。"), "日本です");
        assert_eq!(normalize(" ニホン、です! "), "にほんです");
        assert_eq!(normalize("ラーメン"), "らーめん");
        assert_eq!(normalize("Nihon desu"), "nihondesu");
    }

    #[test]
    fn test_text_similarity() {
        assert_eq!(text_similarity("", ""), 1.0);
        assert_eq!(text_similarity("にほん", "にほん"), 1.0);
        assert!((text_similarity("にほん", "にほ") - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(text_similarity("abc", "xyz"), 0.0);
        assert_eq!(text_similarity("", "あ"), 0.0);
    }

    #[test]
    fn test_exact_transcription_earns_full_coefficient() {
        let coefficient = scorer().coefficient(&heard("ja", "日本です。"), "日本です");
        assert_eq!(coefficient, scorer().max_coefficient());
    }

    #[test]
    fn test_partial_transcription() {
        let coefficient = scorer().coefficient(&heard("ja", "にほ"), "にほん");
        assert!((coefficient - (0.5 + 0.5 * 2.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_kanji_transcription_is_read_as_kana() {
        let coefficient = scorer().coefficient(&heard("ja", "学生です"), "がくせいです");
        assert_eq!(coefficient, 1.0);
    }

    #[test]
    fn test_wrong_language_compares_romaji() {
        let coefficient = scorer().coefficient(&heard("en", "Nihon desu"), "にほんです");
        assert_eq!(coefficient, 0.5);

        let coefficient = scorer().coefficient(&heard("en", "Nihon"), "にほんです");
        assert!((coefficient - 0.5 * 5.0 / 9.0).abs() < 1e-12);

        let coefficient = scorer().coefficient(&heard("en", ""), "にほんです");
        assert_eq!(coefficient, 0.0);
    }

    #[test]
    fn test_language_match_ignores_case() {
        let coefficient = scorer().coefficient(&heard("JA", "にほん"), "にほん");
        assert_eq!(coefficient, 1.0);
    }
}

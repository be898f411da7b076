use serde::{Deserialize, Serialize};

use crate::errors::{validation, Result};

/// Small kana that merge with the preceding kana into a single mora.
const COMBINING_KANA: &[char] = &[
    'ぁ', 'ぃ', 'ぅ', 'ぇ', 'ぉ', 'ゃ', 'ゅ', 'ょ', 'ゎ', 'ァ', 'ィ', 'ゥ', 'ェ', 'ォ', 'ャ', 'ュ',
    'ョ', 'ヮ',
];

/// One measured mora of a word.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Mora {
    pub symbol: String,
    pub pitch: f64,
    pub position: usize,
}

/// Parallel symbol and pitch sequences for a single grading call.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MoraSequence {
    moras: Vec<Mora>,
}

impl MoraSequence {
    /// Zip symbols with pitches, rejecting mismatched lengths and non-finite pitches.
    pub fn new<S: AsRef<str>>(symbols: &[S], pitches: &[f64]) -> Result<Self> {
        validation::validate_alignment(pitches.len(), symbols.len())?;
        validation::validate_pitches(pitches)?;

        let moras = symbols
            .iter()
            .zip(pitches)
            .enumerate()
            .map(|(position, (symbol, &pitch))| Mora {
                symbol: symbol.as_ref().to_string(),
                pitch,
                position,
            })
            .collect();

        Ok(Self { moras })
    }

    pub fn len(&self) -> usize {
        self.moras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moras.is_empty()
    }

    pub fn moras(&self) -> &[Mora] {
        &self.moras
    }

    pub fn pitch(&self, position: usize) -> f64 {
        self.moras[position].pitch
    }

    pub fn symbol(&self, position: usize) -> &str {
        &self.moras[position].symbol
    }

    pub fn pitches(&self) -> Vec<f64> {
        self.moras.iter().map(|mora| mora.pitch).collect()
    }
}

/// Split a kana word into moras.
///
/// Example:
/// ```rust
/// use pitch_accent_grader::mora::split_mora;
///
/// assert_eq!(split_mora("しゃちょうです"), vec!["しゃ", "ちょ", "う", "で", "す"]);
/// ```
pub fn split_mora(word: &str) -> Vec<String> {
    let mut moras: Vec<String> = Vec::new();

    for c in word.chars().filter(|c| !c.is_whitespace()) {
        match moras.last_mut() {
            Some(previous) if COMBINING_KANA.contains(&c) => previous.push(c),
            _ => moras.push(c.to_string()),
        }
    }

    moras
}

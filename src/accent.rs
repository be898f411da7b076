use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{GradeError, Result};

/// Expected pitch contour of a word.
///
/// The integer codes accepted by [`AccentType::try_from`] follow declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccentType {
    /// Low first mora, high and flat from the second mora on.
    Heiban,
    /// High first mora, stepping down afterwards.
    Atamadaka,
    /// Low, high on the second mora, then stepping down.
    NakadakaEarly,
    /// Low, two sustained high moras, then stepping down.
    NakadakaLate,
    /// Low/high body followed by a drop on a two-mora suffix such as です.
    SuffixDrop,
}

impl AccentType {
    pub const ALL: [AccentType; 5] = [
        AccentType::Heiban,
        AccentType::Atamadaka,
        AccentType::NakadakaEarly,
        AccentType::NakadakaLate,
        AccentType::SuffixDrop,
    ];

    /// Smallest word this contour can be graded on when no mora is devoiced.
    pub fn minimum_moras(&self) -> usize {
        match self {
            AccentType::Heiban => 3,
            AccentType::Atamadaka => 2,
            AccentType::NakadakaEarly => 3,
            AccentType::NakadakaLate => 4,
            AccentType::SuffixDrop => 4,
        }
    }

    /// Whether the contour starts with a low-to-high jump.
    pub fn has_initial_jump(&self) -> bool {
        !matches!(self, AccentType::Atamadaka)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccentType::Heiban => "heiban",
            AccentType::Atamadaka => "atamadaka",
            AccentType::NakadakaEarly => "nakadaka_early",
            AccentType::NakadakaLate => "nakadaka_late",
            AccentType::SuffixDrop => "suffix_drop",
        }
    }
}

impl fmt::Display for AccentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for AccentType {
    type Error = GradeError;

    fn try_from(code: u8) -> Result<Self> {
        AccentType::ALL
            .get(code as usize)
            .copied()
            .ok_or_else(|| GradeError::invalid_accent_type(code))
    }
}

impl FromStr for AccentType {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        AccentType::ALL
            .into_iter()
            .find(|accent_type| accent_type.as_str() == normalized)
            .ok_or_else(|| GradeError::invalid_accent_type(s))
    }
}

use tracing::{debug, instrument};

use crate::{
    accent::AccentType,
    config::GradingConfig,
    errors::{validation, GradeError, Result},
    mora::{Mora, MoraSequence},
};

use super::{
    bounds::{bounds, similarity, similarity_with_tolerance},
    devoicing::DevoicingClassifier,
    result::GradeResult,
};

/// Scores a per-mora pitch sequence against one of the accent contours.
#[derive(Debug, Clone)]
pub struct Grader {
    tolerance: f64,
    minimum_delta: f64,
    devoicing: DevoicingClassifier,
}

/// The low-to-high step at the start of a word.
#[derive(Debug, Clone, Copy)]
struct Rise {
    high_index: usize,
    high: f64,
    jump_accuracy: f64,
}

impl Grader {
    pub fn new(config: &GradingConfig) -> Result<Self> {
        validation::validate_tolerance(config.pitch_tolerance)?;
        validation::validate_minimum_delta(config.minimum_delta)?;

        Ok(Self {
            tolerance: config.pitch_tolerance,
            minimum_delta: config.minimum_delta,
            devoicing: DevoicingClassifier::new(config.devoiced_mora.iter().cloned()),
        })
    }

    pub fn devoicing(&self) -> &DevoicingClassifier {
        &self.devoicing
    }

    /// Grade parallel symbol and pitch sequences.
    ///
    /// Example:
    /// ```rust
    /// use pitch_accent_grader::{AccentType, Grader, config::GradingConfig};
    ///
    /// let grader = Grader::new(&GradingConfig::default()).unwrap();
    /// let result = grader
    ///     .grade(AccentType::Heiban, &["に", "ほ", "ん"], &[60.0, 64.0, 64.0])
    ///     .unwrap();
    /// assert_eq!(result.grade, 1.0);
    /// ```
    pub fn grade<S: AsRef<str>>(
        &self,
        accent_type: AccentType,
        symbols: &[S],
        pitches: &[f64],
    ) -> Result<GradeResult> {
        let moras = MoraSequence::new(symbols, pitches)?;
        self.grade_sequence(accent_type, &moras)
    }

    #[instrument(skip(self, moras), fields(moras = moras.len()))]
    pub fn grade_sequence(
        &self,
        accent_type: AccentType,
        moras: &MoraSequence,
    ) -> Result<GradeResult> {
        let required = accent_type.minimum_moras();
        if moras.len() < required {
            return Err(GradeError::too_few_moras(accent_type, required, moras.len()));
        }

        let result = match accent_type {
            AccentType::Heiban => self.heiban(moras),
            AccentType::Atamadaka => self.atamadaka(moras),
            AccentType::NakadakaEarly => self.nakadaka_early(moras),
            AccentType::NakadakaLate => self.nakadaka_late(moras),
            AccentType::SuffixDrop => self.suffix_drop(moras),
        }?;

        debug!(
            jump_accuracy = ?result.jump_accuracy,
            pattern_accuracy = result.pattern_accuracy,
            coefficient = ?result.coefficient,
            grade = result.grade,
            "Graded pitch contour"
        );

        Ok(result)
    }

    fn heiban(&self, moras: &MoraSequence) -> Result<GradeResult> {
        let rise = self.initial_rise(moras);
        let credits: Vec<f64> = moras.moras()[2..]
            .iter()
            .map(|mora| self.plateau_credit(rise.high, mora))
            .collect();
        let pattern_accuracy = mean(&credits);

        Ok(GradeResult {
            accent_type: AccentType::Heiban,
            jump_accuracy: Some(rise.jump_accuracy),
            pattern_accuracy,
            coefficient: None,
            grade: rise.jump_accuracy * pattern_accuracy,
        })
    }

    fn atamadaka(&self, moras: &MoraSequence) -> Result<GradeResult> {
        let credits = self.descent(moras.pitch(0), &moras.moras()[1..]);
        let pattern_accuracy = mean(&credits);

        Ok(GradeResult {
            accent_type: AccentType::Atamadaka,
            jump_accuracy: None,
            pattern_accuracy,
            coefficient: None,
            grade: pattern_accuracy,
        })
    }

    fn nakadaka_early(&self, moras: &MoraSequence) -> Result<GradeResult> {
        let rise = self.initial_rise(moras);
        let start = rise.high_index + 1;
        if start >= moras.len() {
            return Err(GradeError::too_few_moras(
                AccentType::NakadakaEarly,
                start + 1,
                moras.len(),
            ));
        }

        let credits = self.descent(rise.high, &moras.moras()[start..]);
        let pattern_accuracy = mean(&credits);

        Ok(GradeResult {
            accent_type: AccentType::NakadakaEarly,
            jump_accuracy: Some(rise.jump_accuracy),
            pattern_accuracy,
            coefficient: None,
            grade: rise.jump_accuracy * pattern_accuracy,
        })
    }

    fn nakadaka_late(&self, moras: &MoraSequence) -> Result<GradeResult> {
        let rise = self.initial_rise(moras);
        let second_high_index = rise.high_index + 1;
        let start = second_high_index + 1;
        if start >= moras.len() {
            return Err(GradeError::too_few_moras(
                AccentType::NakadakaLate,
                start + 1,
                moras.len(),
            ));
        }

        let second_high = moras.pitch(second_high_index);
        let coefficient = similarity_with_tolerance(rise.high, second_high, self.tolerance);
        let credits = self.descent(second_high, &moras.moras()[start..]);
        let pattern_accuracy = mean(&credits);

        Ok(GradeResult {
            accent_type: AccentType::NakadakaLate,
            jump_accuracy: Some(rise.jump_accuracy),
            pattern_accuracy,
            coefficient: Some(coefficient),
            grade: rise.jump_accuracy * coefficient * pattern_accuracy,
        })
    }

    fn suffix_drop(&self, moras: &MoraSequence) -> Result<GradeResult> {
        let n = moras.len();
        let rise = self.initial_rise(moras);

        let suffix_start = n - 2;
        let body: Vec<f64> = moras.moras()[2..suffix_start]
            .iter()
            .map(|mora| self.plateau_credit(rise.high, mora))
            .collect();

        let suffix_low = moras.pitch(suffix_start);
        let drop_accuracy = self.jump_score(moras.pitch(suffix_start - 1) - suffix_low);
        let jump_accuracy = (rise.jump_accuracy + drop_accuracy) / 2.0;

        let (last, _) = self.descent_step(suffix_low, &moras.moras()[n - 1]);
        let pattern_accuracy = (body.iter().sum::<f64>() + last) / (body.len() + 1) as f64;

        Ok(GradeResult {
            accent_type: AccentType::SuffixDrop,
            jump_accuracy: Some(jump_accuracy),
            pattern_accuracy,
            coefficient: None,
            grade: jump_accuracy * pattern_accuracy,
        })
    }

    /// A devoiced second mora cannot anchor the rise, so the third one is used instead.
    fn initial_rise(&self, moras: &MoraSequence) -> Rise {
        let high_index = if self.devoicing.is_devoiced(moras.symbol(1)) && moras.len() > 2 {
            2
        } else {
            1
        };
        let high = moras.pitch(high_index);

        Rise {
            high_index,
            high,
            jump_accuracy: self.jump_score(high - moras.pitch(0)),
        }
    }

    fn jump_score(&self, delta: f64) -> f64 {
        if delta <= 0.0 {
            0.0
        } else if delta <= self.minimum_delta {
            similarity(self.minimum_delta, delta)
        } else {
            1.0
        }
    }

    /// Credit for a mora expected to stay level with `high`.
    fn plateau_credit(&self, high: f64, mora: &Mora) -> f64 {
        if self.devoicing.is_devoiced(&mora.symbol) {
            debug!(position = mora.position, symbol = %mora.symbol, "Devoiced mora, full credit");
            return 1.0;
        }
        similarity_with_tolerance(high, mora.pitch, self.tolerance)
    }

    /// Credits for a contour that steps down from `reference`, each confirmed
    /// drop becoming the next reference.
    fn descent(&self, reference: f64, moras: &[Mora]) -> Vec<f64> {
        moras
            .iter()
            .fold(
                (reference, Vec::with_capacity(moras.len())),
                |(reference, mut credits), mora| {
                    let (credit, next) = self.descent_step(reference, mora);
                    credits.push(credit);
                    (next, credits)
                },
            )
            .1
    }

    /// Returns the credit for `mora` and the reference for the following one.
    fn descent_step(&self, reference: f64, mora: &Mora) -> (f64, f64) {
        if self.devoicing.is_devoiced(&mora.symbol) {
            debug!(position = mora.position, symbol = %mora.symbol, "Devoiced mora, full credit");
            return (1.0, reference);
        }

        let (lower, _) = bounds(reference, self.tolerance);
        if mora.pitch <= lower {
            (1.0, mora.pitch)
        } else {
            // A missed drop still moves the reference forward.
            (similarity(lower, mora.pitch), mora.pitch)
        }
    }
}

fn mean(credits: &[f64]) -> f64 {
    credits.iter().sum::<f64>() / credits.len() as f64
}

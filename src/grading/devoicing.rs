use std::collections::HashSet;

use crate::errors::constants::DEFAULT_DEVOICED_MORA;

/// Flags moras whose vowel is commonly devoiced, so their pitch reading is unreliable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevoicingClassifier {
    devoiced: HashSet<String>,
}

impl Default for DevoicingClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_DEVOICED_MORA)
    }
}

impl DevoicingClassifier {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            devoiced: symbols.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_devoiced(&self, symbol: &str) -> bool {
        self.devoiced.contains(symbol)
    }
}

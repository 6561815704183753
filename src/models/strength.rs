use serde::{Deserialize, Serialize};

/// Per-bar long / short accumulation strength, each value in [0, 1].
/// Parallel to the bar series it was computed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrengthSeries {
    pub long_strength: Vec<f64>,
    pub short_strength: Vec<f64>,
}

impl StrengthSeries {
    pub fn len(&self) -> usize {
        self.long_strength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.long_strength.is_empty()
    }

    /// (long, short) at the most recent bar.
    pub fn latest(&self) -> Option<(f64, f64)> {
        Some((*self.long_strength.last()?, *self.short_strength.last()?))
    }
}

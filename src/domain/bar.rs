use serde::{Deserialize, Serialize};

/// One price / volume / open interest bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp_ms: i64,

    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,

    pub volume: f64,
    pub open_interest: f64,
}

impl Bar {
    // A constructor for convenience
    pub fn new(
        timestamp_ms: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        open_interest: f64,
    ) -> Self {
        Bar {
            timestamp_ms,
            open,
            high,
            low,
            close,
            volume,
            open_interest,
        }
    }

    /// A bar where only close, volume and open interest are known
    /// (open/high/low collapse onto the close).
    pub fn from_close(timestamp_ms: i64, close: f64, volume: f64, open_interest: f64) -> Self {
        Self::new(timestamp_ms, close, close, close, close, volume, open_interest)
    }

    /// First problem found with this bar, if any.
    pub(crate) fn defect(&self) -> Option<String> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
            ("open_interest", self.open_interest),
        ];
        if let Some((name, val)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Some(format!("{name} is not finite ({val})"));
        }
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        if let Some((name, val)) = prices.iter().find(|(_, v)| *v <= 0.0) {
            return Some(format!("{name} must be positive ({val})"));
        }
        if self.volume < 0.0 {
            return Some(format!("volume is negative ({})", self.volume));
        }
        if self.open_interest < 0.0 {
            return Some(format!("open_interest is negative ({})", self.open_interest));
        }
        None
    }
}

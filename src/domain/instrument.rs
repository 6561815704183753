use {
    crate::utils::TimeUtils,
    serde::{Deserialize, Serialize},
};

/// The traded contract a bar series belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, Hash, Eq, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    /// Bar interval when known (e.g. 3600000 for 1h)
    pub interval_ms: Option<i64>,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, interval_ms: Option<i64>) -> Self {
        Self {
            symbol: symbol.into(),
            interval_ms,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.interval_ms {
            Some(ms) => write!(f, "{} ({})", self.symbol, TimeUtils::interval_to_string(ms)),
            None => write!(f, "{}", self.symbol),
        }
    }
}

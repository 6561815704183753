use {
    serde::{Deserialize, Serialize},
    strum_macros::Display,
};

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ZoneType {
    /// Qualifies in both the recent window and the full history.
    Persistent,
    /// Qualifies in only one of the two horizons.
    Transient,
}

/// A price band where decay-weighted trading activity concentrates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChipZone {
    pub low: f64,
    pub high: f64,
    pub recent_strength: f64,
    pub all_strength: f64,
    pub avg_strength: f64,
    pub persistent: bool,
    pub zone_type: ZoneType,
}

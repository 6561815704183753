use {
    crate::{
        domain::Instrument,
        models::{ChipZone, StrengthSeries, TrendDetection},
    },
    serde::{Deserialize, Serialize},
};

/// Everything the three estimators derive from one bar series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReport {
    pub instrument: Instrument,
    pub bar_count: usize,
    pub first_timestamp_ms: i64,
    pub last_timestamp_ms: i64,
    pub strength: StrengthSeries,
    pub zones: Vec<ChipZone>,
    pub trend: TrendDetection,
}

impl SymbolReport {
    pub fn persistent_zone_count(&self) -> usize {
        self.zones.iter().filter(|z| z.persistent).count()
    }
}

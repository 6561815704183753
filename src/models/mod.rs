mod bar_series;
mod chip_zone;
mod price_bins;
mod report;
mod strength;
mod trend;

pub use {
    bar_series::BarSeries,
    chip_zone::{ChipZone, ZoneType},
    price_bins::PriceBins,
    report::SymbolReport,
    strength::StrengthSeries,
    trend::{Direction, TrendDetection, TrendSegment, TrendThresholds},
};

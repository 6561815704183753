// Accumulation strength, chip zones, trend segments and the per-symbol pipeline
pub mod accumulation;
pub mod chip_zones;
pub mod pipeline;
pub mod trend_segments;

pub use {
    accumulation::calc_accumulation_strength,
    chip_zones::{ZoneProfile, chip_weights, chip_zone_profile, estimate_chip_zones},
    pipeline::{analyze_batch, analyze_series},
    trend_segments::{detect_trend_segments, detect_trends, resolve_overlaps, trend_thresholds},
};

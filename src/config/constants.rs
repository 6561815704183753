// Top Level Constants

/// Added to the |return| sum so an all-flat window divides to 0 instead of NaN.
pub const STRENGTH_EPSILON: f64 = 1e-9;

/// Floors for the bin width and the decay half-life.
pub const BIN_WIDTH_EPSILON: f64 = 1e-6;
pub const HALF_LIFE_EPSILON: f64 = 1e-6;

/// Upper bound on the chip histogram size.
pub const MAX_PRICE_BINS: usize = 100_000;

/// Percentiles of the smoothed strength used as the [lo, hi] rescale range.
pub const STRENGTH_RESCALE_LO: f64 = 0.02;
pub const STRENGTH_RESCALE_HI: f64 = 0.98;

pub mod report {
    /// Zone strengths at or above this quantile (per column) are flagged strong.
    pub const STRONG_QUANTILE: f64 = 0.8;
    pub const STRONG_PREFIX: &str = "strong:";
}

pub mod loader {
    /// Header fragments that identify an open interest column.
    pub const OI_COLUMN_KEYWORDS: &[&str] = &["open_interest", "oi", "position", "hold", "持仓"];
}

use {
    crate::config::constants::BIN_WIDTH_EPSILON,
    serde::{Deserialize, Serialize},
};

/// Fixed-width, contiguous, half-open price bins `[low, high)`.
/// Bin `k` covers `[start + k * width, start + (k + 1) * width)`; the bin count
/// is chosen so the highest price always falls inside the last bin.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PriceBins {
    pub start: f64,
    pub bin_width: f64,
    pub n_bins: usize,
}

impl PriceBins {
    /// Bins spanning `[min_price, max_price]` with the given width.
    /// The width is floored at a small epsilon so a flat price range still
    /// produces exactly one bin.
    pub fn spanning(min_price: f64, max_price: f64, bin_width: f64) -> Self {
        let bin_width = if bin_width.is_finite() {
            bin_width.max(BIN_WIDTH_EPSILON)
        } else {
            BIN_WIDTH_EPSILON
        };
        let span = (max_price - min_price).max(0.0);
        let n_bins = (span / bin_width).floor() as usize + 1;

        Self {
            start: min_price,
            bin_width,
            n_bins,
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.n_bins as f64 * self.bin_width
    }

    pub fn bin_index(&self, price: f64) -> usize {
        let index = ((price - self.start) / self.bin_width).floor();
        if index <= 0.0 {
            0
        } else {
            (index as usize).min(self.n_bins - 1)
        }
    }

    pub fn bin_bounds(&self, idx: usize) -> (f64, f64) {
        let low = self.start + idx as f64 * self.bin_width;
        let high = self.start + (idx + 1) as f64 * self.bin_width;
        (low, high)
    }

    /// Sum of `weights` falling into each bin.
    pub fn weighted_histogram(&self, prices: &[f64], weights: &[f64]) -> Vec<f64> {
        debug_assert_eq!(prices.len(), weights.len());

        let mut hist = vec![0.0; self.n_bins];
        for (&price, &weight) in prices.iter().zip(weights) {
            hist[self.bin_index(price)] += weight;
        }
        hist
    }
}

use {
    crate::{
        domain::{Bar, Instrument},
        error::{AnalysisError, AnalysisResult},
    },
    serde::{Deserialize, Serialize},
};

/// Ordered, immutable bar series stored column-wise.
/// Built once through [`BarSeries::new`], which enforces the invariants every
/// estimator relies on: at least one bar, strictly increasing timestamps,
/// finite fields, non-negative volume and open interest.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BarSeries {
    instrument: Instrument,
    timestamps: Vec<i64>,
    open_prices: Vec<f64>,
    high_prices: Vec<f64>,
    low_prices: Vec<f64>,
    close_prices: Vec<f64>,
    volumes: Vec<f64>,
    open_interest: Vec<f64>,
}

impl BarSeries {
    pub fn new(instrument: Instrument, bars: Vec<Bar>) -> AnalysisResult<Self> {
        if bars.is_empty() {
            return Err(AnalysisError::EmptySeries);
        }

        let len = bars.len();
        let mut ts_vec = Vec::with_capacity(len);
        let mut open_vec = Vec::with_capacity(len);
        let mut high_vec = Vec::with_capacity(len);
        let mut low_vec = Vec::with_capacity(len);
        let mut close_vec = Vec::with_capacity(len);
        let mut vol_vec = Vec::with_capacity(len);
        let mut oi_vec = Vec::with_capacity(len);

        for (i, bar) in bars.iter().enumerate() {
            if let Some(reason) = bar.defect() {
                return Err(AnalysisError::invalid_bar(i, reason));
            }
            if let Some(&prev_ts) = ts_vec.last() {
                if bar.timestamp_ms <= prev_ts {
                    return Err(AnalysisError::invalid_bar(
                        i,
                        format!(
                            "timestamp {} does not follow previous {}",
                            bar.timestamp_ms, prev_ts
                        ),
                    ));
                }
            }

            ts_vec.push(bar.timestamp_ms);
            open_vec.push(bar.open);
            high_vec.push(bar.high);
            low_vec.push(bar.low);
            close_vec.push(bar.close);
            vol_vec.push(bar.volume);
            oi_vec.push(bar.open_interest);
        }

        Ok(Self {
            instrument,
            timestamps: ts_vec,
            open_prices: open_vec,
            high_prices: high_vec,
            low_prices: low_vec,
            close_prices: close_vec,
            volumes: vol_vec,
            open_interest: oi_vec,
        })
    }

    /// Convenience for close-only data (open/high/low collapse onto close).
    /// Timestamps are the bar indices.
    pub fn from_columns(
        instrument: Instrument,
        closes: &[f64],
        volumes: &[f64],
        open_interest: &[f64],
    ) -> AnalysisResult<Self> {
        if closes.len() != volumes.len() || closes.len() != open_interest.len() {
            return Err(AnalysisError::invalid_param(
                "columns",
                format!(
                    "close/volume/open_interest lengths differ ({}/{}/{})",
                    closes.len(),
                    volumes.len(),
                    open_interest.len()
                ),
            ));
        }
        let bars = closes
            .iter()
            .zip(volumes)
            .zip(open_interest)
            .enumerate()
            .map(|(i, ((&c, &v), &oi))| Bar::from_close(i as i64, c, v, oi))
            .collect();
        Self::new(instrument, bars)
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn len(&self) -> usize {
        self.close_prices.len()
    }

    /// Always false for a constructed series; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.close_prices.is_empty()
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn closes(&self) -> &[f64] {
        &self.close_prices
    }

    pub fn highs(&self) -> &[f64] {
        &self.high_prices
    }

    pub fn volumes(&self) -> &[f64] {
        &self.volumes
    }

    pub fn open_interest(&self) -> &[f64] {
        &self.open_interest
    }

    pub fn first_timestamp_ms(&self) -> i64 {
        self.timestamps[0]
    }

    pub fn last_timestamp_ms(&self) -> i64 {
        self.timestamps[self.len() - 1]
    }

    pub fn get_bar(&self, idx: usize) -> Bar {
        Bar::new(
            self.timestamps[idx],
            self.open_prices[idx],
            self.high_prices[idx],
            self.low_prices[idx],
            self.close_prices[idx],
            self.volumes[idx],
            self.open_interest[idx],
        )
    }

    /// Index of the first bar in the trailing `window` bars.
    /// A window longer than the series covers the whole series.
    pub fn tail_start(&self, window: usize) -> usize {
        self.len().saturating_sub(window)
    }
}

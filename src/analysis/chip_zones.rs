//! Decay-weighted volume-at-price ("chip") zones.
//!
//! Each bar deposits `volume * (1 + max(ΔOI, 0))^beta * decay(age)` into the
//! price bin its close falls in. Two histograms are built: one over the whole
//! series and one over the trailing `window_zone` bars. Both are max-normalized
//! and a bin qualifies in a horizon when it reaches the configured quantile of
//! that horizon's non-zero bins.

use {
    crate::{
        config::{
            ChipZoneParams, DF,
            constants::{HALF_LIFE_EPSILON, MAX_PRICE_BINS},
        },
        error::{AnalysisError, AnalysisResult},
        models::{BarSeries, ChipZone, PriceBins, ZoneType},
        utils::{finite_or_zero, mean, min_max, normalize_max, quantile_linear},
    },
    serde::{Deserialize, Serialize},
    std::f64::consts::LN_2,
};

/// The normalized histograms behind a set of chip zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneProfile {
    pub bins: PriceBins,
    pub recent: Vec<f64>,
    pub all: Vec<f64>,
    /// None when the horizon has no non-zero bins (nothing can qualify).
    pub recent_threshold: Option<f64>,
    pub all_threshold: Option<f64>,
}

impl ZoneProfile {
    fn qualifies(hist: &[f64], threshold: Option<f64>, idx: usize) -> bool {
        threshold.is_some_and(|t| hist[idx] >= t)
    }

    /// Zones for every bin that qualifies in either horizon, ordered by price.
    pub fn zones(&self) -> Vec<ChipZone> {
        (0..self.bins.n_bins)
            .filter_map(|idx| {
                let in_recent = Self::qualifies(&self.recent, self.recent_threshold, idx);
                let in_all = Self::qualifies(&self.all, self.all_threshold, idx);
                if !(in_recent || in_all) {
                    return None;
                }

                let (low, high) = self.bins.bin_bounds(idx);
                let recent_strength = self.recent[idx];
                let all_strength = self.all[idx];
                let persistent = in_recent && in_all;
                Some(ChipZone {
                    low,
                    high,
                    recent_strength,
                    all_strength,
                    avg_strength: (recent_strength + all_strength) / 2.0,
                    persistent,
                    zone_type: if persistent {
                        ZoneType::Persistent
                    } else {
                        ZoneType::Transient
                    },
                })
            })
            .collect()
    }
}

/// Per-bar deposit weights. Age is measured in days from the last bar.
pub fn chip_weights(series: &BarSeries, params: &ChipZoneParams) -> Vec<f64> {
    let n = series.len();
    let oi = series.open_interest();
    let half_life = params.half_life.max(HALF_LIFE_EPSILON);

    series
        .volumes()
        .iter()
        .enumerate()
        .map(|(i, &volume)| {
            let delta_oi = if i == 0 { 0.0 } else { (oi[i] - oi[i - 1]).max(0.0) };
            let age_days = (n - 1 - i) as f64 / params.bars_per_day;
            let decay = (-LN_2 * age_days / half_life).exp();
            finite_or_zero(volume * (1.0 + delta_oi).powf(params.beta) * decay)
        })
        .collect()
}

pub fn chip_zone_profile(
    series: &BarSeries,
    params: &ChipZoneParams,
) -> AnalysisResult<ZoneProfile> {
    params.validate()?;

    let closes = series.closes();
    let weights = chip_weights(series, params);

    let (min_price, max_price) = min_max(closes);
    let bin_width = mean(closes) * params.bins_pct / 100.0;
    let bins = PriceBins::spanning(min_price, max_price, bin_width);
    if bins.n_bins > MAX_PRICE_BINS {
        return Err(AnalysisError::invalid_param(
            "bins_pct",
            format!(
                "{}% of the mean close gives {} bins (limit {})",
                params.bins_pct, bins.n_bins, MAX_PRICE_BINS
            ),
        ));
    }

    let recent_start = series.tail_start(params.window_zone);
    let all = normalize_max(&bins.weighted_histogram(closes, &weights));
    let recent = normalize_max(
        &bins.weighted_histogram(&closes[recent_start..], &weights[recent_start..]),
    );

    let recent_threshold = nonzero_quantile(&recent, params.quantile);
    let all_threshold = nonzero_quantile(&all, params.quantile);

    Ok(ZoneProfile {
        bins,
        recent,
        all,
        recent_threshold,
        all_threshold,
    })
}

pub fn estimate_chip_zones(
    series: &BarSeries,
    params: &ChipZoneParams,
) -> AnalysisResult<Vec<ChipZone>> {
    let profile = chip_zone_profile(series, params)?;
    let zones = profile.zones();

    if DF.log_zones {
        log::debug!(
            "{}: {} bins of width {:.4}, {} zones ({} persistent)",
            series.instrument(),
            profile.bins.n_bins,
            profile.bins.bin_width,
            zones.len(),
            zones.iter().filter(|z| z.persistent).count()
        );
    }

    Ok(zones)
}

fn nonzero_quantile(hist: &[f64], q: f64) -> Option<f64> {
    let nonzero: Vec<f64> = hist.iter().copied().filter(|&v| v > 0.0).collect();
    quantile_linear(&nonzero, q)
}

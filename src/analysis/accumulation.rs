//! Accumulation strength: volume-confirmed directional pressure per bar.
//!
//! For every bar the trailing `window_strength` returns are split into their
//! positive and negative parts; each part's share of the total absolute return
//! is scaled by the bar's relative volume, EMA-smoothed, then rescaled onto
//! [0, 1] using the 2nd/98th percentiles of the whole smoothed series so that
//! a single spike cannot flatten the rest of the signal.

use crate::{
    config::{
        DF, StrengthParams, WarmupPolicy,
        constants::{STRENGTH_EPSILON, STRENGTH_RESCALE_HI, STRENGTH_RESCALE_LO},
    },
    error::AnalysisResult,
    models::{BarSeries, StrengthSeries},
    utils::{ema, finite_or_zero, quantile_linear, rescale_clip, rolling_mean, rolling_sum, simple_returns},
};

pub fn calc_accumulation_strength(
    series: &BarSeries,
    params: &StrengthParams,
) -> AnalysisResult<StrengthSeries> {
    params.validate()?;

    let window = params.window_strength;
    let n = series.len();

    let returns = simple_returns(series.closes());
    let ups: Vec<f64> = returns.iter().map(|r| r.max(0.0)).collect();
    let downs: Vec<f64> = returns.iter().map(|r| (-r).max(0.0)).collect();
    let abs: Vec<f64> = returns.iter().map(|r| r.abs()).collect();

    let up_sums = rolling_sum(&ups, window);
    let down_sums = rolling_sum(&downs, window);
    let abs_sums = rolling_sum(&abs, window);

    let volume_means = rolling_mean(series.volumes(), window);
    let vol_norm: Vec<f64> = series
        .volumes()
        .iter()
        .zip(&volume_means)
        .map(|(&v, &avg)| if avg > 0.0 { finite_or_zero(v / avg) } else { 0.0 })
        .collect();

    // First bar with a usable raw value.
    let warm_start = match params.warmup {
        WarmupPolicy::Partial => 0,
        WarmupPolicy::ZeroFill => (window - 1).min(n),
    };

    let mut long_raw = Vec::with_capacity(n);
    let mut short_raw = Vec::with_capacity(n);
    for i in 0..n {
        let denom = abs_sums[i] + STRENGTH_EPSILON;
        long_raw.push(up_sums[i] / denom * vol_norm[i]);
        short_raw.push(down_sums[i] / denom * vol_norm[i]);
    }

    let long_strength =
        rescale_by_percentiles(&smooth_after(&long_raw, params.smooth_span, warm_start));
    let short_strength =
        rescale_by_percentiles(&smooth_after(&short_raw, params.smooth_span, warm_start));

    if DF.log_strength {
        log::debug!(
            "{}: accumulation strength over {} bars (window {}, span {}, warmup {})",
            series.instrument(),
            n,
            window,
            params.smooth_span,
            params.warmup
        );
    }

    Ok(StrengthSeries {
        long_strength,
        short_strength,
    })
}

/// EMA seeded on `raw[warm_start]`; earlier bars are 0.
fn smooth_after(raw: &[f64], span: usize, warm_start: usize) -> Vec<f64> {
    let mut out = vec![0.0; warm_start];
    out.extend(ema(&raw[warm_start..], span));
    out
}

/// Zero-fills non-finite values, then maps [p2, p98] onto [0, 1] and clips.
fn rescale_by_percentiles(smoothed: &[f64]) -> Vec<f64> {
    let cleaned: Vec<f64> = smoothed.iter().copied().map(finite_or_zero).collect();
    let lo = quantile_linear(&cleaned, STRENGTH_RESCALE_LO).unwrap_or(0.0);
    let hi = quantile_linear(&cleaned, STRENGTH_RESCALE_HI).unwrap_or(0.0);
    cleaned.iter().map(|&v| rescale_clip(v, lo, hi)).collect()
}

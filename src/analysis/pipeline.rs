use {
    super::{
        accumulation::calc_accumulation_strength, chip_zones::estimate_chip_zones,
        trend_segments::detect_trend_segments,
    },
    crate::{
        config::{AnalysisConfig, DF},
        error::AnalysisResult,
        models::{BarSeries, SymbolReport},
    },
    rayon::prelude::*,
};

/// Runs all three estimators over one series.
/// They share nothing but the read-only input, so they run side by side.
pub fn analyze_series(series: &BarSeries, config: &AnalysisConfig) -> AnalysisResult<SymbolReport> {
    config.validate()?;

    let label = series.instrument().to_string();
    let (strength, (zones, trend)) = crate::trace_time!(&format!("Analyze [{}]", label), 100_000, {
        rayon::join(
            || calc_accumulation_strength(series, &config.strength),
            || {
                rayon::join(
                    || estimate_chip_zones(series, &config.zones),
                    || detect_trend_segments(series, &config.trend),
                )
            },
        )
    });

    let report = SymbolReport {
        instrument: series.instrument().clone(),
        bar_count: series.len(),
        first_timestamp_ms: series.first_timestamp_ms(),
        last_timestamp_ms: series.last_timestamp_ms(),
        strength: strength?,
        zones: zones?,
        trend: trend?,
    };

    if DF.log_pipeline {
        log::info!(
            "{}: {} bars, {} zones ({} persistent), {} trend segments",
            label,
            report.bar_count,
            report.zones.len(),
            report.persistent_zone_count(),
            report.trend.segments.len()
        );
    }

    Ok(report)
}

/// Analyzes many series in parallel. `config_for` picks the parameters for
/// each series (e.g. to adapt `bars_per_day` to its bar interval).
/// Results keep the input order; one failing series does not affect the rest.
pub fn analyze_batch<F>(series: &[BarSeries], config_for: F) -> Vec<AnalysisResult<SymbolReport>>
where
    F: Fn(&BarSeries) -> AnalysisConfig + Sync,
{
    series
        .par_iter()
        .map(|s| analyze_series(s, &config_for(s)))
        .collect()
}

use chip_zones::{
    AnalysisConfig, BarSeries, ChipZoneParams, Instrument, StrengthParams, TrendParams,
    analysis::chip_zone_profile, analyze_series, calc_accumulation_strength, detect_trend_segments,
    estimate_chip_zones, models::Direction,
};

fn series(closes: &[f64], volumes: &[f64], oi: &[f64]) -> BarSeries {
    BarSeries::from_columns(Instrument::new("SCN", None), closes, volumes, oi).unwrap()
}

fn wavy(n: usize) -> BarSeries {
    let closes: Vec<f64> = (0..n)
        .map(|i| 3000.0 + (i as f64 * 0.21).sin() * 80.0 + i as f64 * 0.5)
        .collect();
    let volumes: Vec<f64> = (0..n).map(|i| 500.0 + ((i * 37) % 101) as f64).collect();
    let oi: Vec<f64> = (0..n)
        .map(|i| 20_000.0 + (i as f64 * 0.05).cos() * 900.0 + i as f64 * 3.0)
        .collect();
    series(&closes, &volumes, &oi)
}

#[test]
fn monotonic_rise_with_building_oi_is_one_up_trend() {
    let closes: Vec<f64> = (0..50).map(|i| 100.0 * 1.008f64.powi(i)).collect();
    let oi: Vec<f64> = (0..50).map(|i| 10_000.0 + 50.0 * i as f64).collect();
    let s = series(&closes, &[100.0; 50], &oi);

    let detection = detect_trend_segments(&s, &TrendParams::default()).unwrap();
    assert_eq!(detection.segments.len(), 1);
    let seg = detection.segments[0];
    assert_eq!(seg.direction, Direction::Up);
    assert!(seg.bar_count() >= 45, "segment only covers {} bars", seg.bar_count());
}

#[test]
fn flat_market_is_inert() {
    let s = series(&[250.0; 50], &[30.0; 50], &[4000.0; 50]);

    let strength = calc_accumulation_strength(&s, &StrengthParams::default()).unwrap();
    assert!(strength.long_strength.iter().all(|&v| v == 0.0));
    assert!(strength.short_strength.iter().all(|&v| v == 0.0));

    let detection = detect_trend_segments(&s, &TrendParams::default()).unwrap();
    assert!(detection.segments.is_empty());

    let zones = estimate_chip_zones(&s, &ChipZoneParams::default()).unwrap();
    assert_eq!(zones.len(), 1);
    assert!(zones[0].persistent);

    let silent = series(&[250.0; 50], &[0.0; 50], &[4000.0; 50]);
    assert!(estimate_chip_zones(&silent, &ChipZoneParams::default()).unwrap().is_empty());
}

#[test]
fn short_decay_makes_both_horizons_agree() {
    let s = wavy(300);
    let params = ChipZoneParams {
        half_life: 1e-3,
        ..ChipZoneParams::default()
    };
    let profile = chip_zone_profile(&s, &params).unwrap();
    for (r, a) in profile.recent.iter().zip(&profile.all) {
        assert!((r - a).abs() < 1e-9);
    }
    for zone in estimate_chip_zones(&s, &params).unwrap() {
        assert!((zone.recent_strength - zone.all_strength).abs() < 1e-9);
        assert!(zone.persistent);
    }
}

#[test]
fn recent_window_covering_everything_matches_all_time() {
    let s = wavy(120);
    let params = ChipZoneParams {
        half_life: 1e12,
        window_zone: 500,
        ..ChipZoneParams::default()
    };
    let profile = chip_zone_profile(&s, &params).unwrap();
    assert_eq!(profile.recent, profile.all);
    assert_eq!(profile.recent_threshold, profile.all_threshold);
}

#[test]
fn quantile_one_keeps_only_histogram_peaks() {
    let s = wavy(200);
    let params = ChipZoneParams {
        quantile: 1.0,
        ..ChipZoneParams::default()
    };
    let profile = chip_zone_profile(&s, &params).unwrap();
    assert_eq!(profile.recent_threshold, Some(1.0));
    assert_eq!(profile.all_threshold, Some(1.0));

    let zones = estimate_chip_zones(&s, &params).unwrap();
    assert!(!zones.is_empty() && zones.len() <= 2);
    for zone in &zones {
        assert!(zone.recent_strength == 1.0 || zone.all_strength == 1.0);
    }
}

#[test]
fn series_shorter_than_two_windows_has_no_trends() {
    let closes: Vec<f64> = (0..11).map(|i| 100.0 + i as f64 * 2.0).collect();
    let oi: Vec<f64> = (0..11).map(|i| 100.0 + i as f64 * 10.0).collect();
    let s = series(&closes, &[1.0; 11], &oi);
    assert!(detect_trend_segments(&s, &TrendParams::default()).unwrap().segments.is_empty());
}

#[test]
fn full_report_is_consistent() {
    let s = wavy(240);
    let report = analyze_series(&s, &AnalysisConfig::default()).unwrap();
    assert_eq!(report.bar_count, 240);
    assert_eq!(report.strength.len(), 240);
    for pair in report.trend.segments.windows(2) {
        assert!(pair[0].end_index < pair[1].start_index);
    }
    for pair in report.zones.windows(2) {
        assert!(pair[0].high <= pair[1].low + 1e-9);
    }
}

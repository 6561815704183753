//! Open-interest confirmed trend segments.
//!
//! Phase A scans every (s, e) window with `e - s >= min_bars` and keeps those
//! whose price move, slope, open-interest build-up and retracement pass the
//! thresholds. Phase B snaps each survivor onto the open-interest min -> max
//! sub-window, checks directional consistency and re-applies the thresholds.
//! Accepted candidates are resolved into a non-overlapping set, earliest and
//! longest first.
//!
//! The pair scan is O(N²) with O(N) refinement per pair, so the worst case is
//! O(N³). `TrendParams::max_bars` turns oversized inputs into an error.

use {
    crate::{
        config::{DF, OiSource, TrendParams},
        error::{AnalysisError, AnalysisResult},
        models::{BarSeries, Direction, TrendDetection, TrendSegment, TrendThresholds},
        utils::{ema, finite_or_zero, min_max, pct_change, sign},
    },
    argminmax::ArgMinMax,
    itertools::Itertools,
    rayon::prelude::*,
    std::cmp::Reverse,
};

/// Effective slope / move thresholds for a price series.
/// With `use_dynamic_vol` the static floors are relaxed towards the
/// instrument's own range, never tightened.
pub fn trend_thresholds(prices: &[f64], params: &TrendParams) -> TrendThresholds {
    let (min_price, max_price) = min_max(prices);
    let volatility_base = if min_price > 0.0 {
        finite_or_zero((max_price - min_price) / min_price)
    } else {
        0.0
    };
    let n = prices.len().max(1) as f64;
    let dynamic_slope = volatility_base * params.slope_ratio / n;
    let dynamic_move = volatility_base * params.move_ratio;

    let (slope_threshold, move_threshold) = if params.use_dynamic_vol {
        (
            dynamic_slope.min(params.slope_floor),
            dynamic_move.min(params.move_floor),
        )
    } else {
        (params.slope_floor, params.move_floor)
    };

    TrendThresholds {
        volatility_base,
        dynamic_slope,
        dynamic_move,
        slope_threshold,
        move_threshold,
    }
}

pub fn detect_trend_segments(
    series: &BarSeries,
    params: &TrendParams,
) -> AnalysisResult<TrendDetection> {
    let detection = detect_trends(series.closes(), series.open_interest(), params)?;

    if DF.log_trends {
        let t = &detection.thresholds;
        log::info!(
            "{}: vol={:.1}% slope>={:.3}%/bar move>={:.2}% -> {} segments",
            series.instrument(),
            t.volatility_base * 100.0,
            t.slope_threshold * 100.0,
            t.move_threshold * 100.0,
            detection.segments.len()
        );
    }

    Ok(detection)
}

/// Detects trend segments over aligned price / open-interest columns.
pub fn detect_trends(
    prices: &[f64],
    open_interest: &[f64],
    params: &TrendParams,
) -> AnalysisResult<TrendDetection> {
    params.validate()?;

    if prices.len() != open_interest.len() {
        return Err(AnalysisError::invalid_param(
            "open_interest",
            format!(
                "length {} does not match {} prices",
                open_interest.len(),
                prices.len()
            ),
        ));
    }
    if prices.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }
    if let Some(index) = prices
        .iter()
        .zip(open_interest)
        .position(|(p, oi)| !p.is_finite() || !oi.is_finite())
    {
        return Err(AnalysisError::invalid_bar(index, "non-finite price or open interest"));
    }
    if let Some(max) = params.max_bars {
        if prices.len() > max {
            return Err(AnalysisError::SeriesTooLong {
                len: prices.len(),
                max,
            });
        }
    }

    let thresholds = trend_thresholds(prices, params);

    if prices.len() < 2 * params.min_bars {
        return Ok(TrendDetection {
            segments: Vec::new(),
            thresholds,
        });
    }

    let search = SegmentSearch::new(prices, open_interest, params, &thresholds);
    let candidates = crate::trace_time!("trend candidate scan", 50_000, { search.collect_candidates() });
    let segments = resolve_overlaps(candidates);

    Ok(TrendDetection {
        segments,
        thresholds,
    })
}

/// Sorts by (start asc, length desc) and greedily keeps segments that share
/// no bar with an already kept one.
pub fn resolve_overlaps(mut candidates: Vec<TrendSegment>) -> Vec<TrendSegment> {
    candidates.sort_by_key(|seg| (seg.start_index, Reverse(seg.bar_count())));
    candidates.dedup();

    let mut kept: Vec<TrendSegment> = Vec::new();
    for candidate in candidates {
        if kept.iter().all(|k| !k.overlaps(&candidate)) {
            kept.push(candidate);
        }
    }
    kept
}

/// Prefix sums so every window metric is O(1).
struct WindowStats {
    /// return_prefix[k] = sum of per-bar returns 1..=k
    return_prefix: Vec<f64>,
    price_up_prefix: Vec<usize>,
    price_down_prefix: Vec<usize>,
    oi_up_prefix: Vec<usize>,
}

impl WindowStats {
    fn new(prices: &[f64], oi_smooth: &[f64]) -> Self {
        let return_prefix = std::iter::once(0.0)
            .chain(
                prices
                    .iter()
                    .tuple_windows()
                    .map(|(&a, &b)| pct_change(a, b))
                    .scan(0.0, |acc, r| {
                        *acc += r;
                        Some(*acc)
                    }),
            )
            .collect();

        Self {
            return_prefix,
            price_up_prefix: count_prefix(prices, |a, b| b > a),
            price_down_prefix: count_prefix(prices, |a, b| b < a),
            oi_up_prefix: count_prefix(oi_smooth, |a, b| b > a),
        }
    }

    /// Mean signed per-bar return over [s, e]. Requires e > s.
    fn mean_return(&self, s: usize, e: usize) -> f64 {
        (self.return_prefix[e] - self.return_prefix[s]) / (e - s) as f64
    }

    fn ratio(prefix: &[usize], s: usize, e: usize) -> f64 {
        (prefix[e] - prefix[s]) as f64 / (e - s) as f64
    }

    fn oi_up_ratio(&self, s: usize, e: usize) -> f64 {
        Self::ratio(&self.oi_up_prefix, s, e)
    }

    /// Fraction of bar-to-bar moves in [s, e] agreeing with `direction`.
    fn direction_ratio(&self, s: usize, e: usize, direction: Direction) -> f64 {
        match direction {
            Direction::Up => Self::ratio(&self.price_up_prefix, s, e),
            Direction::Down => Self::ratio(&self.price_down_prefix, s, e),
        }
    }
}

/// prefix[k] = number of steps j in 1..=k where `pred(data[j-1], data[j])`.
fn count_prefix(data: &[f64], pred: impl Fn(f64, f64) -> bool) -> Vec<usize> {
    std::iter::once(0)
        .chain(
            data.iter()
                .tuple_windows()
                .scan(0usize, |acc, (&a, &b)| {
                    *acc += usize::from(pred(a, b));
                    Some(*acc)
                }),
        )
        .collect()
}

struct SegmentSearch<'a> {
    prices: &'a [f64],
    oi_raw: &'a [f64],
    oi_smooth: Vec<f64>,
    stats: WindowStats,
    params: &'a TrendParams,
    slope_threshold: f64,
    move_threshold: f64,
}

impl<'a> SegmentSearch<'a> {
    fn new(
        prices: &'a [f64],
        oi_raw: &'a [f64],
        params: &'a TrendParams,
        thresholds: &TrendThresholds,
    ) -> Self {
        let oi_smooth = ema(oi_raw, params.oi_ema_span);
        let stats = WindowStats::new(prices, &oi_smooth);
        Self {
            prices,
            oi_raw,
            oi_smooth,
            stats,
            params,
            slope_threshold: thresholds.slope_threshold,
            move_threshold: thresholds.move_threshold,
        }
    }

    fn extremum_series(&self) -> &[f64] {
        match self.params.extremum_source {
            OiSource::Raw => self.oi_raw,
            OiSource::Smoothed => &self.oi_smooth,
        }
    }

    /// Every accepted (Phase A + Phase B) candidate. Start indices are
    /// independent of each other, so they are scanned in parallel.
    fn collect_candidates(&self) -> Vec<TrendSegment> {
        let last_start = self.prices.len() - self.params.min_bars;
        (0..last_start)
            .into_par_iter()
            .flat_map_iter(|s| self.scan_from(s))
            .collect()
    }

    fn scan_from(&self, s: usize) -> Vec<TrendSegment> {
        let p = self.prices;
        let mut peak = p[s];
        let mut trough = p[s];
        let mut found = Vec::new();

        for e in s + 1..p.len() {
            peak = peak.max(p[e]);
            trough = trough.min(p[e]);
            if e - s < self.params.min_bars {
                continue;
            }
            if let Some(segment) = self.evaluate(s, e, peak, trough) {
                found.push(segment);
            }
        }
        found
    }

    fn evaluate(&self, s: usize, e: usize, peak: f64, trough: f64) -> Option<TrendSegment> {
        let p = self.prices;
        let direction = Direction::from_sign(sign(pct_change(p[s], p[e])))?;

        if !self.passes_price(s, e, direction) || !self.passes_oi(s, e) {
            return None;
        }
        if retracement(p[s], p[e], peak, trough, direction) > self.params.alpha {
            return None;
        }
        self.refine(s, e)
    }

    fn refine(&self, s: usize, e: usize) -> Option<TrendSegment> {
        let ext = self.extremum_series();
        let window: &[f64] = &ext[s..=e];
        let s_oi = s + window.argmin();
        let tail: &[f64] = &ext[s_oi..=e];
        let e_oi = s_oi + tail.argmax();
        if e_oi - s_oi < self.params.min_bars {
            return None;
        }

        let p = self.prices;
        let direction = Direction::from_sign(sign(pct_change(p[s_oi], p[e_oi])))?;
        if self.stats.direction_ratio(s_oi, e_oi, direction) < self.params.dir_ratio {
            return None;
        }

        (self.passes_price(s_oi, e_oi, direction) && self.passes_oi(s_oi, e_oi)).then_some(
            TrendSegment {
                start_index: s_oi,
                end_index: e_oi,
                direction,
            },
        )
    }

    fn passes_price(&self, s: usize, e: usize, direction: Direction) -> bool {
        let slope = self.stats.mean_return(s, e).abs();
        let directed_move = direction.as_f64() * pct_change(self.prices[s], self.prices[e]);
        slope >= self.slope_threshold && directed_move >= self.move_threshold
    }

    fn passes_oi(&self, s: usize, e: usize) -> bool {
        let oi_delta = pct_change(self.oi_smooth[s], self.oi_smooth[e]);
        oi_delta >= self.params.min_oi_delta
            && self.stats.oi_up_ratio(s, e) >= self.params.min_oi_up_ratio
    }
}

/// Share of the move given back by the window's last bar.
/// Up: pullback from the peak. Down: rally from the trough.
fn retracement(first: f64, last: f64, peak: f64, trough: f64, direction: Direction) -> f64 {
    let (given_back, span) = match direction {
        Direction::Up => (peak - last, peak - first),
        Direction::Down => (last - trough, first - trough),
    };
    if span > 0.0 { given_back / span } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 * 1.01f64.powi(i as i32)).collect()
    }

    fn increasing_oi(n: usize) -> Vec<f64> {
        (0..n).map(|i| 1000.0 + 10.0 * i as f64).collect()
    }

    #[test]
    fn steady_rise_is_one_segment() {
        let out = detect_trends(&rising(50), &increasing_oi(50), &TrendParams::default()).unwrap();
        assert_eq!(
            out.segments,
            vec![TrendSegment {
                start_index: 0,
                end_index: 49,
                direction: Direction::Up
            }]
        );
    }

    #[test]
    fn rise_then_fall_gives_two_segments() {
        let mut prices = rising(30);
        let peak = prices[29];
        prices.extend((1..=30).map(|k| peak * 0.99f64.powi(k)));
        let out = detect_trends(&prices, &increasing_oi(60), &TrendParams::default()).unwrap();

        assert_eq!(out.segments.len(), 2);
        let (up, down) = (out.segments[0], out.segments[1]);
        assert_eq!(up.direction, Direction::Up);
        assert_eq!(up.start_index, 0);
        assert_eq!(down.direction, Direction::Down);
        assert_eq!(down.end_index, 59);
        assert!(!up.overlaps(&down));
    }

    #[test]
    fn flat_price_or_flat_oi_finds_nothing() {
        let flat = vec![10.0; 40];
        let out = detect_trends(&flat, &increasing_oi(40), &TrendParams::default()).unwrap();
        assert!(out.segments.is_empty());

        let out = detect_trends(&rising(40), &[500.0; 40], &TrendParams::default()).unwrap();
        assert!(out.segments.is_empty());
    }

    #[test]
    fn short_series_is_empty_not_an_error() {
        let out = detect_trends(&rising(11), &increasing_oi(11), &TrendParams::default()).unwrap();
        assert!(out.segments.is_empty());
    }

    #[test]
    fn length_guard_and_alignment_are_enforced() {
        let params = TrendParams {
            max_bars: Some(20),
            ..TrendParams::default()
        };
        assert_eq!(
            detect_trends(&rising(21), &increasing_oi(21), &params),
            Err(AnalysisError::SeriesTooLong { len: 21, max: 20 })
        );
        assert!(matches!(
            detect_trends(&rising(10), &increasing_oi(9), &TrendParams::default()),
            Err(AnalysisError::InvalidParameter { name: "open_interest", .. })
        ));
    }

    #[test]
    fn dynamic_thresholds_never_exceed_floors() {
        let prices = [100.0, 150.0, 200.0];
        let params = TrendParams {
            use_dynamic_vol: true,
            ..TrendParams::default()
        };
        let t = trend_thresholds(&prices, &params);
        assert!((t.volatility_base - 1.0).abs() < 1e-12);
        assert!((t.dynamic_move - 0.3).abs() < 1e-12);
        assert_eq!(t.move_threshold, params.move_floor);
        assert!((t.dynamic_slope - 0.2 / 3.0).abs() < 1e-12);
        assert_eq!(t.slope_threshold, params.slope_floor);

        let calm = [100.0, 100.1, 100.2];
        let t = trend_thresholds(&calm, &params);
        assert!(t.move_threshold < params.move_floor);
        assert_eq!(t.move_threshold, t.dynamic_move);
    }

    #[test]
    fn overlap_resolution_prefers_earliest_then_longest() {
        let seg = |s, e| TrendSegment {
            start_index: s,
            end_index: e,
            direction: Direction::Up,
        };
        let kept = resolve_overlaps(vec![seg(5, 12), seg(0, 8), seg(0, 10), seg(11, 20), seg(0, 10)]);
        assert_eq!(kept, vec![seg(0, 10), seg(11, 20)]);
    }

    #[test]
    fn sawtooth_rise_fails_direction_consistency() {
        // +3%, -1%, -1% repeating: a clear net rise made mostly of down bars.
        let mut prices = vec![100.0];
        for i in 1..60 {
            let step = if (i - 1) % 3 == 0 { 1.03 } else { 0.99 };
            prices.push(prices[i - 1] * step);
        }
        let oi = increasing_oi(60);

        let out = detect_trends(&prices, &oi, &TrendParams::default()).unwrap();
        assert!(out.segments.is_empty());

        let lenient = TrendParams {
            dir_ratio: 0.3,
            ..TrendParams::default()
        };
        let out = detect_trends(&prices, &oi, &lenient).unwrap();
        assert_eq!(
            out.segments,
            vec![TrendSegment {
                start_index: 0,
                end_index: 59,
                direction: Direction::Up
            }]
        );
    }

    #[test]
    fn extremum_source_moves_the_segment_start() {
        // One-bar dip at bar 2 (raw minimum), then a slow slide to bar 10 that
        // the EMA bottoms out on at bar 11, then a steady build-up.
        let oi: Vec<f64> = (0..40)
            .map(|i| match i {
                0 | 1 => 1000.0,
                2 => 880.0,
                3..=10 => 1000.0 - 12.5 * (i - 2) as f64,
                _ => 900.0 + 20.0 * (i - 10) as f64,
            })
            .collect();
        let prices = rising(40);

        let raw = detect_trends(&prices, &oi, &TrendParams::default()).unwrap();
        assert_eq!(raw.segments[0].start_index, 2);
        assert_eq!(raw.segments[0].end_index, 39);

        let smoothed = TrendParams {
            extremum_source: OiSource::Smoothed,
            ..TrendParams::default()
        };
        let out = detect_trends(&prices, &oi, &smoothed).unwrap();
        assert_eq!(out.segments[0].start_index, 11);
        assert_eq!(out.segments[0].end_index, 39);
    }

    #[test]
    fn deep_pullback_cuts_the_segment_short() {
        // 12 bars up 1%, then 7 bars giving back half of the rise.
        let mut prices = rising(13);
        let top = prices[12];
        let step = ((top - (top - 100.0) / 2.0) / top).powf(1.0 / 7.0);
        prices.extend((1..=7).map(|k| top * step.powi(k)));
        let oi = increasing_oi(20);

        let out = detect_trends(&prices, &oi, &TrendParams::default()).unwrap();
        assert!(!out.segments.is_empty());
        assert!(out.segments.iter().all(|seg| seg.end_index < 18));
        assert_eq!(out.segments[0].start_index, 0);

        let tolerant = TrendParams {
            alpha: 0.9,
            ..TrendParams::default()
        };
        let out = detect_trends(&prices, &oi, &tolerant).unwrap();
        assert_eq!(
            out.segments[0],
            TrendSegment {
                start_index: 0,
                end_index: 19,
                direction: Direction::Up
            }
        );
    }

    #[test]
    fn oi_peak_too_close_to_trough_is_rejected() {
        // Raw OI tops out 4 bars after its low and then drifts down, while the
        // EMA keeps climbing towards it.
        let oi = [
            1000.0, 1100.0, 1200.0, 1300.0, 1400.0, 1399.0, 1398.0, 1397.0, 1396.0, 1395.0,
            1394.0, 1393.0,
        ];
        let prices = rising(12);
        let out = detect_trends(&prices, &oi, &TrendParams::default()).unwrap();
        assert!(out.segments.is_empty());

        let building: Vec<f64> = (0..12).map(|i| 1000.0 + 100.0 * i as f64).collect();
        let out = detect_trends(&prices, &building, &TrendParams::default()).unwrap();
        assert_eq!(out.segments.len(), 1);
        assert_eq!((out.segments[0].start_index, out.segments[0].end_index), (0, 11));
    }

    #[test]
    fn retracement_is_directional() {
        assert_eq!(retracement(100.0, 110.0, 120.0, 100.0, Direction::Up), 0.5);
        assert_eq!(retracement(100.0, 90.0, 100.0, 80.0, Direction::Down), 0.5);
        assert_eq!(retracement(100.0, 100.0, 100.0, 100.0, Direction::Up), 0.0);
    }
}

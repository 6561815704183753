use argminmax::ArgMinMax;
use statrs::statistics::Statistics;

/// The single zero-fill point for numerical degeneracies.
/// NaN and +/-inf (e.g. from a division by zero) become 0.0.
#[inline]
pub fn finite_or_zero(val: f64) -> f64 {
    if val.is_finite() { val } else { 0.0 }
}

/// Fractional change from `from` to `to`. Returns 0.0 when `from` is zero.
#[inline]
pub fn pct_change(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        0.0
    } else {
        finite_or_zero((to - from) / from)
    }
}

#[inline]
pub fn sign(val: f64) -> i8 {
    if val > 0.0 {
        1
    } else if val < 0.0 {
        -1
    } else {
        0
    }
}

/// Per-bar simple returns. r[0] is 0.0.
pub fn simple_returns(closes: &[f64]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return returns;
    }
    returns.push(0.0);
    returns.extend(closes.windows(2).map(|w| pct_change(w[0], w[1])));
    returns
}

/// Trailing sum over at most `window` values ending at each index.
/// The first `window - 1` entries sum over the partial history available.
pub fn rolling_sum(data: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..data.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            data[start..=i].iter().sum()
        })
        .collect()
}

/// Trailing mean over at most `window` values (partial windows divide by the
/// number of values actually present).
pub fn rolling_mean(data: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    rolling_sum(data, window)
        .into_iter()
        .enumerate()
        .map(|(i, sum)| sum / (i + 1).min(window) as f64)
        .collect()
}

/// Recursive exponential moving average seeded with the first sample.
/// Weight of the newest sample is 2 / (span + 1).
pub fn ema(data: &[f64], span: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(data.len());
    let Some(&first) = data.first() else {
        return out;
    };

    let alpha = 2.0 / (span.max(1) as f64 + 1.0);
    let mut prev = first;
    out.push(prev);
    for &x in &data[1..] {
        prev = alpha * x + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

/// Quantile with linear interpolation between closest ranks
/// (position `(n - 1) * q` in the sorted data). `q` is clamped to [0, 1].
/// Returns None for empty input.
pub fn quantile_linear(data: &[f64], q: f64) -> Option<f64> {
    if data.is_empty() {
        return None;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[inline]
fn get_max(vec: &[f64]) -> f64 {
    if vec.is_empty() {
        return 0.0;
    }
    let max_index: usize = vec.argmax();
    vec[max_index]
}

/// (min, max) of a non-empty slice. Returns (0.0, 0.0) for empty input.
#[inline]
pub fn min_max(vec: &[f64]) -> (f64, f64) {
    if vec.is_empty() {
        return (0.0, 0.0);
    }
    let (min_index, max_index) = vec.argminmax();
    (vec[min_index], vec[max_index])
}

#[inline]
pub fn mean(vec: &[f64]) -> f64 {
    if vec.is_empty() {
        return 0.0;
    }
    Statistics::mean(vec.iter())
}

// Normalizes a vector of (positive) f64 to 0.0 to 1.0. Guarantees largest value is 1.0
// Name: `Max normalization`, `Max-Abs normalization`, or `L∞ normalization`
// An all-zero input stays all-zero.
#[inline]
pub fn normalize_max(vec: &[f64]) -> Vec<f64> {
    let max_value = get_max(vec);

    match max_value {
        val if val <= 0.0 || !val.is_finite() => vec.to_vec(),
        val => vec.iter().map(|&x| x / val).collect(),
    }
}

/// Linearly maps `val` from [lo, hi] onto [0, 1] and clips.
/// A collapsed range (hi <= lo) uses a width of 1.0.
#[inline]
pub fn rescale_clip(val: f64, lo: f64, hi: f64) -> f64 {
    let range = if hi > lo { hi - lo } else { 1.0 };
    ((val - lo) / range).clamp(0.0, 1.0)
}

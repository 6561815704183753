mod maths_utils;
mod perf;
mod time_utils;

pub use time_utils::{TimeUtils, epoch_ms_to_utc, format_duration, parse_datetime_ms};

pub use maths_utils::{
    ema, finite_or_zero, mean, min_max, normalize_max, pct_change, quantile_linear,
    rescale_clip, rolling_mean, rolling_sum, sign, simple_returns,
};

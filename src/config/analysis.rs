//! Analysis parameter blocks and their defaults

use {
    crate::{
        error::{AnalysisError, AnalysisResult},
        utils::TimeUtils,
    },
    anyhow::{Context, Result},
    serde::{Deserialize, Serialize},
    std::{fs, path::Path},
    strum_macros::{Display, EnumString},
};

/// How rolling statistics behave before a full window of history exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WarmupPolicy {
    /// Use whatever partial window is available (missing history contributes nothing).
    #[default]
    Partial,
    /// Emit zero strength until `window_strength` bars have been seen; smoothing
    /// starts from the first full window.
    ZeroFill,
}

/// Which open-interest series the trend refinement searches for its min/max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OiSource {
    #[default]
    Raw,
    Smoothed,
}

/// Parameters for the accumulation strength signal.
#[derive(Clone, Debug, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrengthParams {
    /// Trailing window (bars) for return and volume statistics.
    pub window_strength: usize,
    /// EMA span applied to the raw strength.
    pub smooth_span: usize,
    pub warmup: WarmupPolicy,
}

/// Parameters for the decay-weighted chip zone estimator.
#[derive(Clone, Debug, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChipZoneParams {
    /// Number of trailing bars forming the "recent" histogram.
    pub window_zone: usize,
    /// Bin width as a percentage of the mean close (0.5 = 0.5%).
    pub bins_pct: f64,
    /// Exponent on (1 + open interest increase).
    pub beta: f64,
    /// Half-life of the decay weight, in days.
    pub half_life: f64,
    /// Quantile of the non-zero histogram entries a bin must reach.
    pub quantile: f64,
    /// Bar-offset to day conversion used when ageing bars (24 for hourly bars).
    pub bars_per_day: f64,
}

/// Parameters for the open-interest trend segment detector.
#[derive(Clone, Debug, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendParams {
    /// Maximum tolerated retracement as a fraction of the move.
    pub alpha: f64,
    pub slope_ratio: f64,
    pub move_ratio: f64,
    /// Static per-bar slope threshold (also the ceiling when volatility-adaptive).
    pub slope_floor: f64,
    /// Static total move threshold (also the ceiling when volatility-adaptive).
    pub move_floor: f64,
    pub min_oi_delta: f64,
    pub min_oi_up_ratio: f64,
    pub min_bars: usize,
    pub dir_ratio: f64,
    pub oi_ema_span: usize,
    pub use_dynamic_vol: bool,
    pub extremum_source: OiSource,
    /// Refuse series longer than this (the search is cubic in the worst case).
    pub max_bars: Option<usize>,
}

/// The Master Analysis Configuration
#[derive(Clone, Debug, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub strength: StrengthParams,
    pub zones: ChipZoneParams,
    pub trend: TrendParams,
}

pub const ANALYSIS: AnalysisConfig = AnalysisConfig {
    strength: StrengthParams {
        window_strength: 20,
        smooth_span: 7,
        warmup: WarmupPolicy::Partial,
    },

    zones: ChipZoneParams {
        window_zone: 60,
        bins_pct: 0.5,
        beta: 0.7,
        half_life: 10.0,
        quantile: 0.8,
        // Hourly bars
        bars_per_day: 24.0,
    },

    trend: TrendParams {
        alpha: 0.382,
        slope_ratio: 0.2,
        move_ratio: 0.3,
        slope_floor: 0.0015,
        move_floor: 0.01,
        min_oi_delta: 0.01,
        min_oi_up_ratio: 0.55,
        min_bars: 6,
        dir_ratio: 0.55,
        oi_ema_span: 5,
        use_dynamic_vol: false,
        extremum_source: OiSource::Raw,
        max_bars: None,
    },
};

impl Default for StrengthParams {
    fn default() -> Self {
        ANALYSIS.strength
    }
}

impl Default for ChipZoneParams {
    fn default() -> Self {
        ANALYSIS.zones
    }
}

impl Default for TrendParams {
    fn default() -> Self {
        ANALYSIS.trend
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        ANALYSIS
    }
}

fn require_positive_count(name: &'static str, val: usize) -> AnalysisResult<()> {
    if val == 0 {
        return Err(AnalysisError::invalid_param(name, "must be greater than 0"));
    }
    Ok(())
}

fn require_positive(name: &'static str, val: f64) -> AnalysisResult<()> {
    if !val.is_finite() || val <= 0.0 {
        return Err(AnalysisError::invalid_param(
            name,
            format!("must be a finite value > 0, got {val}"),
        ));
    }
    Ok(())
}

fn require_non_negative(name: &'static str, val: f64) -> AnalysisResult<()> {
    if !val.is_finite() || val < 0.0 {
        return Err(AnalysisError::invalid_param(
            name,
            format!("must be a finite value >= 0, got {val}"),
        ));
    }
    Ok(())
}

fn require_open_unit(name: &'static str, val: f64) -> AnalysisResult<()> {
    if !(val > 0.0 && val < 1.0) {
        return Err(AnalysisError::invalid_param(
            name,
            format!("must lie in (0, 1), got {val}"),
        ));
    }
    Ok(())
}

impl StrengthParams {
    pub fn validate(&self) -> AnalysisResult<()> {
        require_positive_count("window_strength", self.window_strength)?;
        require_positive_count("smooth_span", self.smooth_span)
    }
}

impl ChipZoneParams {
    /// Replaces `bars_per_day` with the value implied by the bar interval.
    /// Unchanged when the interval does not divide a day sensibly.
    pub fn with_interval(self, interval_ms: i64) -> Self {
        Self {
            bars_per_day: TimeUtils::bars_per_day(interval_ms).unwrap_or(self.bars_per_day),
            ..self
        }
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        require_positive_count("window_zone", self.window_zone)?;
        require_positive("bins_pct", self.bins_pct)?;
        require_non_negative("beta", self.beta)?;
        require_positive("half_life", self.half_life)?;
        require_positive("bars_per_day", self.bars_per_day)?;
        // 1.0 is admitted: it selects only the bins at the histogram maximum.
        if !(self.quantile > 0.0 && self.quantile <= 1.0) {
            return Err(AnalysisError::invalid_param(
                "quantile",
                format!("must lie in (0, 1], got {}", self.quantile),
            ));
        }
        Ok(())
    }
}

impl TrendParams {
    pub fn validate(&self) -> AnalysisResult<()> {
        require_open_unit("alpha", self.alpha)?;
        require_open_unit("dir_ratio", self.dir_ratio)?;
        require_non_negative("slope_ratio", self.slope_ratio)?;
        require_non_negative("move_ratio", self.move_ratio)?;
        require_non_negative("slope_floor", self.slope_floor)?;
        require_non_negative("move_floor", self.move_floor)?;
        require_non_negative("min_oi_delta", self.min_oi_delta)?;
        require_non_negative("min_oi_up_ratio", self.min_oi_up_ratio)?;
        require_positive_count("min_bars", self.min_bars)?;
        require_positive_count("oi_ema_span", self.oi_ema_span)?;
        if self.max_bars == Some(0) {
            return Err(AnalysisError::invalid_param("max_bars", "must be greater than 0"));
        }
        Ok(())
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> AnalysisResult<()> {
        self.strength.validate()?;
        self.zones.validate()?;
        self.trend.validate()
    }

    /// Loads a JSON config. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AnalysisConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid analysis config in {}", path.display()))?;
        Ok(config)
    }
}

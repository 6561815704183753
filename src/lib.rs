#![allow(clippy::collapsible_if)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod models;
pub mod utils;

// Re-export commonly used types outside of crate
pub use analysis::{
    analyze_batch, analyze_series, calc_accumulation_strength, detect_trend_segments,
    detect_trends, estimate_chip_zones,
};
pub use config::{ANALYSIS, AnalysisConfig, ChipZoneParams, StrengthParams, TrendParams};
pub use domain::{Bar, Instrument};
pub use error::{AnalysisError, AnalysisResult};
pub use models::{BarSeries, ChipZone, StrengthSeries, SymbolReport, TrendSegment};

// CLI argument parsing
use {
    anyhow::{Context, Result, bail},
    clap::Parser,
    config::{OiSource, WarmupPolicy},
    std::path::PathBuf,
};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Accumulation strength, chip zones and OI trend segments from bar CSVs", long_about = None)]
pub struct Cli {
    /// Bar CSV files, one instrument per file
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// JSON analysis config; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write <SYMBOL>_chipzones.csv and <SYMBOL>_report.json here
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Suppress the terminal summary tables
    #[arg(long, default_value_t = false)]
    pub quiet: bool,

    // --- Accumulation strength ---
    #[arg(long)]
    pub window_strength: Option<usize>,
    #[arg(long)]
    pub smooth_span: Option<usize>,
    #[arg(long)]
    pub warmup: Option<WarmupPolicy>,

    // --- Chip zones ---
    #[arg(long)]
    pub window_zone: Option<usize>,
    #[arg(long)]
    pub bins_pct: Option<f64>,
    #[arg(long)]
    pub beta: Option<f64>,
    /// Decay half-life in days
    #[arg(long)]
    pub half_life: Option<f64>,
    #[arg(long)]
    pub quantile: Option<f64>,
    #[arg(long)]
    pub bars_per_day: Option<f64>,
    /// Derive bars_per_day from each file's bar interval
    #[arg(long, default_value_t = false)]
    pub infer_bars_per_day: bool,

    // --- Trend segments ---
    #[arg(long)]
    pub alpha: Option<f64>,
    #[arg(long)]
    pub slope_ratio: Option<f64>,
    #[arg(long)]
    pub move_ratio: Option<f64>,
    /// Static per-bar slope threshold
    #[arg(long = "slope")]
    pub slope_floor: Option<f64>,
    /// Static total move threshold
    #[arg(long = "move")]
    pub move_floor: Option<f64>,
    #[arg(long = "delta-oi")]
    pub min_oi_delta: Option<f64>,
    #[arg(long = "oi-up")]
    pub min_oi_up_ratio: Option<f64>,
    #[arg(long)]
    pub min_bars: Option<usize>,
    #[arg(long)]
    pub dir_ratio: Option<f64>,
    #[arg(long)]
    pub oi_ema_span: Option<usize>,
    #[arg(long, default_value_t = false)]
    pub use_dynamic_vol: bool,
    #[arg(long)]
    pub extremum_source: Option<OiSource>,
    #[arg(long)]
    pub max_bars: Option<usize>,
}

impl Cli {
    /// Config file (or defaults) with command line overrides applied, validated.
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut cfg = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)?,
            None => ANALYSIS,
        };

        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }

        set(&mut cfg.strength.window_strength, self.window_strength);
        set(&mut cfg.strength.smooth_span, self.smooth_span);
        set(&mut cfg.strength.warmup, self.warmup);

        set(&mut cfg.zones.window_zone, self.window_zone);
        set(&mut cfg.zones.bins_pct, self.bins_pct);
        set(&mut cfg.zones.beta, self.beta);
        set(&mut cfg.zones.half_life, self.half_life);
        set(&mut cfg.zones.quantile, self.quantile);
        set(&mut cfg.zones.bars_per_day, self.bars_per_day);

        set(&mut cfg.trend.alpha, self.alpha);
        set(&mut cfg.trend.slope_ratio, self.slope_ratio);
        set(&mut cfg.trend.move_ratio, self.move_ratio);
        set(&mut cfg.trend.slope_floor, self.slope_floor);
        set(&mut cfg.trend.move_floor, self.move_floor);
        set(&mut cfg.trend.min_oi_delta, self.min_oi_delta);
        set(&mut cfg.trend.min_oi_up_ratio, self.min_oi_up_ratio);
        set(&mut cfg.trend.min_bars, self.min_bars);
        set(&mut cfg.trend.dir_ratio, self.dir_ratio);
        set(&mut cfg.trend.oi_ema_span, self.oi_ema_span);
        set(&mut cfg.trend.extremum_source, self.extremum_source);
        if self.use_dynamic_vol {
            cfg.trend.use_dynamic_vol = true;
        }
        if self.max_bars.is_some() {
            cfg.trend.max_bars = self.max_bars;
        }

        cfg.validate().context("Invalid analysis parameters")?;
        Ok(cfg)
    }
}

/// Loads every input, analyzes them in parallel, prints summaries and writes
/// outputs. Fails if any input could not be loaded or analyzed.
pub fn run(cli: Cli) -> Result<()> {
    let config = cli.analysis_config()?;

    let mut series = Vec::with_capacity(cli.inputs.len());
    let mut failures = 0usize;
    for path in &cli.inputs {
        match data::load_bar_csv(path) {
            Ok(s) => series.push(s),
            Err(e) => {
                log::error!("{:#}", e);
                failures += 1;
            }
        }
    }

    let reports = analyze_batch(&series, |s| {
        let mut cfg = config;
        if cli.infer_bars_per_day {
            if let Some(interval_ms) = s.instrument().interval_ms {
                cfg.zones = cfg.zones.with_interval(interval_ms);
            }
        }
        cfg
    });

    for (s, result) in series.iter().zip(reports) {
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                log::error!("{}: analysis failed: {}", s.instrument(), e);
                failures += 1;
                continue;
            }
        };

        if !cli.quiet {
            println!("{}", data::render_summary(&report));
        }
        if let Some(out_dir) = &cli.out_dir {
            for path in data::write_symbol_outputs(out_dir, &report)? {
                println!("[OK] wrote {}", path.display());
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} inputs failed", failures, cli.inputs.len());
    }
    Ok(())
}

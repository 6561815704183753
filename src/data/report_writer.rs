use {
    crate::{
        config::constants::report::{STRONG_PREFIX, STRONG_QUANTILE},
        models::{ChipZone, SymbolReport},
        utils::{epoch_ms_to_utc, format_duration, quantile_linear},
    },
    anyhow::{Context, Result},
    std::{
        fs,
        io::BufWriter,
        path::{Path, PathBuf},
    },
    tabled::{Table, Tabled, settings::Style},
};

const ZONE_CSV_HEADER: [&str; 7] = [
    "low",
    "high",
    "recent_strength",
    "all_strength",
    "avg_strength",
    "persistent",
    "zone_type",
];

// Helper function to create a new file and any missing parent directories.
fn create_file_with_parents(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))
}

/// Per-column "strong" cut-offs: the 80th percentile of each strength column
/// across the given zones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrongThresholds {
    pub recent: f64,
    pub all: f64,
    pub avg: f64,
}

impl StrongThresholds {
    pub fn from_zones(zones: &[ChipZone]) -> Option<Self> {
        let column = |f: fn(&ChipZone) -> f64| {
            let values: Vec<f64> = zones.iter().map(f).collect();
            quantile_linear(&values, STRONG_QUANTILE)
        };
        Some(Self {
            recent: column(|z| z.recent_strength)?,
            all: column(|z| z.all_strength)?,
            avg: column(|z| z.avg_strength)?,
        })
    }
}

/// One decimal place, prefixed when at or above the column's threshold.
pub fn strength_cell(value: f64, threshold: f64) -> String {
    if value >= threshold {
        format!("{}{:.1}", STRONG_PREFIX, value)
    } else {
        format!("{:.1}", value)
    }
}

/// Writes the zone table as CSV. Nothing is written for an empty zone list.
pub fn write_zones_csv(path: &Path, zones: &[ChipZone]) -> Result<bool> {
    let Some(thresholds) = StrongThresholds::from_zones(zones) else {
        return Ok(false);
    };

    let file = create_file_with_parents(path)?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    writer
        .write_record(ZONE_CSV_HEADER)
        .with_context(|| format!("Failed to write CSV header: {}", path.display()))?;

    for zone in zones {
        writer
            .write_record([
                format!("{:.2}", zone.low),
                format!("{:.2}", zone.high),
                strength_cell(zone.recent_strength, thresholds.recent),
                strength_cell(zone.all_strength, thresholds.all),
                strength_cell(zone.avg_strength, thresholds.avg),
                zone.persistent.to_string(),
                zone.zone_type.to_string(),
            ])
            .with_context(|| format!("Failed to write zone row: {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(true)
}

pub fn write_json_report(path: &Path, report: &SymbolReport) -> Result<()> {
    let file = create_file_with_parents(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("Failed to serialize report to: {}", path.display()))
}

/// Writes `<SYMBOL>_chipzones.csv` (when there are zones) and
/// `<SYMBOL>_report.json` into `out_dir`. Returns the paths written.
pub fn write_symbol_outputs(out_dir: &Path, report: &SymbolReport) -> Result<Vec<PathBuf>> {
    let symbol = report.instrument.symbol();
    let mut written = Vec::with_capacity(2);

    let zones_path = out_dir.join(format!("{}_chipzones.csv", symbol));
    if write_zones_csv(&zones_path, &report.zones)? {
        written.push(zones_path);
    } else {
        log::info!("{}: no chip zones, skipping zone CSV", symbol);
    }

    let json_path = out_dir.join(format!("{}_report.json", symbol));
    write_json_report(&json_path, report)?;
    written.push(json_path);

    Ok(written)
}

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Low")]
    low: String,
    #[tabled(rename = "High")]
    high: String,
    #[tabled(rename = "Recent")]
    recent: String,
    #[tabled(rename = "All")]
    all: String,
    #[tabled(rename = "Avg")]
    avg: String,
    #[tabled(rename = "Type")]
    zone_type: String,
}

#[derive(Tabled)]
struct SegmentRow {
    #[tabled(rename = "Start")]
    start: usize,
    #[tabled(rename = "End")]
    end: usize,
    #[tabled(rename = "Bars")]
    bars: usize,
    #[tabled(rename = "Dir")]
    direction: String,
}

/// Human-readable summary of one report for the terminal.
pub fn render_summary(report: &SymbolReport) -> String {
    let mut out = String::new();

    let span = if report.instrument.interval_ms.is_some() {
        format!(
            "{} -> {} ({})",
            epoch_ms_to_utc(report.first_timestamp_ms),
            epoch_ms_to_utc(report.last_timestamp_ms),
            format_duration(report.last_timestamp_ms - report.first_timestamp_ms)
        )
    } else {
        format!("bars {}..{}", report.first_timestamp_ms, report.last_timestamp_ms)
    };
    out.push_str(&format!("== {} | {} bars | {} ==\n", report.instrument, report.bar_count, span));

    if let Some((long, short)) = report.strength.latest() {
        out.push_str(&format!("Latest strength: long {:.2} / short {:.2}\n", long, short));
    }

    let t = &report.trend.thresholds;
    out.push_str(&format!(
        "Trend thresholds: vol={:.1}% slope>={:.3}%/bar move>={:.2}%\n",
        t.volatility_base * 100.0,
        t.slope_threshold * 100.0,
        t.move_threshold * 100.0
    ));

    match StrongThresholds::from_zones(&report.zones) {
        Some(thresholds) => {
            let rows = report.zones.iter().map(|z| ZoneRow {
                low: format!("{:.2}", z.low),
                high: format!("{:.2}", z.high),
                recent: strength_cell(z.recent_strength, thresholds.recent),
                all: strength_cell(z.all_strength, thresholds.all),
                avg: strength_cell(z.avg_strength, thresholds.avg),
                zone_type: z.zone_type.to_string(),
            });
            out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
            out.push('\n');
        }
        None => out.push_str("No chip zones.\n"),
    }

    if report.trend.segments.is_empty() {
        out.push_str("No trend segments.\n");
    } else {
        let rows = report.trend.segments.iter().map(|s| SegmentRow {
            start: s.start_index,
            end: s.end_index,
            bars: s.bar_count(),
            direction: s.direction.to_string(),
        });
        out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            domain::Instrument,
            models::{
                Direction, StrengthSeries, TrendDetection, TrendSegment, TrendThresholds, ZoneType,
            },
        },
    };

    fn zone(low: f64, recent: f64, all: f64) -> ChipZone {
        let persistent = recent > 0.5 && all > 0.5;
        ChipZone {
            low,
            high: low + 1.0,
            recent_strength: recent,
            all_strength: all,
            avg_strength: (recent + all) / 2.0,
            persistent,
            zone_type: if persistent {
                ZoneType::Persistent
            } else {
                ZoneType::Transient
            },
        }
    }

    fn report(zones: Vec<ChipZone>) -> SymbolReport {
        SymbolReport {
            instrument: Instrument::new("JM2601", None),
            bar_count: 3,
            first_timestamp_ms: 0,
            last_timestamp_ms: 2,
            strength: StrengthSeries {
                long_strength: vec![0.0, 0.5, 1.0],
                short_strength: vec![0.0, 0.1, 0.0],
            },
            zones,
            trend: TrendDetection {
                segments: vec![TrendSegment {
                    start_index: 0,
                    end_index: 2,
                    direction: Direction::Up,
                }],
                thresholds: TrendThresholds {
                    volatility_base: 0.1,
                    dynamic_slope: 0.0,
                    dynamic_move: 0.0,
                    slope_threshold: 0.0015,
                    move_threshold: 0.01,
                },
            },
        }
    }

    #[test]
    fn strong_cells_are_prefixed() {
        assert_eq!(strength_cell(0.91, 0.8), "strong:0.9");
        assert_eq!(strength_cell(0.31, 0.8), "0.3");
    }

    #[test]
    fn zone_csv_marks_top_quintile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("JM_chipzones.csv");
        let zones = vec![zone(10.0, 0.2, 0.3), zone(11.0, 0.4, 0.5), zone(12.0, 1.0, 1.0)];
        assert!(write_zones_csv(&path, &zones).unwrap());

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "low,high,recent_strength,all_strength,avg_strength,persistent,zone_type");
        assert_eq!(lines.len(), 4);
        assert!(lines[3].starts_with("12.00,13.00,strong:1.0,strong:1.0,strong:1.0,true,persistent"));
        assert!(!lines[1].contains(STRONG_PREFIX));
    }

    #[test]
    fn empty_zone_list_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("none.csv");
        assert!(!write_zones_csv(&path, &[]).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn outputs_round_trip_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let original = report(vec![zone(10.0, 0.9, 0.9)]);
        let written = write_symbol_outputs(dir.path(), &original).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("JM2601_chipzones.csv"));

        let json = fs::read_to_string(&written[1]).unwrap();
        let parsed: SymbolReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn summary_mentions_zones_and_segments() {
        let text = render_summary(&report(vec![zone(10.0, 0.9, 0.9)]));
        assert!(text.contains("JM2601"));
        assert!(text.contains("persistent"));
        assert!(text.contains("up"));

        let empty = render_summary(&report(vec![]));
        assert!(empty.contains("No chip zones."));
    }
}

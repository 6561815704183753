use {
    crate::{
        config::{DF, constants::loader::OI_COLUMN_KEYWORDS},
        domain::{Bar, Instrument},
        models::BarSeries,
        utils::parse_datetime_ms,
    },
    anyhow::{Context, Result, bail},
    itertools::Itertools,
    std::{fs::File, io::BufReader, path::Path},
};

/// Where a row's timestamp comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
enum TimestampColumns {
    DateAndTime(usize, usize),
    Single(usize),
    RowIndex,
}

#[derive(Debug, Clone, PartialEq)]
struct ColumnMap {
    close: usize,
    volume: usize,
    open_interest: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    timestamp: TimestampColumns,
}

impl ColumnMap {
    fn from_headers(headers: &[String]) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        let require = |name: &str| {
            find(name).with_context(|| format!("Missing `{}` column (found: {:?})", name, headers))
        };

        let open_interest = headers
            .iter()
            .position(|h| OI_COLUMN_KEYWORDS.iter().any(|k| h.contains(k)))
            .with_context(|| format!("No open interest column found (found: {:?})", headers))?;

        let timestamp = match (find("date"), find("time")) {
            (Some(d), Some(t)) => TimestampColumns::DateAndTime(d, t),
            _ => ["datetime", "timestamp", "date"]
                .iter()
                .find_map(|&name| find(name))
                .map_or(TimestampColumns::RowIndex, TimestampColumns::Single),
        };

        Ok(Self {
            close: require("close")?,
            volume: require("volume")?,
            open_interest,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            timestamp,
        })
    }
}

/// Lower-cases, trims and strips a UTF-8 BOM from a header cell.
fn normalize_header(raw: &str) -> String {
    raw.trim().trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn parse_number(field: Option<&str>) -> Option<f64> {
    field?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Symbol from a file name: the stem up to the first `_`, upper-cased
/// (`jm2601_1h.csv` -> `JM2601`).
pub fn symbol_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.split('_').next().unwrap_or_default().to_uppercase()
}

struct ParsedRow {
    timestamp_ms: Option<i64>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    open_interest: f64,
}

/// Loads one instrument's bars from a CSV export.
///
/// Rows with an unparsable close, volume or open interest are dropped, as are
/// rows with volume <= 0 (halted or placeholder bars). When every remaining
/// row has a parsable, strictly increasing timestamp the real times are kept
/// and the bar interval is inferred; otherwise bars are indexed by row.
pub fn load_bar_csv(path: &Path) -> Result<BarSeries> {
    let file =
        File::open(path).with_context(|| format!("Failed to open bar file: {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .iter()
        .map(normalize_header)
        .collect();
    let columns = ColumnMap::from_headers(&headers)
        .with_context(|| format!("Unsupported bar file layout: {}", path.display()))?;

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for (line, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Malformed CSV record {} in {}", line + 1, path.display()))?;

        let (Some(close), Some(volume), Some(open_interest)) = (
            parse_number(record.get(columns.close)),
            parse_number(record.get(columns.volume)),
            parse_number(record.get(columns.open_interest)),
        ) else {
            dropped += 1;
            continue;
        };
        if volume <= 0.0 {
            dropped += 1;
            continue;
        }

        let price_or_close =
            |idx: Option<usize>| parse_number(idx.and_then(|i| record.get(i))).unwrap_or(close);
        let timestamp_ms = match columns.timestamp {
            TimestampColumns::DateAndTime(d, t) => record
                .get(d)
                .zip(record.get(t))
                .and_then(|(date, time)| {
                    parse_datetime_ms(&format!("{} {}", date.trim(), time.trim()))
                }),
            TimestampColumns::Single(c) => record.get(c).and_then(parse_datetime_ms),
            TimestampColumns::RowIndex => None,
        };

        rows.push(ParsedRow {
            timestamp_ms,
            open: price_or_close(columns.open),
            high: price_or_close(columns.high),
            low: price_or_close(columns.low),
            close,
            volume,
            open_interest,
        });
    }

    if rows.is_empty() {
        bail!("No usable bars in {} ({} rows dropped)", path.display(), dropped);
    }

    let parsed_times: Option<Vec<i64>> = rows.iter().map(|r| r.timestamp_ms).collect();
    let (timestamps, interval_ms) = match parsed_times {
        Some(ts) if ts.iter().tuple_windows().all(|(a, b)| a < b) => {
            let interval = ts.iter().tuple_windows().map(|(a, b)| b - a).min();
            (ts, interval)
        }
        _ => {
            if columns.timestamp != TimestampColumns::RowIndex {
                log::warn!(
                    "{}: timestamps missing or out of order, indexing bars by row",
                    path.display()
                );
            }
            ((0..rows.len() as i64).collect(), None)
        }
    };

    let bars = rows
        .iter()
        .zip(timestamps)
        .map(|(r, ts)| Bar::new(ts, r.open, r.high, r.low, r.close, r.volume, r.open_interest))
        .collect();

    let instrument = Instrument::new(symbol_from_path(path), interval_ms);
    if DF.log_pipeline {
        log::info!(
            "Loaded {} bars for {} from {} ({} rows dropped)",
            rows.len(),
            instrument,
            path.display(),
            dropped
        );
    }

    BarSeries::new(instrument, bars)
        .with_context(|| format!("Invalid bar data in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::utils::TimeUtils,
        std::{fs, path::PathBuf},
    };

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn symbol_is_upper_cased_stem_prefix() {
        assert_eq!(symbol_from_path(Path::new("data/jm2601_1h.csv")), "JM2601");
        assert_eq!(symbol_from_path(Path::new("RB.csv")), "RB");
    }

    #[test]
    fn merges_date_and_time_and_infers_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "i2601_hourly.csv",
            "\u{feff}Date,Time,Open,High,Low,Close,Volume,Open_Interest\n\
             2025-01-02,09:00,10,11,9,10.5,100,5000\n\
             2025-01-02,10:00,10.5,12,10,11.5,120,5100\n\
             2025-01-02,11:00,11.5,12,11,11.0,90,5050\n",
        );

        let series = load_bar_csv(&path).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.instrument().symbol(), "I2601");
        assert_eq!(series.instrument().interval_ms, Some(TimeUtils::MS_IN_H));
        assert_eq!(series.closes(), &[10.5, 11.5, 11.0]);
        assert_eq!(series.highs()[1], 12.0);
        assert_eq!(series.open_interest()[2], 5050.0);
    }

    #[test]
    fn drops_unparsable_and_zero_volume_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "rb_test.csv",
            "datetime,close,volume,position\n\
             2025-01-02 09:00,10,5,100\n\
             2025-01-02 10:00,n/a,5,100\n\
             2025-01-02 11:00,11,0,100\n\
             2025-01-02 12:00,12,7,110\n",
        );

        let series = load_bar_csv(&path).unwrap();
        assert_eq!(series.closes(), &[10.0, 12.0]);
        // open/high/low fall back to close
        assert_eq!(series.get_bar(1).open, 12.0);
    }

    #[test]
    fn falls_back_to_row_index_without_times() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "x.csv", "close,volume,hold\n1,1,1\n2,1,2\n");
        let series = load_bar_csv(&path).unwrap();
        assert_eq!(series.timestamps(), &[0, 1]);
        assert_eq!(series.instrument().interval_ms, None);
    }

    #[test]
    fn missing_open_interest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "x.csv", "close,volume\n1,1\n");
        assert!(load_bar_csv(&path).is_err());
    }

    #[test]
    fn all_rows_dropped_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "x.csv", "close,volume,oi\n1,0,1\n2,-3,1\n");
        assert!(load_bar_csv(&path).is_err());
    }
}

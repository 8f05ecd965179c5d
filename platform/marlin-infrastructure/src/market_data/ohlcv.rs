use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use marlin_domain::repositories::market_data::{MarketDataRepository, PriceQuery};
use marlin_domain::services::ohlcv::{canonicalize_bars, DataQualityReport};
use marlin_domain::value_objects::bar::Bar;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Deserialize)]
pub struct OhlcvRow {
    pub timestamp_utc: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Price series loaded from a local CSV file with a
/// `timestamp_utc,open,high,low,close,volume` header.
#[derive(Debug, Clone)]
pub struct CsvMarketDataRepository {
    path: PathBuf,
}

impl CsvMarketDataRepository {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl MarketDataRepository for CsvMarketDataRepository {
    fn load_bars(&self, query: &PriceQuery) -> Result<(Vec<Bar>, DataQualityReport), String> {
        load_csv(&self.path, query)
    }
}

pub fn load_csv(path: &Path, query: &PriceQuery) -> Result<(Vec<Bar>, DataQualityReport), String> {
    let overall_start = Instant::now();
    let span = tracing::info_span!(
        "infra.csv.load_bars",
        path = %path.display(),
        symbol = %query.symbol
    );
    let _enter = span.enter();

    let file = File::open(path)
        .map_err(|err| format!("failed to open price CSV {}: {}", path.display(), err))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut report = DataQualityReport::default();
    let mut raw: Vec<Bar> = Vec::new();
    for result in reader.deserialize::<OhlcvRow>() {
        let row = result.map_err(|err| format!("failed to parse CSV row: {}", err))?;
        let timestamp = match parse_timestamp(&row.timestamp_utc) {
            Ok(ts) => ts,
            Err(_) => {
                report.invalid_rows += 1;
                continue;
            }
        };
        if !query.contains(timestamp) {
            continue;
        }
        raw.push(Bar {
            symbol: query.symbol.clone(),
            timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }

    let rows = raw.len();
    let bars = canonicalize_bars(raw, query.expected_step_seconds, &mut report);

    metrics::counter!("marlin.infra.csv.load_bars.calls_total", "result" => "ok").increment(1);
    metrics::histogram!("marlin.infra.csv.load_bars_ms")
        .record(overall_start.elapsed().as_secs_f64() * 1000.0);
    metrics::gauge!("marlin.infra.csv.load_bars.rows_returned").set(rows as f64);
    metrics::gauge!("marlin.infra.csv.load_bars.bars_loaded").set(bars.len() as f64);

    tracing::debug!(
        rows,
        bars = bars.len(),
        duplicates = report.duplicates,
        gaps = report.gaps,
        out_of_order = report.out_of_order,
        invalid_rows = report.invalid_rows,
        "loaded price series"
    );
    Ok((bars, report))
}

fn parse_timestamp(value: &str) -> Result<i64, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%z") {
        return Ok(dt.timestamp());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        let dt: DateTime<Utc> = Utc.from_utc_datetime(&naive);
        return Ok(dt.timestamp());
    }
    if let Ok(epoch) = value.parse::<i64>() {
        return Ok(epoch);
    }

    Err(format!("unsupported timestamp format: {}", value))
}

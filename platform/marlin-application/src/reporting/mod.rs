use crate::config::Config;
use crate::shared::build_metrics_config;
use marlin_domain::entities::metrics::{MetricsCalculator, MetricsReport};
use marlin_domain::repositories::artifacts::{ArtifactReader, ArtifactWriter};
use marlin_domain::value_objects::record::ResultRecord;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info_span;

pub struct GenerateReportResult {
    pub input_dir: PathBuf,
    pub run_id: String,
    pub metrics: MetricsReport,
    pub records: usize,
}

/// Rebuild metrics.json for a finished run from its records.csv, using the
/// config snapshot stored next to it for capital and metric settings.
pub fn generate_report(
    input_dir: &Path,
    reader: &dyn ArtifactReader,
    writer: &dyn ArtifactWriter,
) -> Result<GenerateReportResult, String> {
    let _span = info_span!("generate_report", input_dir = %input_dir.display()).entered();

    let records_path = input_dir.join("records.csv");
    if !reader.exists(&records_path) {
        return Err(format!("missing records.csv in {}", input_dir.display()));
    }

    let stage_start = Instant::now();
    let records = reader.read_records_csv(&records_path)?;

    let config_path = input_dir.join("config_snapshot.toml");
    let config = reader
        .read_config_snapshot_toml(&config_path)?
        .and_then(|raw| toml::from_str::<Config>(&raw).ok());

    let (run_id, initial_capital, metrics_config) = match &config {
        Some(config) => (
            config.run.run_id.clone(),
            config.run.initial_capital,
            build_metrics_config(config),
        ),
        None => (
            "unknown".to_string(),
            records.first().map(|r| r.portfolio_value).unwrap_or(0.0),
            Default::default(),
        ),
    };

    let metrics_report = MetricsCalculator::new(metrics_config).calculate(&records, initial_capital);
    metrics::histogram!("marlin.report.generate_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    metrics::gauge!("marlin.report.bars_processed").set(records.len() as f64);

    let meta = config
        .as_ref()
        .and_then(|config| crate::backtesting::run_meta_json(config, &records));
    writer.write_metrics_json(
        input_dir.join("metrics.json").as_path(),
        &metrics_report,
        meta.as_ref(),
    )?;

    Ok(GenerateReportResult {
        input_dir: input_dir.to_path_buf(),
        run_id,
        metrics: metrics_report,
        records: records.len(),
    })
}

/// One row of the trade log: a bar whose position changed.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeLogEntry {
    pub timestamp: i64,
    pub side: &'static str,
    pub price: f64,
    pub quantity_delta: f64,
    pub position_after: f64,
}

pub fn trade_log(records: &[ResultRecord], initial_position: f64) -> Vec<TradeLogEntry> {
    let mut entries = Vec::new();
    let mut previous = initial_position;
    for record in records {
        let delta = record.position_qty - previous;
        if delta.abs() > 1e-12 {
            entries.push(TradeLogEntry {
                timestamp: record.timestamp,
                side: if delta > 0.0 { "buy" } else { "sell" },
                price: record.asset_price,
                quantity_delta: delta,
                position_after: record.position_qty,
            });
        }
        previous = record.position_qty;
    }
    entries
}

/// Plain-text summary of a finished run, in the shape the CLI prints.
pub fn summary_table(metrics: &MetricsReport) -> String {
    let mut rows: Vec<(&str, String)> = vec![
        ("total_return", format_pct(metrics.total_return)),
        ("sharpe_ratio", format!("{:.4}", metrics.sharpe_ratio)),
        ("max_drawdown", format_pct(metrics.max_drawdown)),
    ];
    if let Some(value) = metrics.annualized_return {
        rows.push(("annualized_return", format_pct(value)));
    }
    if let Some(value) = metrics.sortino_ratio {
        rows.push(("sortino_ratio", format!("{value:.4}")));
    }
    if let Some(value) = metrics.calmar_ratio {
        rows.push(("calmar_ratio", format!("{value:.4}")));
    }
    if let Some(value) = metrics.volatility {
        rows.push(("volatility", format_pct(value)));
    }
    if let Some(value) = metrics.win_rate {
        rows.push(("win_rate", format_pct(value)));
    }
    if let Some(value) = metrics.profit_factor {
        rows.push(("profit_factor", format!("{value:.4}")));
    }

    let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (name, value) in rows {
        out.push_str(&format!("{name:<width$}  {value}\n"));
    }
    out
}

pub fn trade_log_table(records: &[ResultRecord], initial_position: f64) -> String {
    let entries = trade_log(records, initial_position);
    if entries.is_empty() {
        return "no trades\n".to_string();
    }
    let mut out = String::from("timestamp            side  price         qty_delta     position\n");
    for entry in entries {
        let when = chrono::DateTime::from_timestamp(entry.timestamp, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| entry.timestamp.to_string());
        out.push_str(&format!(
            "{when}  {:<4}  {:<12.4}  {:<12.4}  {:<12.4}\n",
            entry.side, entry.price, entry.quantity_delta, entry.position_after
        ));
    }
    out
}

fn format_pct(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    format!("{:.2}%", value * 100.0)
}

#[cfg(test)]
mod tests {
    use super::{summary_table, trade_log};
    use marlin_domain::entities::metrics::MetricsReport;
    use marlin_domain::value_objects::record::ResultRecord;

    fn record(ts: i64, value: f64, qty: f64) -> ResultRecord {
        ResultRecord {
            timestamp: ts,
            portfolio_value: value,
            asset_price: 100.0,
            position_qty: qty,
            support: None,
            resistance: None,
        }
    }

    #[test]
    fn trade_log_keeps_only_position_changes() {
        let records = vec![
            record(0, 10_000.0, 0.0),
            record(60, 10_000.0, 80.0),
            record(120, 10_000.0, 80.0),
            record(180, 10_000.0, 16.0),
        ];
        let log = trade_log(&records, 0.0);
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].side, "buy");
        assert_eq!(log[0].timestamp, 60);
        assert_eq!(log[1].side, "sell");
        assert!((log[1].quantity_delta + 64.0).abs() < 1e-9);
    }

    #[test]
    fn summary_table_skips_absent_extended_metrics() {
        let table = summary_table(&MetricsReport::default());
        assert!(table.contains("total_return"));
        assert!(table.contains("sharpe_ratio"));
        assert!(!table.contains("sortino_ratio"));
    }

    #[test]
    fn summary_table_marks_infinite_ratios() {
        let report = MetricsReport {
            profit_factor: Some(f64::INFINITY),
            ..MetricsReport::default()
        };
        let table = summary_table(&report);
        assert!(table.contains("profit_factor"));
        assert!(table.contains("inf"));
    }
}

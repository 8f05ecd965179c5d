use marlin_domain::entities::metrics::MetricsReport;
use marlin_domain::value_objects::record::ResultRecord;
use std::fs;
use std::path::Path;

pub fn write_records_csv(path: &Path, records: &[ResultRecord]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create records csv {}: {}", path.display(), err))?;
    wtr.write_record([
        "timestamp",
        "portfolio_value",
        "asset_price",
        "position_qty",
        "support",
        "resistance",
    ])
    .map_err(|err| format!("failed to write records csv header: {}", err))?;

    for record in records {
        wtr.write_record([
            record.timestamp.to_string(),
            record.portfolio_value.to_string(),
            record.asset_price.to_string(),
            record.position_qty.to_string(),
            record.support.map(|v| v.to_string()).unwrap_or_default(),
            record.resistance.map(|v| v.to_string()).unwrap_or_default(),
        ])
        .map_err(|err| format!("failed to write records row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush records csv: {}", err))
}

pub fn read_records_csv(path: &Path) -> Result<Vec<ResultRecord>, String> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|err| format!("failed to open records csv {}: {}", path.display(), err))?;

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|err| format!("failed to read records row: {}", err))?;
        if row.len() < 4 {
            return Err(format!("records row has {} fields, expected >= 4", row.len()));
        }
        records.push(ResultRecord {
            timestamp: parse_field(&row, 0, "timestamp")?,
            portfolio_value: parse_field(&row, 1, "portfolio_value")?,
            asset_price: parse_field(&row, 2, "asset_price")?,
            position_qty: parse_field(&row, 3, "position_qty")?,
            support: parse_optional(&row, 4, "support")?,
            resistance: parse_optional(&row, 5, "resistance")?,
        });
    }
    Ok(records)
}

pub fn write_metrics_json(
    path: &Path,
    metrics: &MetricsReport,
    meta: Option<&serde_json::Value>,
) -> Result<(), String> {
    let payload = serde_json::json!({
        "metrics": metrics,
        "meta": meta,
    });
    let json = serde_json::to_string_pretty(&payload)
        .map_err(|err| format!("failed to serialize metrics: {err}"))?;
    fs::write(path, json)
        .map_err(|err| format!("failed to write metrics json {}: {}", path.display(), err))
}

fn parse_field<T: std::str::FromStr>(
    row: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    row.get(index)
        .ok_or_else(|| format!("records row is missing {name}"))?
        .parse()
        .map_err(|err| format!("invalid {name}: {err}"))
}

fn parse_optional(
    row: &csv::StringRecord,
    index: usize,
    name: &str,
) -> Result<Option<f64>, String> {
    match row.get(index) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|err| format!("invalid {name}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::{read_records_csv, write_metrics_json, write_records_csv};
    use marlin_domain::entities::metrics::MetricsReport;
    use marlin_domain::value_objects::record::ResultRecord;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_tmp_path(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("marlin_{name}_{}_{}", std::process::id(), now))
    }

    #[test]
    fn records_csv_round_trips_including_optional_levels() {
        let path = unique_tmp_path("records.csv");
        let records = vec![
            ResultRecord {
                timestamp: 0,
                portfolio_value: 10_000.0,
                asset_price: 100.0,
                position_qty: 0.0,
                support: None,
                resistance: None,
            },
            ResultRecord {
                timestamp: 60,
                portfolio_value: 10_050.0,
                asset_price: 101.0,
                position_qty: 80.0,
                support: Some(99.5),
                resistance: Some(103.0),
            },
        ];

        write_records_csv(&path, &records).expect("write records");
        let read_back = read_records_csv(&path).expect("read records");
        assert_eq!(read_back, records);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn metrics_json_has_metrics_and_meta_sections() {
        let path = unique_tmp_path("metrics.json");
        let meta = serde_json::json!({"run_id": "demo"});
        write_metrics_json(&path, &MetricsReport::default(), Some(&meta)).expect("write metrics");

        let raw = fs::read_to_string(&path).expect("read metrics json");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
        assert!(value["metrics"]["total_return"].is_number());
        assert_eq!(value["meta"]["run_id"], serde_json::json!("demo"));

        let _ = fs::remove_file(&path);
    }
}

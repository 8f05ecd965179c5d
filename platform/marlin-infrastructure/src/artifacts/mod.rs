use crate::reporting;
use marlin_domain::entities::metrics::MetricsReport;
use marlin_domain::repositories::artifacts::{ArtifactReader, ArtifactWriter};
use marlin_domain::value_objects::record::ResultRecord;
use std::fs;
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemArtifactWriter;

impl FilesystemArtifactWriter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemArtifactReader;

impl FilesystemArtifactReader {
    pub fn new() -> Self {
        Self
    }
}

fn record_write_metrics(kind: &'static str, start: Instant, result: &Result<(), String>) {
    let result_label = if result.is_ok() { "ok" } else { "err" };
    metrics::counter!(
        "marlin.infra.artifacts.write.calls_total",
        "kind" => kind,
        "result" => result_label
    )
    .increment(1);
    metrics::histogram!("marlin.infra.artifacts.write_ms", "kind" => kind, "result" => result_label)
        .record(start.elapsed().as_millis() as f64);
}

fn record_read_metrics<T>(kind: &'static str, start: Instant, result: &Result<T, String>) {
    let result_label = if result.is_ok() { "ok" } else { "err" };
    metrics::counter!(
        "marlin.infra.artifacts.read.calls_total",
        "kind" => kind,
        "result" => result_label
    )
    .increment(1);
    metrics::histogram!("marlin.infra.artifacts.read_ms", "kind" => kind, "result" => result_label)
        .record(start.elapsed().as_millis() as f64);
}

impl ArtifactWriter for FilesystemArtifactWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String> {
        let start = Instant::now();
        let result = fs::create_dir_all(path)
            .map_err(|err| format!("failed to create dir {}: {}", path.display(), err));
        record_write_metrics("ensure_dir", start, &result);
        result
    }

    fn write_records_csv(&self, path: &Path, records: &[ResultRecord]) -> Result<(), String> {
        let start = Instant::now();
        let result = reporting::write_records_csv(path, records);
        record_write_metrics("records_csv", start, &result);
        result
    }

    fn write_metrics_json(
        &self,
        path: &Path,
        metrics: &MetricsReport,
        meta: Option<&serde_json::Value>,
    ) -> Result<(), String> {
        let start = Instant::now();
        let result = reporting::write_metrics_json(path, metrics, meta);
        record_write_metrics("metrics_json", start, &result);
        result
    }

    fn write_config_snapshot_toml(&self, path: &Path, config_toml: &str) -> Result<(), String> {
        let start = Instant::now();
        let result = fs::write(path, config_toml).map_err(|err| {
            format!(
                "failed to write config snapshot {}: {}",
                path.display(),
                err
            )
        });
        record_write_metrics("config_snapshot_toml", start, &result);
        result
    }
}

impl ArtifactReader for FilesystemArtifactReader {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_records_csv(&self, path: &Path) -> Result<Vec<ResultRecord>, String> {
        let start = Instant::now();
        let result = reporting::read_records_csv(path);
        record_read_metrics("records_csv", start, &result);
        result
    }

    fn read_config_snapshot_toml(&self, path: &Path) -> Result<Option<String>, String> {
        if !path.exists() {
            return Ok(None);
        }
        let start = Instant::now();
        let result = fs::read_to_string(path)
            .map(Some)
            .map_err(|err| format!("failed to read config snapshot {}: {}", path.display(), err));
        record_read_metrics("config_snapshot_toml", start, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::{FilesystemArtifactReader, FilesystemArtifactWriter};
    use marlin_domain::entities::metrics::MetricsReport;
    use marlin_domain::repositories::artifacts::{ArtifactReader, ArtifactWriter};
    use marlin_domain::value_objects::record::ResultRecord;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_tmp_dir(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("marlin_{name}_{}_{}", std::process::id(), now))
    }

    #[test]
    fn writes_and_reads_back_a_run_directory() {
        let dir = unique_tmp_dir("artifacts");
        let writer = FilesystemArtifactWriter::new();
        let reader = FilesystemArtifactReader::new();

        writer.ensure_dir(&dir).expect("create run dir");

        let records = vec![ResultRecord {
            timestamp: 0,
            portfolio_value: 10_000.0,
            asset_price: 100.0,
            position_qty: 0.0,
            support: None,
            resistance: None,
        }];
        writer
            .write_records_csv(&dir.join("records.csv"), &records)
            .expect("write records");
        writer
            .write_metrics_json(&dir.join("metrics.json"), &MetricsReport::default(), None)
            .expect("write metrics");
        writer
            .write_config_snapshot_toml(&dir.join("config_snapshot.toml"), "[run]\n")
            .expect("write snapshot");

        assert!(reader.exists(&dir.join("records.csv")));
        let read_back = reader
            .read_records_csv(&dir.join("records.csv"))
            .expect("read records");
        assert_eq!(read_back, records);
        let snapshot = reader
            .read_config_snapshot_toml(&dir.join("config_snapshot.toml"))
            .expect("read snapshot");
        assert_eq!(snapshot.as_deref(), Some("[run]\n"));
        assert_eq!(
            reader
                .read_config_snapshot_toml(&dir.join("missing.toml"))
                .expect("missing snapshot is none"),
            None
        );

        let _ = fs::remove_dir_all(&dir);
    }
}

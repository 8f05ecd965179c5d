use crate::entities::metrics::MetricsReport;
use crate::value_objects::record::ResultRecord;
use std::path::Path;

/// File-shaped output of a run: the per-bar records, the metrics summary and
/// a snapshot of the configuration that produced them.
pub trait ArtifactWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String>;

    fn write_records_csv(&self, path: &Path, records: &[ResultRecord]) -> Result<(), String>;

    fn write_metrics_json(
        &self,
        path: &Path,
        metrics: &MetricsReport,
        meta: Option<&serde_json::Value>,
    ) -> Result<(), String>;

    fn write_config_snapshot_toml(&self, path: &Path, config_toml: &str) -> Result<(), String>;
}

/// Read-back side, used by reporting commands.
pub trait ArtifactReader {
    fn exists(&self, path: &Path) -> bool;

    fn read_records_csv(&self, path: &Path) -> Result<Vec<ResultRecord>, String>;

    fn read_config_snapshot_toml(&self, path: &Path) -> Result<Option<String>, String>;
}

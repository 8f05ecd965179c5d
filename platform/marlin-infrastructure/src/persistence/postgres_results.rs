use marlin_domain::entities::metrics::MetricsReport;
use marlin_domain::repositories::result_store::{ResultStore, RunKey, StoredRun};
use marlin_domain::value_objects::record::ResultRecord;
use postgres::NoTls;
use r2d2::Pool;
use r2d2_postgres::PostgresConnectionManager;
use std::time::Instant;

/// Key-value run store on Postgres. One row per run key; a repeated put
/// replaces the stored payload.
#[derive(Debug, Clone)]
pub struct PostgresResultStore {
    pool: Pool<PostgresConnectionManager<NoTls>>,
    table: String,
}

impl PostgresResultStore {
    pub fn new(db_url: String, table: String, pool_max_size: u32) -> Result<Self, String> {
        if let Err(err) = validate_table_name(&table) {
            return Err(format!("invalid results table '{}': {}", table, err));
        }

        let config = db_url
            .parse::<postgres::Config>()
            .map_err(|err| format!("invalid postgres db url: {err}"))?;
        let manager = PostgresConnectionManager::new(config, NoTls);
        let pool = Pool::builder()
            .max_size(pool_max_size)
            .build(manager)
            .map_err(|err| format!("failed to build postgres pool: {err}"))?;

        Ok(Self { pool, table })
    }

    /// Create the results table when it does not exist yet.
    pub fn ensure_schema(&self) -> Result<(), String> {
        let mut client = self
            .pool
            .get()
            .map_err(|err| format!("failed to checkout postgres connection: {err}"))?;
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
                run_key TEXT PRIMARY KEY,\
                strategy_id TEXT NOT NULL,\
                symbol TEXT NOT NULL,\
                records JSONB NOT NULL,\
                metrics JSONB NOT NULL,\
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()\
            )",
            self.table
        );
        client
            .execute(&ddl, &[])
            .map_err(|err| format!("failed to create results table: {err}"))?;
        Ok(())
    }
}

impl ResultStore for PostgresResultStore {
    fn put(&self, run: &StoredRun) -> Result<(), String> {
        let start = Instant::now();
        let span = tracing::info_span!(
            "infra.postgres.put_run",
            table = %self.table,
            key = %run.key.storage_key()
        );
        let _enter = span.enter();

        let result = put_inner(&self.pool, &self.table, run);
        let label = if result.is_ok() { "ok" } else { "err" };
        metrics::counter!("marlin.infra.postgres.put_run.calls_total", "result" => label)
            .increment(1);
        metrics::histogram!("marlin.infra.postgres.put_run_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        if let Err(err) = &result {
            tracing::error!(error = %err, "failed to store run");
        }
        result
    }

    fn get(&self, key: &RunKey) -> Result<Option<StoredRun>, String> {
        let start = Instant::now();
        let span = tracing::info_span!(
            "infra.postgres.get_run",
            table = %self.table,
            key = %key.storage_key()
        );
        let _enter = span.enter();

        let result = get_inner(&self.pool, &self.table, key);
        let label = if result.is_ok() { "ok" } else { "err" };
        metrics::counter!("marlin.infra.postgres.get_run.calls_total", "result" => label)
            .increment(1);
        metrics::histogram!("marlin.infra.postgres.get_run_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        result
    }
}

fn put_inner(
    pool: &Pool<PostgresConnectionManager<NoTls>>,
    table: &str,
    run: &StoredRun,
) -> Result<(), String> {
    let mut client = pool
        .get()
        .map_err(|err| format!("failed to checkout postgres connection: {err}"))?;

    let records = serde_json::to_value(&run.records)
        .map_err(|err| format!("failed to serialize records: {err}"))?;
    let metrics_json = serde_json::to_value(&run.metrics)
        .map_err(|err| format!("failed to serialize metrics: {err}"))?;

    let statement = format!(
        "INSERT INTO {} (run_key, strategy_id, symbol, records, metrics, updated_at) \
         VALUES ($1, $2, $3, $4, $5, now()) \
         ON CONFLICT (run_key) DO UPDATE SET \
             strategy_id = EXCLUDED.strategy_id, \
             symbol = EXCLUDED.symbol, \
             records = EXCLUDED.records, \
             metrics = EXCLUDED.metrics, \
             updated_at = now()",
        table
    );
    client
        .execute(
            &statement,
            &[
                &run.key.storage_key(),
                &run.key.strategy_id,
                &run.key.symbol,
                &records,
                &metrics_json,
            ],
        )
        .map_err(|err| format!("failed to store run: {err}"))?;
    Ok(())
}

fn get_inner(
    pool: &Pool<PostgresConnectionManager<NoTls>>,
    table: &str,
    key: &RunKey,
) -> Result<Option<StoredRun>, String> {
    let mut client = pool
        .get()
        .map_err(|err| format!("failed to checkout postgres connection: {err}"))?;

    let statement = format!("SELECT records, metrics FROM {} WHERE run_key = $1", table);
    let row = client
        .query_opt(&statement, &[&key.storage_key()])
        .map_err(|err| format!("failed to read run: {err}"))?;

    let Some(row) = row else {
        return Ok(None);
    };
    let records_json: serde_json::Value = row.get(0);
    let metrics_json: serde_json::Value = row.get(1);
    let records: Vec<ResultRecord> = serde_json::from_value(records_json)
        .map_err(|err| format!("failed to decode stored records: {err}"))?;
    let metrics_report: MetricsReport = serde_json::from_value(metrics_json)
        .map_err(|err| format!("failed to decode stored metrics: {err}"))?;

    Ok(Some(StoredRun {
        key: key.clone(),
        records,
        metrics: metrics_report,
    }))
}

fn validate_table_name(name: &str) -> Result<(), String> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if ok {
        Ok(())
    } else {
        Err("table names may contain only [A-Za-z0-9_.] and must not start with a digit".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::validate_table_name;

    #[test]
    fn table_names_are_restricted() {
        assert!(validate_table_name("backtest_runs").is_ok());
        assert!(validate_table_name("public.backtest_runs").is_ok());
        assert!(validate_table_name("1runs").is_err());
        assert!(validate_table_name("runs; DROP TABLE runs").is_err());
        assert!(validate_table_name("").is_err());
    }
}

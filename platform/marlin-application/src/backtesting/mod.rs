use crate::config::Config;
use crate::shared::{
    build_engine_config, build_metrics_config, build_run_key, build_strategy,
    parse_timeframe_seconds,
};
use marlin_domain::entities::metrics::MetricsReport;
use marlin_domain::repositories::artifacts::ArtifactWriter;
use marlin_domain::repositories::market_data::{MarketDataRepository, PriceQuery};
use marlin_domain::repositories::result_store::{ResultStore, StoredRun};
use marlin_domain::services::engine::SimulationEngine;
use marlin_domain::services::market_data_source::VecBarSource;
use marlin_domain::value_objects::record::ResultRecord;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info_span, warn};

pub struct BacktestOutcome {
    pub run_dir: PathBuf,
    pub records: Vec<ResultRecord>,
    pub metrics: MetricsReport,
    pub bars_processed: usize,
}

pub fn run_backtest(
    config: &Config,
    config_toml: &str,
    out: Option<PathBuf>,
    market_data: &dyn MarketDataRepository,
    artifacts: &dyn ArtifactWriter,
    store: Option<&dyn ResultStore>,
) -> Result<BacktestOutcome, String> {
    let _span = info_span!(
        "run_backtest",
        run_id = %config.run.run_id,
        symbol = %config.run.symbol,
        timeframe = %config.run.timeframe
    )
    .entered();

    let expected_step = parse_timeframe_seconds(&config.run.timeframe)?;

    let stage_start = Instant::now();
    let (bars, data_report) = market_data.load_bars(&PriceQuery {
        symbol: config.run.symbol.clone(),
        timeframe: config.run.timeframe.clone(),
        start: config.data.start,
        end: config.data.end,
        expected_step_seconds: Some(
            config.data.expected_step_seconds.unwrap_or(expected_step),
        ),
    })?;
    metrics::histogram!("marlin.backtest.load_bars_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    if !data_report.is_clean() {
        warn!(
            duplicates = data_report.duplicates,
            gaps = data_report.gaps,
            out_of_order = data_report.out_of_order,
            invalid_rows = data_report.invalid_rows,
            "price series has quality defects"
        );
    }

    let strategy = build_strategy(config)?;
    let strategy_id = strategy.id().to_string();
    let engine_config = build_engine_config(config);
    let metrics_config = build_metrics_config(config);

    let stage_start = Instant::now();
    let mut engine = SimulationEngine::new(
        strategy,
        VecBarSource::new(bars),
        engine_config,
        metrics_config,
    )?;
    let result = engine.run();
    let engine_ms = stage_start.elapsed().as_millis() as f64;
    metrics::histogram!("marlin.backtest.engine_ms").record(engine_ms);
    metrics::gauge!("marlin.backtest.bars_processed").set(result.records.len() as f64);
    metrics::gauge!("marlin.backtest.engine_bars_per_sec").set(if engine_ms > 0.0 {
        (result.records.len() as f64) / (engine_ms / 1000.0)
    } else {
        0.0
    });

    // Persistence is fire-and-forget: a dead store never unwinds a finished
    // simulation.
    if let Some(store) = store {
        let key = build_run_key(config, &strategy_id);
        let stored = StoredRun {
            key: key.clone(),
            records: result.records.clone(),
            metrics: result.metrics.clone(),
        };
        let stage_start = Instant::now();
        match store.put(&stored) {
            Ok(()) => {
                metrics::histogram!("marlin.backtest.store_put_ms")
                    .record(stage_start.elapsed().as_millis() as f64);
            }
            Err(err) => {
                metrics::counter!("marlin.backtest.store_failures").increment(1);
                warn!(key = %key.storage_key(), error = %err, "result store put failed");
            }
        }
    }

    let run_dir = write_outputs(config, config_toml, out, &result.records, &result.metrics, artifacts)?;

    Ok(BacktestOutcome {
        run_dir,
        bars_processed: result.records.len(),
        records: result.records,
        metrics: result.metrics,
    })
}

fn write_outputs(
    config: &Config,
    config_toml: &str,
    out: Option<PathBuf>,
    records: &[ResultRecord],
    metrics_report: &MetricsReport,
    artifacts: &dyn ArtifactWriter,
) -> Result<PathBuf, String> {
    let base_dir = out.unwrap_or_else(|| PathBuf::from(&config.paths.out_dir));
    let run_dir = base_dir.join(&config.run.run_id);
    artifacts.ensure_dir(&run_dir)?;

    artifacts.write_records_csv(run_dir.join("records.csv").as_path(), records)?;
    let meta = run_meta_json(config, records);
    artifacts.write_metrics_json(
        run_dir.join("metrics.json").as_path(),
        metrics_report,
        meta.as_ref(),
    )?;
    artifacts
        .write_config_snapshot_toml(run_dir.join("config_snapshot.toml").as_path(), config_toml)?;

    Ok(run_dir)
}

pub(crate) fn run_meta_json(config: &Config, records: &[ResultRecord]) -> Option<serde_json::Value> {
    let start = records.first()?.timestamp;
    let end = records.last()?.timestamp;
    Some(serde_json::json!({
        "run_id": config.run.run_id,
        "symbol": config.run.symbol,
        "timeframe": config.run.timeframe,
        "start": start,
        "end": end,
    }))
}

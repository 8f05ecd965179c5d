use std::path::PathBuf;

pub(super) fn run_backtest(config_path: PathBuf, out: Option<PathBuf>) -> Result<(), String> {
    let (config, config_toml) =
        marlin_application::config::load_config_with_source(&config_path)?;
    super::common::print_config_summary("backtest", &config, out.as_ref());

    let overall_start = std::time::Instant::now();

    let crate::infra::EngineDeps {
        market_data,
        artifacts,
        store,
    } = crate::infra::build_engine_deps(&config)?;

    let outcome = marlin_application::backtesting::run_backtest(
        &config,
        &config_toml,
        out,
        market_data.as_ref(),
        artifacts.as_ref(),
        store.as_deref(),
    )?;

    println!("run output: {}", outcome.run_dir.display());
    println!(
        "{}",
        marlin_application::reporting::summary_table(&outcome.metrics)
    );
    println!(
        "{} cli: backtest bars={} total_ms={}",
        marlin_application::meta::engine_name(),
        outcome.bars_processed,
        overall_start.elapsed().as_millis()
    );
    Ok(())
}

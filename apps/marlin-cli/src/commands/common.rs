use marlin_application::config::{Config, DataSourceKind, StrategyChoice};
use marlin_application::meta::engine_name;
use std::path::PathBuf;

pub(super) fn print_config_summary(command: &str, config: &Config, out: Option<&PathBuf>) {
    println!(
        "{} cli: {} (run_id={}, symbol={}, timeframe={}, initial_capital={})",
        engine_name(),
        command,
        config.run.run_id,
        config.run.symbol,
        config.run.timeframe,
        config.run.initial_capital
    );
    println!(
        "data: source={}, location={}, range={}..{}",
        match config.data.source {
            DataSourceKind::Csv => "csv",
            DataSourceKind::Http => "http",
        },
        config
            .data
            .path
            .as_deref()
            .or(config.data.endpoint.as_deref())
            .unwrap_or("unset"),
        config
            .data
            .start
            .map(|v| v.to_string())
            .unwrap_or_else(|| "open".to_string()),
        config
            .data
            .end
            .map(|v| v.to_string())
            .unwrap_or_else(|| "open".to_string())
    );
    println!(
        "strategy: kind={}",
        match config.strategy.kind {
            StrategyChoice::SmaCrossover => "sma_crossover",
            StrategyChoice::RsiReversal => "rsi_reversal",
        }
    );
    println!(
        "store: {}",
        config
            .store
            .as_ref()
            .map(|store| format!("postgres table={}", store.table))
            .unwrap_or_else(|| "none".to_string())
    );
    if let Some(out_dir) = out {
        println!("out dir override: {}", out_dir.display());
    }
}

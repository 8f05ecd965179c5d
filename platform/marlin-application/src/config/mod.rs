use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    Csv,
    Http,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyChoice {
    SmaCrossover,
    RsiReversal,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub run: RunConfig,
    pub data: DataConfig,
    pub strategy: StrategyConfig,
    pub engine: Option<EngineOverrides>,
    pub metrics: Option<MetricsOverrides>,
    pub store: Option<StoreConfig>,
    pub data_quality: Option<DataQualityConfig>,
    pub paths: PathsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub run_id: String,
    pub symbol: String,
    pub timeframe: String,
    pub initial_capital: f64,
    pub initial_position: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    pub source: DataSourceKind,
    /// CSV file with the price series; required for the csv source.
    pub path: Option<String>,
    /// Base URL of the candles endpoint; required for the http source.
    pub endpoint: Option<String>,
    /// Epoch seconds, inclusive.
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub expected_step_seconds: Option<i64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct StrategyConfig {
    pub kind: StrategyChoice,
    pub sma_short: Option<usize>,
    pub sma_long: Option<usize>,
    pub rsi_period: Option<usize>,
    pub rsi_oversold: Option<f64>,
    pub rsi_overbought: Option<f64>,
    pub rsi_level_window: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct EngineOverrides {
    pub stop_loss_pct: Option<f64>,
    pub take_profit_pct: Option<f64>,
    pub buy_cap_pct: Option<f64>,
    pub sell_fraction: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct MetricsOverrides {
    pub annualization_factor: Option<f64>,
    pub calendar_days_per_year: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub url: Option<String>,
    pub table: String,
    pub pool_max_size: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct DataQualityConfig {
    pub max_gaps: Option<usize>,
    pub max_duplicates: Option<usize>,
    pub max_out_of_order: Option<usize>,
    pub max_invalid_rows: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    pub out_dir: String,
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let (config, _source) = load_config_with_source(path)?;
    Ok(config)
}

pub fn load_config_with_source(path: &Path) -> Result<(Config, String), String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config = toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))?;
    Ok((config, contents))
}

pub fn to_toml_pretty(config: &Config) -> Result<String, String> {
    toml::to_string_pretty(config)
        .map_err(|err| format!("failed to serialize config as TOML: {err}"))
}

#[cfg(test)]
mod tests {
    use super::{Config, DataSourceKind, StrategyChoice};

    const MINIMAL: &str = r#"
[run]
run_id = "demo"
symbol = "BTC-USD"
timeframe = "1day"
initial_capital = 10000.0

[data]
source = "csv"
path = "data/btc.csv"

[strategy]
kind = "rsi_reversal"

[paths]
out_dir = "runs/"
"#;

    #[test]
    fn parses_a_minimal_config() {
        let config: Config = toml::from_str(MINIMAL).expect("config should parse");
        assert_eq!(config.run.symbol, "BTC-USD");
        assert_eq!(config.data.source, DataSourceKind::Csv);
        assert_eq!(config.strategy.kind, StrategyChoice::RsiReversal);
        assert!(config.engine.is_none());
        assert!(config.store.is_none());
    }

    #[test]
    fn rejects_unknown_fields() {
        let with_extra = format!("{MINIMAL}\n[run2]\nfoo = 1\n");
        assert!(toml::from_str::<Config>(&with_extra).is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(toml::from_str::<Config>("[run\nrun_id = 1").is_err());
    }
}

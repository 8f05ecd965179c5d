use crate::config::{Config, StrategyChoice};
use marlin_domain::entities::metrics::MetricsConfig;
use marlin_domain::repositories::result_store::RunKey;
use marlin_domain::services::engine::EngineConfig;
use marlin_domain::services::strategy::{RsiReversal, SmaCrossover, StrategyKind};
use sha2::{Digest, Sha256};

const DEFAULT_SMA_SHORT: usize = 5;
const DEFAULT_SMA_LONG: usize = 10;
const DEFAULT_RSI_PERIOD: usize = 14;
const DEFAULT_RSI_OVERSOLD: f64 = 35.0;
const DEFAULT_RSI_OVERBOUGHT: f64 = 65.0;
const DEFAULT_RSI_LEVEL_WINDOW: usize = 20;

pub fn build_strategy(config: &Config) -> Result<StrategyKind, String> {
    let strategy = &config.strategy;
    match strategy.kind {
        StrategyChoice::SmaCrossover => {
            let short = strategy.sma_short.unwrap_or(DEFAULT_SMA_SHORT);
            let long = strategy.sma_long.unwrap_or(DEFAULT_SMA_LONG);
            Ok(StrategyKind::SmaCrossover(SmaCrossover::new(short, long)?))
        }
        StrategyChoice::RsiReversal => {
            let period = strategy.rsi_period.unwrap_or(DEFAULT_RSI_PERIOD);
            let oversold = strategy.rsi_oversold.unwrap_or(DEFAULT_RSI_OVERSOLD);
            let overbought = strategy.rsi_overbought.unwrap_or(DEFAULT_RSI_OVERBOUGHT);
            let level_window = strategy
                .rsi_level_window
                .unwrap_or(DEFAULT_RSI_LEVEL_WINDOW);
            Ok(StrategyKind::RsiReversal(RsiReversal::new(
                period,
                oversold,
                overbought,
                level_window,
            )?))
        }
    }
}

pub fn build_engine_config(config: &Config) -> EngineConfig {
    let mut engine = EngineConfig {
        initial_capital: config.run.initial_capital,
        initial_position: config.run.initial_position.unwrap_or(0.0),
        ..EngineConfig::default()
    };
    if let Some(overrides) = &config.engine {
        if let Some(value) = overrides.stop_loss_pct {
            engine.stop_loss_pct = value;
        }
        if let Some(value) = overrides.take_profit_pct {
            engine.take_profit_pct = value;
        }
        if let Some(value) = overrides.buy_cap_pct {
            engine.buy_cap_pct = value;
        }
        if let Some(value) = overrides.sell_fraction {
            engine.sell_fraction = value;
        }
    }
    engine
}

pub fn build_metrics_config(config: &Config) -> MetricsConfig {
    let mut metrics = MetricsConfig::default();
    if let Some(overrides) = &config.metrics {
        if let Some(value) = overrides.annualization_factor {
            metrics.annualization_factor = value;
        }
        if let Some(value) = overrides.calendar_days_per_year {
            metrics.calendar_days_per_year = value;
        }
    }
    metrics
}

/// Storage identity for this run: strategy id + symbol, plus a short digest
/// of the strategy and engine parameters so re-runs with different settings
/// land under distinct keys.
pub fn build_run_key(config: &Config, strategy_id: &str) -> RunKey {
    RunKey::new(strategy_id, config.run.symbol.clone()).with_digest(params_digest(config))
}

fn params_digest(config: &Config) -> String {
    let canonical = serde_json::to_string(&serde_json::json!({
        "strategy": config.strategy,
        "engine": config.engine,
        "initial_capital": config.run.initial_capital,
        "initial_position": config.run.initial_position,
    }))
    .unwrap_or_else(|_| "{\"error\":\"params\"}".to_string());
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let bytes = hasher.finalize();
    to_hex_short(&bytes[..], 12)
}

fn to_hex_short(bytes: &[u8], chars: usize) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(chars);
    for b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        if out.len() >= chars {
            break;
        }
        out.push(HEX[(b & 0x0f) as usize] as char);
        if out.len() >= chars {
            break;
        }
    }
    out
}

/// Seconds per bar for a timeframe label like `1min`, `4hour`, `1day`.
pub fn parse_timeframe_seconds(value: &str) -> Result<i64, String> {
    let trimmed = value.trim().to_lowercase();
    let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
    let unit = &trimmed[digits.len()..];
    let count: i64 = if digits.is_empty() {
        1
    } else {
        digits
            .parse()
            .map_err(|err| format!("invalid timeframe {value:?}: {err}"))?
    };
    if count <= 0 {
        return Err(format!("invalid timeframe {value:?}: zero length"));
    }
    let unit_seconds = match unit {
        "s" | "sec" => 1,
        "m" | "min" => 60,
        "h" | "hour" => 3_600,
        "d" | "day" => 86_400,
        "w" | "week" => 604_800,
        _ => return Err(format!("invalid timeframe {value:?}: unknown unit {unit:?}")),
    };
    Ok(count * unit_seconds)
}

use crate::value_objects::record::ResultRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy)]
pub struct MetricsConfig {
    /// Periods per year for volatility-style annualization (daily bars: 252).
    pub annualization_factor: f64,
    /// Calendar days per year for the compounded-return exponent.
    pub calendar_days_per_year: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            annualization_factor: 252.0,
            calendar_days_per_year: 365.0,
        }
    }
}

/// Summary statistics derived once from the full record sequence.
///
/// The three core fields are always present. Extended fields are `None` for
/// an empty record sequence (the degenerate contract) and are skipped when
/// serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annualized_return: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sortino_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calmar_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_factor: Option<f64>,
}

/// Pure reduction of a record sequence plus initial capital. Never mutates
/// its inputs; degenerate divisions substitute `0` or `±inf`, never error.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCalculator {
    config: MetricsConfig,
}

impl MetricsCalculator {
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    pub fn calculate(&self, records: &[ResultRecord], initial_capital: f64) -> MetricsReport {
        if records.is_empty() {
            return MetricsReport::default();
        }

        let final_value = records[records.len() - 1].portfolio_value;
        let total_return = if initial_capital > 0.0 {
            (final_value - initial_capital) / initial_capital
        } else {
            0.0
        };

        let n_bars = records.len() as f64;
        let annualized_return =
            (1.0 + total_return).powf(self.config.calendar_days_per_year / n_bars) - 1.0;

        let returns = per_bar_returns(records);
        let scale = self.config.annualization_factor.sqrt();

        let std = sample_stddev(&returns);
        let mean = mean(&returns);
        let sharpe_ratio = if std > 0.0 { mean / std * scale } else { 0.0 };

        let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let downside_std = sample_stddev(&downside);
        let sortino_ratio = if downside_std > 0.0 {
            mean / downside_std * scale
        } else {
            0.0
        };

        let volatility = std * scale;
        let max_drawdown = max_drawdown(records);
        let calmar_ratio = if max_drawdown == 0.0 {
            f64::INFINITY
        } else {
            annualized_return / max_drawdown.abs()
        };

        let (win_rate, profit_factor) = trade_stats(records);

        MetricsReport {
            total_return,
            sharpe_ratio,
            max_drawdown,
            annualized_return: Some(annualized_return),
            sortino_ratio: Some(sortino_ratio),
            calmar_ratio: Some(calmar_ratio),
            volatility: Some(volatility),
            win_rate: Some(win_rate),
            profit_factor: Some(profit_factor),
        }
    }
}

/// `value_t / value_{t-1} - 1`, first bar skipped. Pairs with a zero or
/// negative denominator are dropped rather than propagated as non-finite.
fn per_bar_returns(records: &[ResultRecord]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(records.len().saturating_sub(1));
    for pair in records.windows(2) {
        let prev = pair[0].portfolio_value;
        let curr = pair[1].portfolio_value;
        if prev > 0.0 {
            returns.push(curr / prev - 1.0);
        }
    }
    returns
}

/// Most negative `value_t / running_max(value)_t - 1`; non-positive by
/// construction, zero for a non-decreasing curve.
fn max_drawdown(records: &[ResultRecord]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0f64;
    for record in records {
        let value = record.portfolio_value;
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let drawdown = value / peak - 1.0;
            if drawdown < worst {
                worst = drawdown;
            }
        }
    }
    worst
}

/// A "trade" is any bar whose value differs from the previous bar's.
/// Returns (win_rate, profit_factor) with the degenerate substitutions:
/// win_rate 0 with no trades; profit_factor 0 with no trades, +inf with no
/// losing deltas.
fn trade_stats(records: &[ResultRecord]) -> (f64, f64) {
    let mut trades = 0usize;
    let mut wins = 0usize;
    let mut gains = 0.0f64;
    let mut losses = 0.0f64;

    for pair in records.windows(2) {
        let delta = pair[1].portfolio_value - pair[0].portfolio_value;
        if delta == 0.0 {
            continue;
        }
        trades += 1;
        if delta > 0.0 {
            wins += 1;
            gains += delta;
        } else {
            losses += -delta;
        }
    }

    if trades == 0 {
        return (0.0, 0.0);
    }
    let win_rate = wins as f64 / trades as f64;
    let profit_factor = if losses == 0.0 {
        f64::INFINITY
    } else {
        gains / losses
    };
    (win_rate, profit_factor)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean(values);
    let var = values
        .iter()
        .map(|value| {
            let diff = value - mean;
            diff * diff
        })
        .sum::<f64>()
        / (values.len() as f64 - 1.0);
    var.sqrt()
}

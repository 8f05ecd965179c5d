use crate::entities::metrics::{MetricsCalculator, MetricsConfig, MetricsReport};
use crate::entities::portfolio::PortfolioState;
use crate::services::market_data_source::MarketDataSource;
use crate::services::strategy::Strategy;
use crate::value_objects::bar::Bar;
use crate::value_objects::record::ResultRecord;
use crate::value_objects::signal::{Advice, Signal};

/// Sizing and risk parameters for one simulation run.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub initial_capital: f64,
    /// Asset quantity held before the first bar. Carries no entry price, so
    /// the exit overrides stay disarmed until the first Buy.
    pub initial_position: f64,
    /// Fractional decline from the entry price that forces an exit.
    pub stop_loss_pct: f64,
    /// Fractional gain from the entry price that forces an exit.
    pub take_profit_pct: f64,
    /// Cap on a single Buy, as a fraction of the initial capital.
    pub buy_cap_pct: f64,
    /// Fraction of the held quantity liquidated by a Sell.
    pub sell_fraction: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            initial_position: 0.0,
            stop_loss_pct: 0.05,
            take_profit_pct: 0.10,
            buy_cap_pct: 0.8,
            sell_fraction: 0.8,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(format!(
                "initial capital must be positive, got {}",
                self.initial_capital
            ));
        }
        if !self.initial_position.is_finite() || self.initial_position < 0.0 {
            return Err(format!(
                "initial position must be non-negative, got {}",
                self.initial_position
            ));
        }
        if !(0.0..1.0).contains(&self.stop_loss_pct) || self.stop_loss_pct == 0.0 {
            return Err(format!(
                "stop loss must lie in (0, 1), got {}",
                self.stop_loss_pct
            ));
        }
        if !self.take_profit_pct.is_finite() || self.take_profit_pct <= 0.0 {
            return Err(format!(
                "take profit must be positive, got {}",
                self.take_profit_pct
            ));
        }
        if !(self.buy_cap_pct > 0.0 && self.buy_cap_pct <= 1.0) {
            return Err(format!(
                "buy cap must lie in (0, 1], got {}",
                self.buy_cap_pct
            ));
        }
        if !(self.sell_fraction > 0.0 && self.sell_fraction <= 1.0) {
            return Err(format!(
                "sell fraction must lie in (0, 1], got {}",
                self.sell_fraction
            ));
        }
        Ok(())
    }
}

pub struct SimulationResult {
    pub records: Vec<ResultRecord>,
    pub metrics: MetricsReport,
}

/// Bar-by-bar simulation over a single asset.
///
/// Each bar is processed in a fixed order: ask the strategy (once warm-up has
/// elapsed), apply the exit overrides, execute at the bar's close, then append
/// one `ResultRecord`. The run is deterministic in the bar sequence and the
/// configuration.
pub struct SimulationEngine<S, D>
where
    S: Strategy,
    D: MarketDataSource,
{
    strategy: S,
    data: D,
    config: EngineConfig,
    metrics: MetricsCalculator,
}

impl<S, D> SimulationEngine<S, D>
where
    S: Strategy,
    D: MarketDataSource,
{
    pub fn new(
        strategy: S,
        data: D,
        config: EngineConfig,
        metrics_config: MetricsConfig,
    ) -> Result<Self, String> {
        config.validate()?;
        Ok(Self {
            strategy,
            data,
            config,
            metrics: MetricsCalculator::new(metrics_config),
        })
    }

    pub fn run(&mut self) -> SimulationResult {
        let mut bars: Vec<Bar> = Vec::new();
        while let Some(bar) = self.data.next_bar() {
            bars.push(bar);
        }

        let mut portfolio =
            PortfolioState::new(self.config.initial_capital, self.config.initial_position);
        let warm_up = self.strategy.warm_up_length();
        let mut records: Vec<ResultRecord> = Vec::with_capacity(bars.len());

        for end in 1..=bars.len() {
            let bar = &bars[end - 1];
            let price = bar.close;

            let advice = if end >= warm_up {
                self.strategy.generate_signal(&bars[..end])
            } else {
                Advice::hold()
            };

            let signal = self.apply_overrides(&portfolio, price, advice.signal);
            match signal {
                Signal::Buy => {
                    let spend = portfolio
                        .cash()
                        .min(self.config.buy_cap_pct * self.config.initial_capital);
                    // A Buy with nothing left to deploy is recorded as a no-op.
                    if spend > 0.0 && price > 0.0 {
                        portfolio.apply_buy(spend, price);
                    }
                }
                Signal::Sell => {
                    let quantity = self.config.sell_fraction * portfolio.position_qty();
                    portfolio.apply_sell(quantity, price);
                }
                Signal::Hold => {}
            }

            records.push(ResultRecord {
                timestamp: bar.timestamp,
                portfolio_value: portfolio.value(price),
                asset_price: price,
                position_qty: portfolio.position_qty(),
                support: advice.support,
                resistance: advice.resistance,
            });
        }

        let metrics = self.metrics.calculate(&records, self.config.initial_capital);
        SimulationResult { records, metrics }
    }

    /// Exit overrides take precedence over whatever the strategy advised,
    /// including a Buy. They arm only once a position with a known entry
    /// price exists.
    fn apply_overrides(&self, portfolio: &PortfolioState, price: f64, signal: Signal) -> Signal {
        let Some(entry) = portfolio.entry_price() else {
            return signal;
        };
        if portfolio.position_qty() <= 0.0 {
            return signal;
        }
        let stop = entry * (1.0 - self.config.stop_loss_pct);
        let target = entry * (1.0 + self.config.take_profit_pct);
        if price <= stop || price >= target {
            return Signal::Sell;
        }
        signal
    }
}

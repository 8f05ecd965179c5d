use crate::value_objects::bar::Bar;
use crate::value_objects::signal::{Advice, Signal};

/// A pure decision rule over the bar history seen so far.
///
/// `generate_signal` receives the full prefix `bars[0..=t]` and must be
/// deterministic in it: same prefix, same advice. The engine never calls it
/// before `warm_up_length` bars have accumulated.
pub trait Strategy {
    fn name(&self) -> &str;

    /// Number of leading bars the strategy needs before its first call.
    fn warm_up_length(&self) -> usize;

    fn generate_signal(&self, prefix: &[Bar]) -> Advice;
}

/// Crossover of two simple moving averages of the close. Buys when the
/// short-minus-long spread turns positive between the last two bars, sells
/// when it turns non-positive.
pub struct SmaCrossover {
    short_window: usize,
    long_window: usize,
}

impl SmaCrossover {
    pub fn new(short_window: usize, long_window: usize) -> Result<Self, String> {
        if short_window == 0 || long_window == 0 {
            return Err("sma windows must be positive".to_string());
        }
        if short_window >= long_window {
            return Err(format!(
                "short window {} must be smaller than long window {}",
                short_window, long_window
            ));
        }
        Ok(Self {
            short_window,
            long_window,
        })
    }

    fn spread_at(&self, prefix: &[Bar], end: usize) -> f64 {
        let short = mean_close(&prefix[end - self.short_window..end]);
        let long = mean_close(&prefix[end - self.long_window..end]);
        short - long
    }
}

impl Strategy for SmaCrossover {
    fn name(&self) -> &str {
        "sma_crossover"
    }

    // One extra bar so both "previous" and "current" spreads exist.
    fn warm_up_length(&self) -> usize {
        self.long_window + 1
    }

    fn generate_signal(&self, prefix: &[Bar]) -> Advice {
        let n = prefix.len();
        if n < self.warm_up_length() {
            return Advice::hold();
        }
        let prev = self.spread_at(prefix, n - 1);
        let curr = self.spread_at(prefix, n);
        let signal = if prev <= 0.0 && curr > 0.0 {
            Signal::Buy
        } else if prev >= 0.0 && curr < 0.0 {
            Signal::Sell
        } else {
            Signal::Hold
        };
        Advice::from_signal(signal)
    }
}

/// Mean-reversion rule on Wilder's RSI, corroborated by rolling
/// support/resistance levels.
///
/// Buys when RSI crosses down through the oversold bound while the close
/// sits at or below support; sells when RSI crosses up through the
/// overbought bound while the close sits at or above resistance. Levels are
/// always attached to the advice so downstream records can expose them.
pub struct RsiReversal {
    period: usize,
    oversold: f64,
    overbought: f64,
    level_window: usize,
}

impl RsiReversal {
    pub fn new(
        period: usize,
        oversold: f64,
        overbought: f64,
        level_window: usize,
    ) -> Result<Self, String> {
        if period == 0 {
            return Err("rsi period must be positive".to_string());
        }
        if level_window == 0 {
            return Err("level window must be positive".to_string());
        }
        if !(0.0..=100.0).contains(&oversold) || !(0.0..=100.0).contains(&overbought) {
            return Err(format!(
                "rsi bounds must lie in [0, 100], got oversold {} overbought {}",
                oversold, overbought
            ));
        }
        if oversold >= overbought {
            return Err(format!(
                "oversold bound {} must be below overbought bound {}",
                oversold, overbought
            ));
        }
        Ok(Self {
            period,
            oversold,
            overbought,
            level_window,
        })
    }

    /// Wilder smoothing with alpha = 1/period over the whole prefix; returns
    /// the RSI at the last two bars.
    fn rsi_pair(&self, prefix: &[Bar]) -> Option<(f64, f64)> {
        if prefix.len() < self.period + 1 {
            return None;
        }
        let alpha = 1.0 / self.period as f64;
        let mut avg_gain = 0.0f64;
        let mut avg_loss = 0.0f64;
        let mut prev_rsi = None;
        let mut curr_rsi = None;

        for (idx, pair) in prefix.windows(2).enumerate() {
            let change = pair[1].close - pair[0].close;
            let gain = change.max(0.0);
            let loss = (-change).max(0.0);
            if idx == 0 {
                avg_gain = gain;
                avg_loss = loss;
            } else {
                avg_gain = avg_gain + alpha * (gain - avg_gain);
                avg_loss = avg_loss + alpha * (loss - avg_loss);
            }
            if idx + 1 >= self.period {
                let rsi = if avg_loss == 0.0 {
                    100.0
                } else {
                    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
                };
                prev_rsi = curr_rsi;
                curr_rsi = Some(rsi);
            }
        }

        match (prev_rsi, curr_rsi) {
            (Some(prev), Some(curr)) => Some((prev, curr)),
            _ => None,
        }
    }

    /// Support and resistance from the `level_window` bars preceding the
    /// current one: rolling min low and max high, shifted one bar back so the
    /// current bar cannot define its own level.
    fn levels(&self, prefix: &[Bar]) -> (Option<f64>, Option<f64>) {
        let n = prefix.len();
        if n < self.level_window + 1 {
            return (None, None);
        }
        let window = &prefix[n - 1 - self.level_window..n - 1];
        let support = window.iter().map(|bar| bar.low).fold(f64::MAX, f64::min);
        let resistance = window.iter().map(|bar| bar.high).fold(f64::MIN, f64::max);
        (Some(support), Some(resistance))
    }
}

impl Strategy for RsiReversal {
    fn name(&self) -> &str {
        "rsi_reversal"
    }

    fn warm_up_length(&self) -> usize {
        (self.period + 1).max(self.level_window + 1) + 1
    }

    fn generate_signal(&self, prefix: &[Bar]) -> Advice {
        let (support, resistance) = self.levels(prefix);
        let Some((prev_rsi, curr_rsi)) = self.rsi_pair(prefix) else {
            return Advice {
                signal: Signal::Hold,
                support,
                resistance,
            };
        };

        let close = prefix[prefix.len() - 1].close;
        let entered_oversold = prev_rsi > self.oversold && curr_rsi <= self.oversold;
        let entered_overbought = prev_rsi < self.overbought && curr_rsi >= self.overbought;
        let at_support = support.map_or(false, |level| close <= level);
        let at_resistance = resistance.map_or(false, |level| close >= level);

        let signal = if entered_oversold && at_support {
            Signal::Buy
        } else if entered_overbought && at_resistance {
            Signal::Sell
        } else {
            Signal::Hold
        };

        Advice {
            signal,
            support,
            resistance,
        }
    }
}

/// Closed set of shipped strategies, used by configuration and dispatch.
pub enum StrategyKind {
    SmaCrossover(SmaCrossover),
    RsiReversal(RsiReversal),
}

impl StrategyKind {
    pub fn id(&self) -> &str {
        match self {
            StrategyKind::SmaCrossover(inner) => inner.name(),
            StrategyKind::RsiReversal(inner) => inner.name(),
        }
    }
}

impl Strategy for StrategyKind {
    fn name(&self) -> &str {
        self.id()
    }

    fn warm_up_length(&self) -> usize {
        match self {
            StrategyKind::SmaCrossover(inner) => inner.warm_up_length(),
            StrategyKind::RsiReversal(inner) => inner.warm_up_length(),
        }
    }

    fn generate_signal(&self, prefix: &[Bar]) -> Advice {
        match self {
            StrategyKind::SmaCrossover(inner) => inner.generate_signal(prefix),
            StrategyKind::RsiReversal(inner) => inner.generate_signal(prefix),
        }
    }
}

fn mean_close(bars: &[Bar]) -> f64 {
    if bars.is_empty() {
        return 0.0;
    }
    bars.iter().map(|bar| bar.close).sum::<f64>() / bars.len() as f64
}

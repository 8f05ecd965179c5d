use marlin_domain::entities::metrics::MetricsConfig;
use marlin_domain::services::engine::{EngineConfig, SimulationEngine, SimulationResult};
use marlin_domain::services::market_data_source::VecBarSource;
use marlin_domain::services::strategy::{SmaCrossover, Strategy};
use marlin_domain::value_objects::bar::Bar;
use marlin_domain::value_objects::signal::{Advice, Signal};
use proptest::prelude::*;

fn bar(ts: i64, close: f64) -> Bar {
    Bar {
        symbol: "BTC-USD".to_string(),
        timestamp: ts,
        open: close,
        high: close,
        low: close,
        close,
        volume: 1.0,
    }
}

fn bars_from(prices: &[f64]) -> Vec<Bar> {
    prices
        .iter()
        .copied()
        .enumerate()
        .map(|(idx, close)| bar(idx as i64, close))
        .collect()
}

struct AlwaysBuy {
    warm_up: usize,
}

impl Strategy for AlwaysBuy {
    fn name(&self) -> &str {
        "always_buy"
    }

    fn warm_up_length(&self) -> usize {
        self.warm_up
    }

    fn generate_signal(&self, _prefix: &[Bar]) -> Advice {
        Advice::from_signal(Signal::Buy)
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn one_record_per_bar_and_state_stays_sane(prices in prop::collection::vec(0.01f64..10_000.0, 2..80)) {
        let strategy = SmaCrossover::new(3, 7).map_err(|e| TestCaseError::fail(e))?;
        let data = VecBarSource::new(bars_from(&prices));
        let mut engine = SimulationEngine::new(
            strategy,
            data,
            EngineConfig::default(),
            MetricsConfig::default(),
        )
        .map_err(|e| TestCaseError::fail(e))?;

        let result = engine.run();
        prop_assert_eq!(result.records.len(), prices.len());
        for record in &result.records {
            prop_assert!(record.portfolio_value.is_finite());
            prop_assert!(record.portfolio_value >= 0.0);
            prop_assert!(record.position_qty >= 0.0);
        }
    }

    #[test]
    fn drawdown_is_bounded_for_long_only_runs(prices in prop::collection::vec(0.01f64..10_000.0, 2..80)) {
        let strategy = AlwaysBuy { warm_up: 0 };
        let data = VecBarSource::new(bars_from(&prices));
        let mut engine = SimulationEngine::new(
            strategy,
            data,
            EngineConfig::default(),
            MetricsConfig::default(),
        )
        .map_err(|e| TestCaseError::fail(e))?;

        let result = engine.run();
        prop_assert!(result.metrics.max_drawdown <= 0.0);
        prop_assert!(result.metrics.max_drawdown >= -1.0);
    }

    #[test]
    fn no_position_opens_before_warm_up(
        prices in prop::collection::vec(0.01f64..10_000.0, 2..60),
        warm_up in 1usize..20,
    ) {
        let strategy = AlwaysBuy { warm_up };
        let data = VecBarSource::new(bars_from(&prices));
        let mut engine = SimulationEngine::new(
            strategy,
            data,
            EngineConfig::default(),
            MetricsConfig::default(),
        )
        .map_err(|e| TestCaseError::fail(e))?;

        let result = engine.run();
        let quiet = warm_up.saturating_sub(1).min(result.records.len());
        for record in &result.records[..quiet] {
            prop_assert_eq!(record.position_qty, 0.0);
        }
    }

    #[test]
    fn runs_are_deterministic(prices in prop::collection::vec(0.01f64..10_000.0, 2..60)) {
        let first = run_crossover(&prices)?;
        let second = run_crossover(&prices)?;
        prop_assert_eq!(first.records, second.records);
        prop_assert_eq!(first.metrics, second.metrics);
    }
}

fn run_crossover(prices: &[f64]) -> Result<SimulationResult, TestCaseError> {
    let strategy = SmaCrossover::new(2, 5).map_err(TestCaseError::fail)?;
    let data = VecBarSource::new(bars_from(prices));
    let mut engine = SimulationEngine::new(
        strategy,
        data,
        EngineConfig::default(),
        MetricsConfig::default(),
    )
    .map_err(TestCaseError::fail)?;
    Ok(engine.run())
}

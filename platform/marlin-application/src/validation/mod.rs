use crate::config::Config;
use crate::shared::{build_engine_config, build_strategy, parse_timeframe_seconds};
use marlin_domain::repositories::market_data::{MarketDataRepository, PriceQuery};
use marlin_domain::services::strategy::Strategy;
use std::time::Instant;
use tracing::info_span;

/// Dry-run a configuration against its data source: parse everything, load
/// the series, and report quality against the configured thresholds. In
/// strict mode any finding is an error; otherwise the findings come back in
/// the JSON report.
pub fn validate(
    config: &Config,
    strict: bool,
    market_data: &dyn MarketDataRepository,
) -> Result<serde_json::Value, String> {
    let _span = info_span!(
        "validate",
        strict = strict,
        run_id = %config.run.run_id,
        symbol = %config.run.symbol
    )
    .entered();

    let mut findings: Vec<String> = Vec::new();

    let expected_step = parse_timeframe_seconds(&config.run.timeframe)?;

    let strategy = build_strategy(config)?;
    let warm_up = strategy.warm_up_length();

    let engine_config = build_engine_config(config);
    engine_config.validate()?;

    let stage_start = Instant::now();
    let (bars, report) = market_data.load_bars(&PriceQuery {
        symbol: config.run.symbol.clone(),
        timeframe: config.run.timeframe.clone(),
        start: config.data.start,
        end: config.data.end,
        expected_step_seconds: Some(
            config.data.expected_step_seconds.unwrap_or(expected_step),
        ),
    })?;
    metrics::histogram!("marlin.validate.load_bars_ms")
        .record(stage_start.elapsed().as_millis() as f64);

    if bars.is_empty() {
        findings.push("price series is empty".to_string());
    } else if bars.len() < warm_up {
        findings.push(format!(
            "series has {} bars but the strategy needs {} to warm up",
            bars.len(),
            warm_up
        ));
    }

    if let Some(limits) = &config.data_quality {
        check_limit(&mut findings, "duplicates", report.duplicates, limits.max_duplicates);
        check_limit(&mut findings, "gaps", report.gaps, limits.max_gaps);
        check_limit(
            &mut findings,
            "out_of_order",
            report.out_of_order,
            limits.max_out_of_order,
        );
        check_limit(
            &mut findings,
            "invalid_rows",
            report.invalid_rows,
            limits.max_invalid_rows,
        );
    }

    let ok = findings.is_empty();
    if strict && !ok {
        return Err(format!("validation failed: {}", findings.join("; ")));
    }

    Ok(serde_json::json!({
        "ok": ok,
        "run_id": config.run.run_id,
        "symbol": config.run.symbol,
        "timeframe": config.run.timeframe,
        "strategy": strategy.id(),
        "warm_up_length": warm_up,
        "rows": bars.len(),
        "data_quality": {
            "duplicates": report.duplicates,
            "gaps": report.gaps,
            "out_of_order": report.out_of_order,
            "invalid_rows": report.invalid_rows,
            "first_timestamp": report.first_timestamp,
            "last_timestamp": report.last_timestamp,
            "max_gap_seconds": report.max_gap_seconds,
        },
        "findings": findings,
    }))
}

fn check_limit(findings: &mut Vec<String>, name: &str, observed: usize, limit: Option<usize>) {
    if let Some(limit) = limit {
        if observed > limit {
            findings.push(format!("{name} {observed} exceeds limit {limit}"));
        }
    }
}

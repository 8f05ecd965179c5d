use marlin_domain::repositories::market_data::{MarketDataRepository, PriceQuery};
use marlin_domain::services::ohlcv::{canonicalize_bars, DataQualityReport};
use marlin_domain::value_objects::bar::Bar;
use std::time::{Duration, Instant};

/// Price series fetched from a candles endpoint.
///
/// The endpoint is called with `symbol`, `timeframe` and optional `start`/
/// `end` query parameters and must answer with a JSON array of candle rows,
/// each `[timestamp, open, high, low, close, volume]`. Values may be numbers
/// or numeric strings; timestamps may be in seconds or milliseconds. An
/// envelope object with a `data` field holding that array is also accepted.
#[derive(Debug, Clone)]
pub struct HttpMarketDataRepository {
    endpoint: String,
    timeout: Duration,
}

impl HttpMarketDataRepository {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl MarketDataRepository for HttpMarketDataRepository {
    fn load_bars(&self, query: &PriceQuery) -> Result<(Vec<Bar>, DataQualityReport), String> {
        let overall_start = Instant::now();
        let span = tracing::info_span!(
            "infra.http.load_bars",
            endpoint = %self.endpoint,
            symbol = %query.symbol,
            timeframe = %query.timeframe
        );
        let _enter = span.enter();

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;

        let mut params: Vec<(&str, String)> = vec![
            ("symbol", query.symbol.clone()),
            ("timeframe", query.timeframe.clone()),
        ];
        if let Some(start) = query.start {
            params.push(("start", start.to_string()));
        }
        if let Some(end) = query.end {
            params.push(("end", end.to_string()));
        }

        let payload: serde_json::Value = client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| {
                metrics::counter!("marlin.infra.http.load_bars.calls_total", "result" => "err")
                    .increment(1);
                format!("candles request failed: {err}")
            })?
            .json()
            .map_err(|err| format!("candles response is not JSON: {err}"))?;

        let rows = payload
            .get("data")
            .and_then(|data| data.as_array())
            .or_else(|| payload.as_array())
            .ok_or_else(|| "candles response has no candle array".to_string())?;

        let mut report = DataQualityReport::default();
        let mut raw: Vec<Bar> = Vec::with_capacity(rows.len());
        for row in rows {
            match parse_candle(row, &query.symbol) {
                Some(bar) if query.contains(bar.timestamp) => raw.push(bar),
                Some(_) => {}
                None => report.invalid_rows += 1,
            }
        }

        let fetched = raw.len();
        let bars = canonicalize_bars(raw, query.expected_step_seconds, &mut report);

        metrics::counter!("marlin.infra.http.load_bars.calls_total", "result" => "ok")
            .increment(1);
        metrics::histogram!("marlin.infra.http.load_bars_ms")
            .record(overall_start.elapsed().as_secs_f64() * 1000.0);
        metrics::gauge!("marlin.infra.http.load_bars.bars_loaded").set(bars.len() as f64);

        tracing::debug!(
            fetched,
            bars = bars.len(),
            invalid_rows = report.invalid_rows,
            "fetched price series"
        );
        Ok((bars, report))
    }
}

fn parse_candle(row: &serde_json::Value, symbol: &str) -> Option<Bar> {
    let fields = row.as_array()?;
    if fields.len() < 6 {
        return None;
    }
    let timestamp = normalize_timestamp(number(&fields[0])? as i64)?;
    Some(Bar {
        symbol: symbol.to_string(),
        timestamp,
        open: number(&fields[1])?,
        high: number(&fields[2])?,
        low: number(&fields[3])?,
        close: number(&fields[4])?,
        volume: number(&fields[5])?,
    })
}

fn number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// Some venues report epoch milliseconds.
fn normalize_timestamp(ts: i64) -> Option<i64> {
    if ts <= 0 {
        return None;
    }
    if ts >= 1_000_000_000_000 {
        Some(ts / 1000)
    } else {
        Some(ts)
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_timestamp, parse_candle};

    #[test]
    fn parses_numeric_and_string_candles() {
        let row = serde_json::json!([1767225600, 1.0, 2.0, 0.5, 1.5, 10.0]);
        let bar = parse_candle(&row, "BTC-USD").expect("candle parses");
        assert_eq!(bar.timestamp, 1_767_225_600);
        assert!((bar.close - 1.5).abs() < 1e-9);

        let row = serde_json::json!(["1767225600", "1.0", "2.0", "0.5", "1.5", "10.0"]);
        let bar = parse_candle(&row, "BTC-USD").expect("string candle parses");
        assert!((bar.high - 2.0).abs() < 1e-9);
    }

    #[test]
    fn millisecond_timestamps_are_normalized() {
        assert_eq!(normalize_timestamp(1_767_225_600_000), Some(1_767_225_600));
        assert_eq!(normalize_timestamp(1_767_225_600), Some(1_767_225_600));
        assert_eq!(normalize_timestamp(0), None);
    }

    #[test]
    fn short_rows_are_rejected() {
        let row = serde_json::json!([1767225600, 1.0, 2.0]);
        assert!(parse_candle(&row, "BTC-USD").is_none());
    }
}

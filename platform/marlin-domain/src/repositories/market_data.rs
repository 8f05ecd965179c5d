use crate::services::ohlcv::DataQualityReport;
use crate::value_objects::bar::Bar;

/// Selection of one price series from a provider. `start`/`end` are epoch
/// seconds, inclusive, with `None` meaning unbounded on that side.
#[derive(Debug, Clone)]
pub struct PriceQuery {
    pub symbol: String,
    pub timeframe: String,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub expected_step_seconds: Option<i64>,
}

impl PriceQuery {
    pub fn contains(&self, timestamp: i64) -> bool {
        if let Some(start) = self.start {
            if timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if timestamp > end {
                return false;
            }
        }
        true
    }
}

/// Provider of historical price series. Implementations return a canonical
/// series (ordered, deduplicated) together with a quality report; an empty
/// series is a valid answer, not an error.
pub trait MarketDataRepository {
    fn load_bars(&self, query: &PriceQuery) -> Result<(Vec<Bar>, DataQualityReport), String>;
}

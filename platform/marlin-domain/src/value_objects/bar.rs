/// One OHLCV observation. Immutable once produced by a market-data adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// True when the row satisfies `low <= {open, close} <= high`, all prices
    /// are finite and positive, and volume is non-negative.
    pub fn is_coherent(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return false;
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return false;
        }
        self.low <= self.open
            && self.low <= self.close
            && self.open <= self.high
            && self.close <= self.high
            && self.low <= self.high
    }
}

#[cfg(test)]
mod tests {
    use super::Bar;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            symbol: "BTC-USD".to_string(),
            timestamp: 1,
            open,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn coherent_bar_passes() {
        assert!(bar(10.0, 12.0, 9.0, 11.0).is_coherent());
    }

    #[test]
    fn inverted_range_fails() {
        assert!(!bar(10.0, 9.0, 12.0, 11.0).is_coherent());
    }

    #[test]
    fn close_above_high_fails() {
        assert!(!bar(10.0, 12.0, 9.0, 13.0).is_coherent());
    }

    #[test]
    fn non_finite_price_fails() {
        assert!(!bar(f64::NAN, 12.0, 9.0, 11.0).is_coherent());
    }
}

use serde::{Deserialize, Serialize};

/// Directional trade instruction for the latest bar of a price prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Integer encoding used at serialization boundaries: +1 / -1 / 0.
    pub fn as_int(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Sell => -1,
            Signal::Hold => 0,
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_uppercase().as_str() {
            "BUY" => Ok(Signal::Buy),
            "SELL" => Ok(Signal::Sell),
            "HOLD" => Ok(Signal::Hold),
            _ => Err(format!("unsupported signal: {value}")),
        }
    }
}

/// A strategy's output for one bar: the signal plus optional advisory
/// support/resistance levels. Levels are informational; the engine's state
/// machine ignores them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Advice {
    pub signal: Signal,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
}

impl Advice {
    pub fn hold() -> Self {
        Self {
            signal: Signal::Hold,
            support: None,
            resistance: None,
        }
    }

    pub fn from_signal(signal: Signal) -> Self {
        Self {
            signal,
            support: None,
            resistance: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Advice, Signal};

    #[test]
    fn integer_encoding_matches_convention() {
        assert_eq!(Signal::Buy.as_int(), 1);
        assert_eq!(Signal::Sell.as_int(), -1);
        assert_eq!(Signal::Hold.as_int(), 0);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Signal::parse("buy").unwrap(), Signal::Buy);
        assert_eq!(Signal::parse(" SELL ").unwrap(), Signal::Sell);
        assert!(Signal::parse("short").is_err());
    }

    #[test]
    fn hold_advice_carries_no_levels() {
        let advice = Advice::hold();
        assert_eq!(advice.signal, Signal::Hold);
        assert!(advice.support.is_none());
        assert!(advice.resistance.is_none());
    }
}

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One row of the simulation output, computed from post-transition state.
/// The sequence is append-only; field names are stable for the reporting
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub timestamp: i64,
    pub portfolio_value: f64,
    pub asset_price: f64,
    pub position_qty: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resistance: Option<f64>,
}

impl ResultRecord {
    pub fn datetime_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.timestamp, 0).single()
    }
}

#[cfg(test)]
mod tests {
    use super::ResultRecord;

    #[test]
    fn datetime_resolves_epoch_seconds() {
        let record = ResultRecord {
            timestamp: 0,
            portfolio_value: 100.0,
            asset_price: 10.0,
            position_qty: 0.0,
            support: None,
            resistance: None,
        };
        let dt = record.datetime_utc().expect("epoch resolves");
        assert_eq!(dt.timestamp(), 0);
    }
}

use crate::value_objects::bar::Bar;

/// Accounting of defects observed while loading or inspecting a price
/// series. Malformed rows are dropped by loaders, not surfaced as errors.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DataQualityReport {
    pub duplicates: usize,
    pub gaps: usize,
    pub out_of_order: usize,
    pub invalid_rows: usize,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    pub max_gap_seconds: Option<i64>,
}

impl DataQualityReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates == 0 && self.gaps == 0 && self.out_of_order == 0 && self.invalid_rows == 0
    }
}

/// Inspect an already-ordered series for duplicates, ordering violations and
/// timestamp gaps larger than the expected step.
pub fn data_quality_from_bars(bars: &[Bar], expected_step_seconds: Option<i64>) -> DataQualityReport {
    let mut report = DataQualityReport::default();
    if bars.is_empty() {
        return report;
    }

    let step = expected_step_seconds.unwrap_or(1).max(1);
    report.first_timestamp = Some(bars[0].timestamp);
    report.last_timestamp = Some(bars[bars.len() - 1].timestamp);

    let mut max_gap: Option<i64> = None;
    let mut last_ts: Option<i64> = None;
    for bar in bars {
        if !bar.is_coherent() {
            report.invalid_rows += 1;
        }
        let ts = bar.timestamp;
        if let Some(prev) = last_ts {
            if ts == prev {
                report.duplicates += 1;
            } else if ts < prev {
                report.out_of_order += 1;
            } else {
                let diff = ts - prev;
                if diff > step {
                    report.gaps += 1;
                    max_gap = Some(max_gap.map_or(diff, |current| current.max(diff)));
                }
            }
        }
        last_ts = Some(ts);
    }

    report.max_gap_seconds = max_gap;
    report
}

/// Canonicalize a raw series: drop incoherent rows, sort by timestamp, and
/// collapse duplicate timestamps (last row wins). Defect counts accumulate
/// into `report`.
pub fn canonicalize_bars(
    raw: Vec<Bar>,
    expected_step_seconds: Option<i64>,
    report: &mut DataQualityReport,
) -> Vec<Bar> {
    let mut kept: Vec<Bar> = Vec::with_capacity(raw.len());
    let mut last_seen: Option<i64> = None;
    for bar in raw {
        if !bar.is_coherent() {
            report.invalid_rows += 1;
            continue;
        }
        if let Some(prev) = last_seen {
            if bar.timestamp < prev {
                report.out_of_order += 1;
            }
        }
        last_seen = Some(bar.timestamp);
        kept.push(bar);
    }

    kept.sort_by_key(|bar| bar.timestamp);

    let mut bars: Vec<Bar> = Vec::with_capacity(kept.len());
    for bar in kept {
        if let Some(last) = bars.last_mut() {
            if bar.timestamp == last.timestamp {
                report.duplicates += 1;
                *last = bar;
                continue;
            }
        }
        bars.push(bar);
    }

    report.first_timestamp = bars.first().map(|bar| bar.timestamp);
    report.last_timestamp = bars.last().map(|bar| bar.timestamp);

    let step = expected_step_seconds.unwrap_or(1).max(1);
    let mut max_gap: Option<i64> = None;
    let mut last_ts: Option<i64> = None;
    for bar in &bars {
        if let Some(prev) = last_ts {
            let diff = bar.timestamp - prev;
            if diff > step {
                report.gaps += 1;
                max_gap = Some(max_gap.map_or(diff, |current| current.max(diff)));
            }
        }
        last_ts = Some(bar.timestamp);
    }
    report.max_gap_seconds = max_gap;

    bars
}

#[cfg(test)]
mod tests {
    use super::{canonicalize_bars, data_quality_from_bars, DataQualityReport};
    use crate::value_objects::bar::Bar;

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

    #[test]
    fn detects_duplicates_and_gaps() {
        let bars = vec![bar(0, 1.0), bar(0, 1.0), bar(120, 1.0)];
        let report = data_quality_from_bars(&bars, Some(60));
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.gaps, 1);
        assert_eq!(report.max_gap_seconds, Some(120));
        assert!(!report.is_clean());
    }

    #[test]
    fn canonicalize_sorts_dedupes_and_drops_invalid() {
        let mut broken = bar(60, 2.0);
        broken.high = 0.5; // close above high
        let raw = vec![bar(120, 3.0), broken, bar(0, 1.0), bar(120, 4.0)];

        let mut report = DataQualityReport::default();
        let bars = canonicalize_bars(raw, Some(60), &mut report);

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, 0);
        assert_eq!(bars[1].timestamp, 120);
        assert_eq!(bars[1].close, 4.0); // last duplicate wins
        assert_eq!(report.invalid_rows, 1);
        assert_eq!(report.duplicates, 1);
        assert!(report.out_of_order > 0);
    }

    #[test]
    fn empty_series_is_clean() {
        let report = data_quality_from_bars(&[], Some(60));
        assert!(report.is_clean());
        assert_eq!(report.first_timestamp, None);
    }
}

//! Average True Range with Wilder smoothing.
//!
//! TR[0] = high - low, TR[i] = true_range(prev_close).
//! Seed: mean of the first n true ranges; then ATR[i] = (ATR[i-1]*(n-1) + TR[i]) / n.
//! One point per bar; the first n-1 (all of them for n = 0) are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 {
        let dates: Vec<_> = bars.iter().map(|b| b.date).collect();
        return IndicatorSeries::from_optional(
            IndicatorType::Atr(period),
            &dates,
            &vec![None::<f64>; bars.len()],
        );
    }

    let tr_values: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    let mut results: Vec<IndicatorPoint> = Vec::with_capacity(bars.len());
    let mut atr = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let valid = i + 1 >= period;
        if i + 1 == period {
            atr = tr_values[..=i].iter().sum::<f64>() / period as f64;
        } else if valid {
            atr = (atr * (period - 1) as f64 + tr_values[i]) / period as f64;
        }
        results.push(IndicatorPoint {
            date: bar.date,
            valid,
            value: IndicatorValue::Simple(if valid { atr } else { 0.0 }),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values: results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(day: u32, high: f64, low: f64, close: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn atr_warmup() {
        let bars: Vec<OhlcvBar> = (1..=5).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        let series = calculate_atr(&bars, 3);
        assert_eq!(series.values.len(), 5);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert_eq!(series.simple_at(4), Some(20.0));
    }

    #[test]
    fn atr_wilder_smoothing() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 115.0, 105.0, 110.0),
            make_bar(3, 120.0, 110.0, 115.0),
            make_bar(4, 125.0, 115.0, 120.0),
        ];
        let series = calculate_atr(&bars, 3);
        let seed = 10.0;
        let expected = (seed * 2.0 + 10.0) / 3.0;
        assert!((series.simple_at(3).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn atr_handles_gaps() {
        let bars = vec![
            make_bar(1, 110.0, 100.0, 105.0),
            make_bar(2, 130.0, 120.0, 125.0),
        ];
        let series = calculate_atr(&bars, 2);
        // TR = [10, max(10, 25, 15)] = [10, 25]
        assert!((series.simple_at(1).unwrap() - 17.5).abs() < 1e-9);
    }

    #[test]
    fn atr_insufficient_bars() {
        let bars: Vec<OhlcvBar> = (1..=2).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        let series = calculate_atr(&bars, 5);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
        assert_eq!(series.latest_simple(), None);
    }

    #[test]
    fn atr_period_0_keeps_alignment() {
        let bars: Vec<OhlcvBar> = (1..=3).map(|d| make_bar(d, 110.0, 90.0, 100.0)).collect();
        let series = calculate_atr(&bars, 0);
        assert_eq!(series.values.len(), 3);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}

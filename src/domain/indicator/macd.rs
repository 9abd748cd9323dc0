//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: slow - 1 + signal - 1 bars

use crate::domain::indicator::{
    ema_values, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    if bars.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_values(&closes, fast);
    let ema_slow = ema_values(&closes, slow);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_values(&macd_line, signal_period);

    let signal_warmup = fast.max(slow) - 1 + signal_period - 1;

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorPoint {
            date: bar.date,
            valid: i >= signal_warmup,
            value: IndicatorValue::Macd {
                line: macd_line[i],
                signal: signal_line[i],
                histogram: macd_line[i] - signal_line[i],
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

pub fn calculate_macd_default(bars: &[OhlcvBar]) -> IndicatorSeries {
    calculate_macd(bars, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;

    fn rising_bars(n: usize) -> Vec<OhlcvBar> {
        let prices: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        make_bars(&prices)
    }

    #[test]
    fn macd_warmup_default() {
        let series = calculate_macd_default(&rising_bars(40));

        let warmup = DEFAULT_SLOW - 1 + DEFAULT_SIGNAL - 1;
        for i in 0..warmup {
            assert!(!series.values[i].valid, "Index {} should not be valid", i);
        }
        assert!(series.values[warmup].valid);
    }

    #[test]
    fn macd_histogram_equals_line_minus_signal() {
        let series = calculate_macd_default(&rising_bars(40));

        for point in &series.values {
            if let Some((line, signal, histogram)) = point.macd() {
                assert!((histogram - (line - signal)).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn macd_line_is_ema_fast_minus_ema_slow() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]);
        let series = calculate_macd(&bars, 3, 5, 2);

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let ema_fast = ema_values(&closes, 3);
        let ema_slow = ema_values(&closes, 5);

        for (i, point) in series.values.iter().enumerate() {
            if let IndicatorValue::Macd { line, .. } = point.value {
                assert!((line - (ema_fast[i] - ema_slow[i])).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn macd_positive_in_uptrend() {
        let series = calculate_macd_default(&rising_bars(60));
        let (line, _, _) = series.latest().unwrap().macd().unwrap();
        assert!(line > 0.0);
    }

    #[test]
    fn macd_zero_period() {
        let bars = make_bars(&[100.0, 101.0, 102.0]);
        assert!(calculate_macd(&bars, 0, 26, 9).values.is_empty());
        assert!(calculate_macd(&bars, 12, 0, 9).values.is_empty());
        assert!(calculate_macd(&bars, 12, 26, 0).values.is_empty());
    }

    #[test]
    fn macd_empty_bars() {
        assert!(calculate_macd_default(&[]).values.is_empty());
    }
}

//! RSI (Relative Strength Index) indicator.
//!
//! Average gain/loss are simple rolling means of the last n price changes:
//! - change[i] = C[i] - C[i-1]
//! - avg_gain[i] = mean(max(change, 0)) over the n changes ending at i
//! - avg_loss[i] = mean(max(-change, 0)) over the same window
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are invalid (need n price changes). This is one bar
//! longer than the n-1 warm-up of the other rolling indicators; a variant that
//! counts the missing first change as zero would report RSI from index n-1.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 14;
pub const OVERSOLD: f64 = 30.0;
pub const OVERBOUGHT: f64 = 70.0;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let dates: Vec<_> = bars.iter().map(|b| b.date).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    IndicatorSeries::from_optional(IndicatorType::Rsi(period), &dates, &rsi_values(&closes, period))
}

pub fn rsi_values(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    for (i, slot) in out.iter_mut().enumerate().skip(period) {
        // changes[i-1] is the move into bar i
        let window = &changes[i - period..i];
        let avg_gain = window.iter().map(|c| c.max(0.0)).sum::<f64>() / period as f64;
        let avg_loss = window.iter().map(|c| (-c).max(0.0)).sum::<f64>() / period as f64;
        let rsi = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
        };
        *slot = Some(rsi);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;
    use proptest::prelude::*;

    #[test]
    fn rsi_empty_bars() {
        let series = calculate_rsi(&[], 14);
        assert_eq!(series.values.len(), 0);
    }

    #[test]
    fn rsi_warmup_period() {
        let prices: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let series = calculate_rsi(&make_bars(&prices), 14);

        assert_eq!(series.values.len(), 15);
        for i in 0..14 {
            assert!(!series.values[i].valid, "Bar {} should be invalid", i);
        }
        assert!(series.values[14].valid, "Bar 14 should be valid");
    }

    #[test]
    fn rsi_all_gains_saturates_at_100() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&make_bars(&prices), 14);
        assert_eq!(series.simple_at(14), Some(100.0));
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&make_bars(&prices), 14);
        assert!(series.simple_at(14).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn rsi_flat_window_saturates() {
        let series = calculate_rsi(&make_bars(&[50.0; 20]), 14);
        assert_eq!(series.latest_simple(), Some(100.0));
    }

    #[test]
    fn rsi_known_calculation() {
        // 3 gains of 1.0 and 1 loss of 2.0 over period 4
        let closes = [10.0, 11.0, 12.0, 10.0, 11.0];
        let values = rsi_values(&closes, 4);
        let avg_gain = 3.0 / 4.0;
        let avg_loss = 2.0 / 4.0;
        let expected = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        assert!((values[4].unwrap() - expected).abs() < 1e-12);
        assert_eq!(values[3], None);
    }

    #[test]
    fn rsi_zero_period() {
        let series = calculate_rsi(&make_bars(&[100.0, 101.0]), 0);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn rsi_rising_series_approaches_100() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64 * 0.5).collect();
        let series = calculate_rsi(&make_bars(&prices), 14);
        assert_eq!(series.latest_simple(), Some(100.0));
    }

    proptest! {
        #[test]
        fn rsi_always_in_range(prices in prop::collection::vec(1.0f64..1000.0, 16..120)) {
            for v in rsi_values(&prices, 14).into_iter().flatten() {
                prop_assert!((0.0..=100.0).contains(&v), "RSI {} out of range", v);
            }
        }
    }
}

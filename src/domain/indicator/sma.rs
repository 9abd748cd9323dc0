//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are invalid.
//! Used with n=20 and n=50 for the two canonical trend lines.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let dates: Vec<_> = bars.iter().map(|b| b.date).collect();
    IndicatorSeries::from_optional(
        IndicatorType::Sma(period),
        &dates,
        &rolling_mean(&closes, period),
    )
}

/// Rolling mean over any aligned column. `None` for warmup positions and for period 0.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if period == 0 || i + 1 < period {
                None
            } else {
                let window = &values[i + 1 - period..=i];
                Some(window.iter().sum::<f64>() / period as f64)
            }
        })
        .collect()
}

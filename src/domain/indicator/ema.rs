//! Exponential Moving Average.
//!
//! α = 2/(n+1), EMA[0] = C[0], EMA[i] = C[i]*α + EMA[i-1]*(1-α).
//! The recursion is defined from the first bar; the first (n-1) points are
//! still flagged invalid so consumers never act on an unsettled average.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let dates: Vec<_> = bars.iter().map(|b| b.date).collect();
    let raw: Vec<Option<f64>> = if period == 0 {
        vec![None; bars.len()]
    } else {
        ema_values(&closes, period)
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i + 1 >= period).then_some(v))
            .collect()
    };
    IndicatorSeries::from_optional(IndicatorType::Ema(period), &dates, &raw)
}

/// Raw recursive EMA over a column, one value per input. Empty for period 0.
pub fn ema_values(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return Vec::new();
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = 0.0;
    for (i, &v) in values.iter().enumerate() {
        ema = if i == 0 { v } else { v * k + ema * (1.0 - k) };
        out.push(ema);
    }
    out
}

//! Volume indicators: rolling volume average, volume-price trend, high-volume
//! days and the volume/price trend divergence column.

use crate::domain::indicator::{rolling_mean, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::Direction;
use crate::domain::stats::{diff, mean, sample_std};
use chrono::NaiveDate;

pub const DEFAULT_TREND_WINDOW: usize = 20;
pub const DEFAULT_DIVERGENCE_WINDOW: usize = 5;

/// Rolling mean of volume over `period` bars.
pub fn calculate_volume_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
    let dates: Vec<_> = bars.iter().map(|b| b.date).collect();
    IndicatorSeries::from_optional(
        IndicatorType::VolumeSma(period),
        &dates,
        &rolling_mean(&volumes, period),
    )
}

/// Volume-price trend: running sum of `pct_change(close) * volume`.
/// The first bar has no prior close and is invalid.
pub fn calculate_vpt(bars: &[OhlcvBar]) -> IndicatorSeries {
    let dates: Vec<_> = bars.iter().map(|b| b.date).collect();
    let mut raw = Vec::with_capacity(bars.len());
    let mut total = 0.0;
    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            raw.push(None);
            continue;
        }
        let prev = bars[i - 1].close;
        if prev != 0.0 {
            total += (bar.close - prev) / prev * bar.volume as f64;
        }
        raw.push(Some(total));
    }
    IndicatorSeries::from_optional(IndicatorType::Vpt, &dates, &raw)
}

/// Dates whose volume exceeds mean + 2·stddev, both taken over the whole series.
pub fn high_volume_days(bars: &[OhlcvBar]) -> Vec<NaiveDate> {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
    let Some((m, sd)) = mean(&volumes).zip(sample_std(&volumes)) else {
        return Vec::new();
    };
    let threshold = m + 2.0 * sd;
    bars.iter()
        .filter(|b| b.volume as f64 > threshold)
        .map(|b| b.date)
        .collect()
}

/// Per-bar divergence between the smoothed price and volume trends.
///
/// Bearish where the `window`-bar mean close rises while mean volume falls,
/// bullish for the reverse. Undefined trends yield `None`.
pub fn volume_price_divergence(bars: &[OhlcvBar], window: usize) -> Vec<Option<Direction>> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
    let price_trend = diff(&rolling_mean(&closes, window));
    let volume_trend = diff(&rolling_mean(&volumes, window));

    price_trend
        .iter()
        .zip(&volume_trend)
        .map(|(p, v)| match (p, v) {
            (Some(p), Some(v)) if *p > 0.0 && *v < 0.0 => Some(Direction::Bearish),
            (Some(p), Some(v)) if *p < 0.0 && *v > 0.0 => Some(Direction::Bullish),
            _ => None,
        })
        .collect()
}

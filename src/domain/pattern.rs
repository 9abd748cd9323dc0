//! Discrete event detection over bars and aligned indicator series.
//!
//! Every detector walks the input once, compares each bar with at most a
//! fixed lookback, and returns its signals in ascending date order.

use crate::domain::error::MarketPulseError;
use crate::domain::indicator::rsi::{OVERBOUGHT, OVERSOLD};
use crate::domain::indicator::volume::volume_price_divergence;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::ohlcv::{OhlcvBar, TimeSeries};
use crate::domain::signal::{Direction, Signal, SignalKind};
use std::collections::HashMap;
use std::fmt;

pub const MOMENTUM_LOOKBACK: usize = 5;

/// Fast/slow moving-average crossovers between adjacent bars.
///
/// A pair with either average undefined on either bar produces nothing.
pub fn ma_crossover(bars: &[OhlcvBar], fast: &IndicatorSeries, slow: &IndicatorSeries) -> Vec<Signal> {
    let mut signals = Vec::new();
    for i in 1..bars.len() {
        let (Some(pf), Some(ps), Some(cf), Some(cs)) = (
            fast.simple_at(i - 1),
            slow.simple_at(i - 1),
            fast.simple_at(i),
            slow.simple_at(i),
        ) else {
            continue;
        };

        let bar = &bars[i];
        if pf < ps && cf > cs {
            signals.push(Signal::new(
                bar.date,
                SignalKind::MaCrossoverBull,
                bar.close,
                "Bullish MA Crossover",
            ));
        } else if pf > ps && cf < cs {
            signals.push(Signal::new(
                bar.date,
                SignalKind::MaCrossoverBear,
                bar.close,
                "Bearish MA Crossover",
            ));
        }
    }
    signals
}

/// Cross-symbol divergence between two series on their shared dates.
///
/// Bullish when the primary close rises while the comparison close falls,
/// bearish for the reverse. Without a comparison series this logs a warning
/// and yields no signals.
pub fn smt_divergence(primary: &TimeSeries, comparison: Option<&TimeSeries>) -> Vec<Signal> {
    let Some(comparison) = comparison else {
        let err = MarketPulseError::MissingComparison {
            symbol: primary.symbol().to_string(),
        };
        tracing::warn!(error = %err, "skipping SMT divergence");
        return Vec::new();
    };

    let other: HashMap<_, f64> = comparison
        .bars()
        .iter()
        .map(|b| (b.date, b.close))
        .collect();
    let aligned: Vec<(&OhlcvBar, f64)> = primary
        .bars()
        .iter()
        .filter_map(|b| other.get(&b.date).map(|&c| (b, c)))
        .collect();

    let mut signals = Vec::new();
    for pair in aligned.windows(2) {
        let (prev, prev_other) = pair[0];
        let (curr, curr_other) = pair[1];
        let primary_up = curr.close > prev.close;
        let primary_down = curr.close < prev.close;
        let other_up = curr_other > prev_other;
        let other_down = curr_other < prev_other;

        if primary_up && other_down {
            signals.push(Signal::new(
                curr.date,
                SignalKind::SmtDivergenceBull,
                curr.close,
                format!("{} rose while {} fell", primary.symbol(), comparison.symbol()),
            ));
        } else if primary_down && other_up {
            signals.push(Signal::new(
                curr.date,
                SignalKind::SmtDivergenceBear,
                curr.close,
                format!("{} fell while {} rose", primary.symbol(), comparison.symbol()),
            ));
        }
    }
    signals
}

/// Inverse fair-value gaps with a fixed two-bar lookback.
///
/// `low[i] > high[i-2]` is a bearish gap, `high[i] < low[i-2]` a bullish one.
pub fn inverse_fvg(bars: &[OhlcvBar]) -> Vec<Signal> {
    let mut signals = Vec::new();
    for i in 2..bars.len() {
        let (back, bar) = (&bars[i - 2], &bars[i]);
        if bar.low > back.high {
            signals.push(Signal::new(
                bar.date,
                SignalKind::InverseFvgBear,
                bar.close,
                format!("Low {:.2} above high {:.2} two bars back", bar.low, back.high),
            ));
        } else if bar.high < back.low {
            signals.push(Signal::new(
                bar.date,
                SignalKind::InverseFvgBull,
                bar.close,
                format!("High {:.2} below low {:.2} two bars back", bar.high, back.low),
            ));
        }
    }
    signals
}

/// RSI entering overbought (> 70) or oversold (< 30) territory.
pub fn rsi_extremes(bars: &[OhlcvBar], rsi: &IndicatorSeries) -> Vec<Signal> {
    let mut signals = Vec::new();
    for i in 1..bars.len() {
        let (Some(prev), Some(curr)) = (rsi.simple_at(i - 1), rsi.simple_at(i)) else {
            continue;
        };
        let bar = &bars[i];
        if prev <= OVERBOUGHT && curr > OVERBOUGHT {
            signals.push(Signal::new(
                bar.date,
                SignalKind::RsiOverbought,
                bar.close,
                format!("RSI rose to {curr:.1}"),
            ));
        } else if prev >= OVERSOLD && curr < OVERSOLD {
            signals.push(Signal::new(
                bar.date,
                SignalKind::RsiOversold,
                bar.close,
                format!("RSI fell to {curr:.1}"),
            ));
        }
    }
    signals
}

/// One signal per bar where the smoothed price and volume trends disagree.
pub fn volume_price_divergence_signals(bars: &[OhlcvBar], window: usize) -> Vec<Signal> {
    volume_price_divergence(bars, window)
        .into_iter()
        .zip(bars)
        .filter_map(|(dir, bar)| {
            let (kind, reason) = match dir? {
                Direction::Bullish => (
                    SignalKind::VolumePriceDivergenceBull,
                    "Price trend falling while volume trend rising",
                ),
                Direction::Bearish => (
                    SignalKind::VolumePriceDivergenceBear,
                    "Price trend rising while volume trend falling",
                ),
            };
            Some(Signal::new(bar.date, kind, bar.close, reason))
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TrendStrength {
    BullishStrong,
    BullishWeak,
    BearishStrong,
    BearishWeak,
}

impl TrendStrength {
    pub fn direction(&self) -> Direction {
        match self {
            TrendStrength::BullishStrong | TrendStrength::BullishWeak => Direction::Bullish,
            TrendStrength::BearishStrong | TrendStrength::BearishWeak => Direction::Bearish,
        }
    }
}

impl fmt::Display for TrendStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendStrength::BullishStrong => "Bullish (Strong)",
            TrendStrength::BullishWeak => "Bullish (Weak)",
            TrendStrength::BearishStrong => "Bearish (Strong)",
            TrendStrength::BearishWeak => "Bearish (Weak)",
        };
        f.write_str(label)
    }
}

/// Four-branch classification of the last close against ma20 and ma50.
///
/// The branches are not symmetric: weak-bullish needs `ma20 < ma50`, while
/// everything not matched by the first three lands in weak-bearish.
pub fn classify_trend(close: f64, ma20: f64, ma50: f64) -> TrendStrength {
    if close > ma20 && ma20 > ma50 {
        TrendStrength::BullishStrong
    } else if close > ma20 && ma20 < ma50 {
        TrendStrength::BullishWeak
    } else if close < ma20 && ma20 < ma50 {
        TrendStrength::BearishStrong
    } else {
        TrendStrength::BearishWeak
    }
}

/// Trend at the last bar, `None` while either average is still warming up.
pub fn trend_strength(
    bars: &[OhlcvBar],
    ma20: &IndicatorSeries,
    ma50: &IndicatorSeries,
) -> Option<TrendStrength> {
    let close = bars.last()?.close;
    Some(classify_trend(close, ma20.latest_simple()?, ma50.latest_simple()?))
}

/// Percentage change of the last close over `MOMENTUM_LOOKBACK` bars.
pub fn momentum(closes: &[f64]) -> Option<f64> {
    momentum_over(closes, MOMENTUM_LOOKBACK)
}

/// Percentage change of the last close against the close `lookback` bars earlier.
pub fn momentum_over(closes: &[f64], lookback: usize) -> Option<f64> {
    let n = closes.len();
    if n <= lookback {
        return None;
    }
    let base = closes[n - 1 - lookback];
    if base == 0.0 {
        return None;
    }
    Some((closes[n - 1] / base - 1.0) * 100.0)
}

/// Crossovers, momentum and trend strength for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSummary {
    pub ma_signals: Vec<Signal>,
    pub momentum: Option<f64>,
    pub trend_strength: Option<TrendStrength>,
}

pub fn summarize(bars: &[OhlcvBar], ma20: &IndicatorSeries, ma50: &IndicatorSeries) -> PatternSummary {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    PatternSummary {
        ma_signals: ma_crossover(bars, ma20, ma50),
        momentum: momentum(&closes),
        trend_strength: trend_strength(bars, ma20, ma50),
    }
}

//! Dated event records produced by the pattern detectors.

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Direction {
    Bullish,
    Bearish,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Bullish => write!(f, "Bullish"),
            Direction::Bearish => write!(f, "Bearish"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SignalKind {
    MaCrossoverBull,
    MaCrossoverBear,
    SmtDivergenceBull,
    SmtDivergenceBear,
    InverseFvgBull,
    InverseFvgBear,
    VolumePriceDivergenceBull,
    VolumePriceDivergenceBear,
    RsiOverbought,
    RsiOversold,
}

impl SignalKind {
    pub fn direction(&self) -> Direction {
        match self {
            SignalKind::MaCrossoverBull
            | SignalKind::SmtDivergenceBull
            | SignalKind::InverseFvgBull
            | SignalKind::VolumePriceDivergenceBull
            | SignalKind::RsiOversold => Direction::Bullish,
            SignalKind::MaCrossoverBear
            | SignalKind::SmtDivergenceBear
            | SignalKind::InverseFvgBear
            | SignalKind::VolumePriceDivergenceBear
            | SignalKind::RsiOverbought => Direction::Bearish,
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalKind::MaCrossoverBull => "MA_CROSSOVER_BULL",
            SignalKind::MaCrossoverBear => "MA_CROSSOVER_BEAR",
            SignalKind::SmtDivergenceBull => "SMT_DIVERGENCE_BULL",
            SignalKind::SmtDivergenceBear => "SMT_DIVERGENCE_BEAR",
            SignalKind::InverseFvgBull => "INVERSE_FVG_BULL",
            SignalKind::InverseFvgBear => "INVERSE_FVG_BEAR",
            SignalKind::VolumePriceDivergenceBull => "VOLUME_PRICE_DIVERGENCE_BULL",
            SignalKind::VolumePriceDivergenceBear => "VOLUME_PRICE_DIVERGENCE_BEAR",
            SignalKind::RsiOverbought => "RSI_OVERBOUGHT",
            SignalKind::RsiOversold => "RSI_OVERSOLD",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Signal {
    pub date: NaiveDate,
    pub kind: SignalKind,
    pub price: f64,
    pub reason: String,
}

impl Signal {
    pub fn new(date: NaiveDate, kind: SignalKind, price: f64, reason: impl Into<String>) -> Self {
        Self {
            date,
            kind,
            price,
            reason: reason.into(),
        }
    }
}

/// Merges several detector outputs into one sequence ordered by date.
/// Signals sharing a date keep the order in which their sources were given.
pub fn merge_by_date(sources: Vec<Vec<Signal>>) -> Vec<Signal> {
    let mut merged: Vec<Signal> = sources.into_iter().flatten().collect();
    merged.sort_by_key(|s| s.date);
    merged
}

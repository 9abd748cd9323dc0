//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values, aligned with the input bars
//!
//! Warm-up positions carry `valid == false`. Read values through
//! [`IndicatorPoint::simple`] and friends, which return `None` for those positions.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod risk;
pub mod rsi;
pub mod sma;
pub mod volume;

pub use atr::calculate_atr;
pub use bollinger::calculate_bollinger;
pub use ema::{calculate_ema, ema_values};
pub use macd::{calculate_macd, calculate_macd_default};
pub use rsi::calculate_rsi;
pub use sma::{calculate_sma, rolling_mean};

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

impl IndicatorPoint {
    pub fn simple(&self) -> Option<f64> {
        match self.value {
            IndicatorValue::Simple(v) if self.valid => Some(v),
            _ => None,
        }
    }

    /// `(line, signal, histogram)` when valid.
    pub fn macd(&self) -> Option<(f64, f64, f64)> {
        match self.value {
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } if self.valid => Some((line, signal, histogram)),
            _ => None,
        }
    }

    /// `(upper, middle, lower)` when valid.
    pub fn bollinger(&self) -> Option<(f64, f64, f64)> {
        match self.value {
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } if self.valid => Some((upper, middle, lower)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    VolumeSma(usize),
    Vpt,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Builds a single-valued series from raw optional values aligned with `dates`.
    pub fn from_optional(
        indicator_type: IndicatorType,
        dates: &[NaiveDate],
        raw: &[Option<f64>],
    ) -> Self {
        let values = dates
            .iter()
            .zip(raw)
            .map(|(&date, v)| IndicatorPoint {
                date,
                valid: v.is_some(),
                value: IndicatorValue::Simple(v.unwrap_or(0.0)),
            })
            .collect();
        Self {
            indicator_type,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn simple_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(IndicatorPoint::simple)
    }

    pub fn latest(&self) -> Option<&IndicatorPoint> {
        self.values.last()
    }

    /// Value at the last bar, `None` if the last bar is still in warm-up.
    pub fn latest_simple(&self) -> Option<f64> {
        self.latest().and_then(IndicatorPoint::simple)
    }

    pub fn simple_values(&self) -> Vec<Option<f64>> {
        self.values.iter().map(IndicatorPoint::simple).collect()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::VolumeSma(period) => write!(f, "VOLUME_SMA({})", period),
            IndicatorType::Vpt => write!(f, "VPT"),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

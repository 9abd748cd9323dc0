//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is the sample standard deviation (divides by N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::stats::{mean, sample_std};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT_X100: u32 = 200;

pub fn calculate_bollinger(
    bars: &[OhlcvBar],
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mult = stddev_mult_x100 as f64 / 100.0;

    for i in 0..bars.len() {
        let date = bars[i].date;
        let bands = if period >= 2 && i + 1 >= period {
            let window: Vec<f64> = bars[i + 1 - period..=i].iter().map(|b| b.close).collect();
            mean(&window).zip(sample_std(&window))
        } else {
            None
        };

        let (valid, value) = match bands {
            Some((middle, stddev)) => (
                true,
                IndicatorValue::Bollinger {
                    upper: middle + mult * stddev,
                    middle,
                    lower: middle - mult * stddev,
                },
            ),
            None => (
                false,
                IndicatorValue::Bollinger {
                    upper: 0.0,
                    middle: 0.0,
                    lower: 0.0,
                },
            ),
        };

        values.push(IndicatorPoint { date, valid, value });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        values,
    }
}

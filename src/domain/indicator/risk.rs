//! Scalar risk measures over the close column: annualized volatility,
//! historical value-at-risk and maximum drawdown.

use crate::domain::error::MarketPulseError;
use crate::domain::ohlcv::TimeSeries;
use crate::domain::stats::{percentile, sample_std, simple_returns};

/// Trading days per year used to annualize daily volatility.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Sample std of simple daily returns × √252.
pub fn annualized_volatility(series: &TimeSeries) -> Result<f64, MarketPulseError> {
    volatility_of(&series.closes())
        .ok_or_else(|| MarketPulseError::insufficient(series.symbol(), series.len(), 3))
}

pub fn volatility_of(closes: &[f64]) -> Option<f64> {
    sample_std(&simple_returns(closes)).map(|sd| sd * TRADING_DAYS_PER_YEAR.sqrt())
}

/// Historical-simulation VaR: the `(1 - confidence)` percentile of daily returns.
///
/// The result is a (usually negative) return fraction, e.g. -0.03 for a 3% loss.
pub fn value_at_risk(series: &TimeSeries, confidence: f64) -> Result<f64, MarketPulseError> {
    validate_confidence(confidence)?;
    var_of(&series.closes(), confidence)
        .ok_or_else(|| MarketPulseError::insufficient(series.symbol(), series.len(), 2))
}

pub fn var_of(closes: &[f64], confidence: f64) -> Option<f64> {
    percentile(&simple_returns(closes), (1.0 - confidence) * 100.0)
}

pub fn validate_confidence(confidence: f64) -> Result<(), MarketPulseError> {
    if confidence > 0.0 && confidence < 1.0 {
        Ok(())
    } else {
        Err(MarketPulseError::invalid_config(format!(
            "confidence level {confidence} must lie strictly between 0 and 1"
        )))
    }
}

/// Most negative `close / running_max - 1`, with the running max taken left to right.
pub fn max_drawdown(series: &TimeSeries) -> Result<f64, MarketPulseError> {
    drawdown_of(&series.closes())
        .ok_or_else(|| MarketPulseError::insufficient(series.symbol(), series.len(), 1))
}

pub fn drawdown_of(closes: &[f64]) -> Option<f64> {
    let first = *closes.first()?;
    let mut peak = first;
    let mut worst: f64 = 0.0;
    for &close in closes {
        peak = peak.max(close);
        if peak > 0.0 {
            worst = worst.min(close / peak - 1.0);
        }
    }
    Some(worst)
}

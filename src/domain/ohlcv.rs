//! OHLCV bar representation and the immutable per-symbol time series.

use crate::domain::error::MarketPulseError;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Checks high/low envelope the open and close and that prices are finite.
    pub fn validate(&self) -> Result<(), MarketPulseError> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(MarketPulseError::InvalidSeries {
                reason: format!("non-finite price on {}", self.date),
            });
        }
        if self.high < self.open.max(self.close).max(self.low) {
            return Err(MarketPulseError::InvalidSeries {
                reason: format!("high {} below open/close/low on {}", self.high, self.date),
            });
        }
        if self.low > self.open.min(self.close).min(self.high) {
            return Err(MarketPulseError::InvalidSeries {
                reason: format!("low {} above open/close/high on {}", self.low, self.date),
            });
        }
        Ok(())
    }
}

/// Ordered, validated bars for one symbol. Never mutated after construction;
/// derived values live in separately owned indicator structures.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    symbol: String,
    bars: Vec<OhlcvBar>,
}

impl TimeSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Result<Self, MarketPulseError> {
        for bar in &bars {
            bar.validate()?;
        }
        if let Some(pair) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(MarketPulseError::InvalidSeries {
                reason: format!(
                    "dates must be strictly increasing ({} followed by {})",
                    pair[0].date, pair[1].date
                ),
            });
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }

    /// Fails with `InsufficientData` unless at least `minimum` bars are present.
    pub fn require(&self, minimum: usize) -> Result<(), MarketPulseError> {
        if self.bars.len() < minimum {
            return Err(MarketPulseError::insufficient(
                &self.symbol,
                self.bars.len(),
                minimum,
            ));
        }
        Ok(())
    }
}

//! Bounded retry around any [`DataPort`].
//!
//! Only `Provider` errors are retried; `DataUnavailable` and everything else
//! return at once. Each failed attempt is logged and followed by a fixed
//! delay, and the last error is returned once attempts run out.

use crate::domain::error::MarketPulseError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::time::Duration;

pub struct RetryingDataPort<P> {
    inner: P,
    attempts: u32,
    delay: Duration,
}

impl<P: DataPort> RetryingDataPort<P> {
    /// `attempts` is clamped to at least one.
    pub fn new(inner: P, attempts: u32, delay: Duration) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            delay,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn with_retry<T>(
        &self,
        symbol: &str,
        mut call: impl FnMut() -> Result<T, MarketPulseError>,
    ) -> Result<T, MarketPulseError> {
        let mut attempt = 1;
        loop {
            match call() {
                Err(err @ MarketPulseError::Provider { .. }) if attempt < self.attempts => {
                    tracing::warn!(
                        symbol,
                        attempt,
                        max_attempts = self.attempts,
                        error = %err,
                        "provider call failed, retrying"
                    );
                    if !self.delay.is_zero() {
                        std::thread::sleep(self.delay);
                    }
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

impl<P: DataPort> DataPort for RetryingDataPort<P> {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, MarketPulseError> {
        self.with_retry(symbol, || self.inner.fetch_ohlcv(symbol, start_date, end_date))
    }

    fn market_cap(&self, symbol: &str) -> Result<Option<f64>, MarketPulseError> {
        self.with_retry(symbol, || self.inner.market_cap(symbol))
    }
}

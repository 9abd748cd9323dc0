#![allow(dead_code)]

use chrono::NaiveDate;
use marketpulse::domain::error::MarketPulseError;
pub use marketpulse::domain::ohlcv::OhlcvBar;
use marketpulse::domain::ohlcv::TimeSeries;
use marketpulse::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub market_caps: HashMap<String, f64>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            market_caps: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn with_market_cap(mut self, symbol: &str, cap: f64) -> Self {
        self.market_caps.insert(symbol.to_string(), cap);
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, MarketPulseError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(MarketPulseError::Provider {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }

    fn market_cap(&self, symbol: &str) -> Result<Option<f64>, MarketPulseError> {
        Ok(self.market_caps.get(symbol).copied())
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// One bar per calendar day from 2024-01-01, high/low one point either side of close.
pub fn make_bars(closes: &[f64], volumes: &[u64]) -> Vec<OhlcvBar> {
    let start = date("2024-01-01");
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| OhlcvBar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume,
        })
        .collect()
}

pub fn flat_volume(n: usize, volume: u64) -> Vec<u64> {
    vec![volume; n]
}

/// Oscillating closes around `base` with a gentle upward drift.
pub fn wavy_closes(n: usize, base: f64) -> Vec<f64> {
    (0..n)
        .map(|i| base + (i as f64 * 0.3).sin() * base * 0.08 + i as f64 * 0.1)
        .collect()
}

/// A long rally followed by a sharp sell-off, driving the final RSI below 30.
pub fn selloff_closes(n: usize, base: f64) -> Vec<f64> {
    let rally = n - 10;
    let mut closes: Vec<f64> = (0..rally).map(|i| base + i as f64 * 0.5).collect();
    let top = closes[rally - 1];
    closes.extend((1..=10).map(|i| top - i as f64 * 3.0));
    closes
}

pub fn series(symbol: &str, bars: Vec<OhlcvBar>) -> TimeSeries {
    TimeSeries::new(symbol, bars).unwrap()
}

//! CSV file data adapter.
//!
//! One file per symbol, `<base_path>/<SYMBOL>.csv`, with the header
//! `date,open,high,low,close,volume`.

use crate::domain::error::MarketPulseError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    format_err: &dyn Fn(String) -> MarketPulseError,
) -> Result<T, MarketPulseError>
where
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| format_err(format!("missing {name} column")))?
        .trim()
        .parse()
        .map_err(|e| format_err(format!("invalid {name} value: {e}")))
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, MarketPulseError> {
        let format_err = |reason: String| MarketPulseError::DataUnavailable {
            symbol: symbol.to_string(),
            reason,
        };

        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| {
            let reason = format!("failed to read {}: {}", path.display(), e);
            match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied | ErrorKind::InvalidData => {
                    format_err(reason)
                }
                _ => MarketPulseError::Provider {
                    symbol: symbol.to_string(),
                    reason,
                },
            }
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| format_err(format!("CSV parse error: {e}")))?;

            let date_str: String = field(&record, 0, "date", &format_err)?;
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .map_err(|e| format_err(format!("invalid date format: {e}")))?;

            if date < start_date || date > end_date {
                continue;
            }

            bars.push(OhlcvBar {
                date,
                open: field(&record, 1, "open", &format_err)?,
                high: field(&record, 2, "high", &format_err)?,
                low: field(&record, 3, "low", &format_err)?,
                close: field(&record, 4, "close", &format_err)?,
                volume: field(&record, 5, "volume", &format_err)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        tracing::debug!(symbol, bars = bars.len(), path = %path.display(), "loaded bars");
        Ok(bars)
    }
}
